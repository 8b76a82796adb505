use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::function::Runtime;

pub const DEFAULT_STACK_NAME: &str = "WebShellMgStack";
pub const DEFAULT_TABLE_ID: &str = "web_shell_table";
pub const DEFAULT_HANDLER: &str = "lambda_function.lambda_handler";
pub const DEFAULT_ASSET_BUCKET: &str = "web-shell-mg-assets";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Inputs of the web-shell stack. Every field has a default, so an empty JSON
/// object yields the standard web-shell layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    pub stack_name: String,
    pub table_id: String,
    pub partition_key: String,
    pub runtime: Runtime,
    pub handler: String,
    /// Directory that code asset paths are relative to.
    pub asset_root: PathBuf,
    pub producer_code: PathBuf,
    pub consumer_code: PathBuf,
    pub asset_bucket: String,
    pub schedule_minutes: u32,
    pub api_name: String,
    pub stage_name: String,
    pub stats_path: String,
    pub cors_allow_origin: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            table_id: DEFAULT_TABLE_ID.to_string(),
            partition_key: "id".to_string(),
            runtime: Runtime::Python37,
            handler: DEFAULT_HANDLER.to_string(),
            asset_root: PathBuf::from("."),
            producer_code: PathBuf::from("web_shell_mg/lambda/producer"),
            consumer_code: PathBuf::from("web_shell_mg/lambda/consumer"),
            asset_bucket: DEFAULT_ASSET_BUCKET.to_string(),
            schedule_minutes: 1,
            api_name: "WebShellApiGateway".to_string(),
            stage_name: crate::api::DEFAULT_STAGE_NAME.to_string(),
            stats_path: "stats".to_string(),
            cors_allow_origin: "*".to_string(),
        }
    }
}

impl StackConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
