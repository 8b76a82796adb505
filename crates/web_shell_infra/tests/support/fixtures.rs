#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use web_shell_infra::config::StackConfig;
use web_shell_infra::graph::StackGraph;
use web_shell_infra::web_shell::build_web_shell;

/// Asset tree laid out like the deployed repository, with one handler file
/// per function.
pub struct AssetTree {
    pub root: TempDir,
    pub config: StackConfig,
}

impl AssetTree {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create asset root");
        let config = StackConfig {
            asset_root: root.path().to_path_buf(),
            ..StackConfig::default()
        };
        write_handler(
            &root.path().join(&config.producer_code),
            "def lambda_handler(event, context):\n    return 'produced'\n",
        );
        write_handler(
            &root.path().join(&config.consumer_code),
            "def lambda_handler(event, context):\n    return 'consumed'\n",
        );
        Self { root, config }
    }
}

fn write_handler(dir: &Path, body: &str) {
    fs::create_dir_all(dir).expect("create asset dir");
    fs::write(dir.join("lambda_function.py"), body).expect("write handler");
}

pub fn default_graph() -> StackGraph {
    build_web_shell(&StackConfig::default()).expect("default web shell stack is valid")
}
