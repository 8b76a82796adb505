use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeclarationError;

/// Environment variable through which a function finds its table.
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";

pub const READ_ACTIONS: &[&str] = &[
    "dynamodb:BatchGetItem",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:Query",
    "dynamodb:GetItem",
    "dynamodb:Scan",
    "dynamodb:ConditionCheckItem",
    "dynamodb:DescribeTable",
];

pub const WRITE_ACTIONS: &[&str] = &[
    "dynamodb:BatchWriteItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "dynamodb:DescribeTable",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Runtime {
    Python37,
    Python38,
    Python39,
    Python310,
    Python311,
    Python312,
    ProvidedAl2023,
}

impl Runtime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python37 => "python3.7",
            Self::Python38 => "python3.8",
            Self::Python39 => "python3.9",
            Self::Python310 => "python3.10",
            Self::Python311 => "python3.11",
            Self::Python312 => "python3.12",
            Self::ProvidedAl2023 => "provided.al2023",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Runtime {
    type Err = DeclarationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "python3.7" => Ok(Self::Python37),
            "python3.8" => Ok(Self::Python38),
            "python3.9" => Ok(Self::Python39),
            "python3.10" => Ok(Self::Python310),
            "python3.11" => Ok(Self::Python311),
            "python3.12" => Ok(Self::Python312),
            "provided.al2023" => Ok(Self::ProvidedAl2023),
            other => Err(DeclarationError::UnsupportedRuntime(other.to_string())),
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = DeclarationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Runtime> for String {
    fn from(runtime: Runtime) -> Self {
        runtime.as_str().to_string()
    }
}

/// Where a function's code bundle comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// A local directory, hashed and uploaded as a zip at synthesis time.
    Asset(PathBuf),
}

impl Code {
    pub fn asset(path: impl Into<PathBuf>) -> Self {
        Self::Asset(path.into())
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Asset(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionProps {
    pub runtime: Runtime,
    pub handler: String,
    pub code: Code,
}

/// Data-plane access a function may hold on a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    pub fn actions(self) -> &'static [&'static str] {
        match self {
            Self::Read => READ_ACTIONS,
            Self::Write => WRITE_ACTIONS,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = DeclarationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(DeclarationError::UnsupportedAccessMode(value.to_string())),
        }
    }
}

/// Union of the actions needed by `modes`, in a stable order and without
/// repeats.
pub fn policy_actions(modes: &BTreeSet<AccessMode>) -> Vec<&'static str> {
    let mut actions: Vec<&'static str> = Vec::new();
    for mode in modes {
        for action in mode.actions() {
            if !actions.contains(action) {
                actions.push(action);
            }
        }
    }
    actions
}
