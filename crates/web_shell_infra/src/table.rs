use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY_UNITS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String)
    }
}

/// What happens to the table when it leaves the stack. Tables are retained
/// unless told otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    #[default]
    Retain,
    Destroy,
    Snapshot,
}

impl RemovalPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retain => "Retain",
            Self::Destroy => "Delete",
            Self::Snapshot => "Snapshot",
        }
    }
}

/// Key schema and storage settings of a single-key table. The partition key is
/// fixed once the table is declared; there is no sort key and no index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProps {
    pub partition_key: Attribute,
    pub removal_policy: RemovalPolicy,
    pub read_capacity: u32,
    pub write_capacity: u32,
}

impl TableProps {
    pub fn new(partition_key: Attribute) -> Self {
        Self {
            partition_key,
            removal_policy: RemovalPolicy::default(),
            read_capacity: DEFAULT_CAPACITY_UNITS,
            write_capacity: DEFAULT_CAPACITY_UNITS,
        }
    }

    pub fn with_removal_policy(mut self, removal_policy: RemovalPolicy) -> Self {
        self.removal_policy = removal_policy;
        self
    }
}
