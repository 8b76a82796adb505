use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{json, Value};

use crate::api::{HttpMethod, IntegrationResponse, MethodResponse, RestApiProps};
use crate::function::{AccessMode, FunctionProps, TABLE_NAME_ENV};
use crate::schedule::RuleProps;
use crate::table::TableProps;

/// Opaque identifier of a table inside one stack. It resolves to the physical
/// table name only once the stack is provisioned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef(String);

impl TableRef {
    pub(crate) fn new(construct_id: impl Into<String>) -> Self {
        Self(construct_id.into())
    }

    pub fn construct_id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{Ref:{}}}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvBinding {
    Literal(String),
    TableName(TableRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNode {
    pub id: String,
    pub props: TableProps,
}

impl TableNode {
    pub fn identifier(&self) -> TableRef {
        TableRef::new(self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub table: TableRef,
    pub modes: BTreeSet<AccessMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    pub id: String,
    pub props: FunctionProps,
    pub environment: BTreeMap<String, EnvBinding>,
    pub grant: Option<Grant>,
}

impl FunctionNode {
    pub fn granted_modes(&self) -> BTreeSet<AccessMode> {
        self.grant
            .as_ref()
            .map(|grant| grant.modes.clone())
            .unwrap_or_default()
    }

    pub fn table_name_binding(&self) -> Option<&EnvBinding> {
        self.environment.get(TABLE_NAME_ENV)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    pub id: String,
    pub props: RuleProps,
    /// Function construct ids in declaration order, without repeats.
    pub targets: Vec<String>,
}

impl RuleNode {
    pub fn target_set(&self) -> BTreeSet<&str> {
        self.targets.iter().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodNode {
    pub http_method: HttpMethod,
    pub backend: String,
    pub proxy: bool,
    pub integration_responses: Vec<IntegrationResponse>,
    pub method_responses: Vec<MethodResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    pub path_part: String,
    pub methods: Vec<MethodNode>,
}

impl ResourceNode {
    pub fn path(&self) -> String {
        format!("/{}", self.path_part)
    }

    pub fn method(&self, http_method: HttpMethod) -> Option<&MethodNode> {
        self.methods
            .iter()
            .find(|method| method.http_method == http_method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiNode {
    pub id: String,
    pub props: RestApiProps,
    pub resources: Vec<ResourceNode>,
}

impl ApiNode {
    pub fn resource(&self, path: &str) -> Option<&ResourceNode> {
        let path_part = path.trim_start_matches('/');
        self.resources
            .iter()
            .find(|resource| resource.path_part == path_part)
    }
}

/// Validated, fully wired resource graph of one stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackGraph {
    pub(crate) name: String,
    pub(crate) tables: Vec<TableNode>,
    pub(crate) functions: Vec<FunctionNode>,
    pub(crate) rules: Vec<RuleNode>,
    pub(crate) apis: Vec<ApiNode>,
}

impl StackGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[TableNode] {
        &self.tables
    }

    pub fn functions(&self) -> &[FunctionNode] {
        &self.functions
    }

    pub fn rules(&self) -> &[RuleNode] {
        &self.rules
    }

    pub fn apis(&self) -> &[ApiNode] {
        &self.apis
    }

    pub fn table(&self, id: &str) -> Option<&TableNode> {
        self.tables.iter().find(|node| node.id == id)
    }

    pub fn function(&self, id: &str) -> Option<&FunctionNode> {
        self.functions.iter().find(|node| node.id == id)
    }

    pub fn rule(&self, id: &str) -> Option<&RuleNode> {
        self.rules.iter().find(|node| node.id == id)
    }

    pub fn api(&self, id: &str) -> Option<&ApiNode> {
        self.apis.iter().find(|node| node.id == id)
    }

    pub fn granted_modes(&self, function_id: &str) -> BTreeSet<AccessMode> {
        self.function(function_id)
            .map(FunctionNode::granted_modes)
            .unwrap_or_default()
    }

    /// Compact description of nodes and edges, for operators.
    pub fn summary(&self) -> Value {
        json!({
            "stack": self.name,
            "tables": self.tables.iter().map(|table| json!({
                "id": table.id,
                "partition_key": {
                    "name": table.props.partition_key.name,
                    "type": table.props.partition_key.kind.as_str(),
                },
            })).collect::<Vec<_>>(),
            "functions": self.functions.iter().map(|function| json!({
                "id": function.id,
                "runtime": function.props.runtime.as_str(),
                "handler": function.props.handler,
                "grants": function.grant.as_ref().map(|grant| json!({
                    "table": grant.table.construct_id(),
                    "modes": grant.modes.iter().map(|mode| mode.as_str()).collect::<Vec<_>>(),
                })),
            })).collect::<Vec<_>>(),
            "rules": self.rules.iter().map(|rule| json!({
                "id": rule.id,
                "schedule": rule.props.rate.expression(),
                "targets": rule.targets,
            })).collect::<Vec<_>>(),
            "apis": self.apis.iter().map(|api| json!({
                "id": api.id,
                "routes": api.resources.iter().flat_map(|resource| {
                    resource.methods.iter().map(move |method| json!({
                        "method": method.http_method.as_str(),
                        "path": resource.path(),
                        "backend": method.backend,
                        "proxy": method.proxy,
                    }))
                }).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        })
    }
}
