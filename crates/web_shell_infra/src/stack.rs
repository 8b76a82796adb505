use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::api::{check_response_symmetry, validate_path_part, MethodProps, RestApiProps};
use crate::error::DeclarationError;
use crate::function::{AccessMode, FunctionProps, TABLE_NAME_ENV};
use crate::graph::{
    ApiNode, EnvBinding, FunctionNode, Grant, MethodNode, ResourceNode, RuleNode, StackGraph,
    TableNode, TableRef,
};
use crate::log::{log_error, log_info};
use crate::schedule::RuleProps;
use crate::table::TableProps;

/// Identity stamped on every handle a stack hands out: the leading eight bytes
/// of the SHA-256 of the stack name. Stack names are unique within a
/// deployment, so a handle from any other stack is told apart without shared
/// state.
fn stack_token(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

macro_rules! declare_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            stack: u64,
            index: usize,
        }
    };
}

declare_handle!(
    /// A table declared in a [`Stack`].
    TableHandle
);
declare_handle!(
    /// A function declared in a [`Stack`].
    FunctionHandle
);
declare_handle!(
    /// A timer rule declared in a [`Stack`].
    RuleHandle
);
declare_handle!(
    /// A REST API declared in a [`Stack`].
    ApiHandle
);
declare_handle!(
    /// A path segment under a REST API root.
    ApiResourceHandle
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Literal(String),
    TableName(TableHandle),
}

#[derive(Debug)]
struct Declared<P> {
    id: String,
    props: P,
}

#[derive(Debug)]
struct ResourceDecl {
    api: ApiHandle,
    path_part: String,
}

/// Provisioning context of a single deployment.
///
/// Building happens in two phases. Entities are declared first (`add_*`) and
/// return handles; edges between them (grants, environment, rule targets,
/// methods) are then recorded against those handles. Nothing is checked until
/// [`Stack::build`], which validates every declaration and resolves the edges
/// into a [`StackGraph`], so the order of the wiring calls never matters.
#[derive(Debug)]
pub struct Stack {
    token: u64,
    name: String,
    tables: Vec<Declared<TableProps>>,
    functions: Vec<Declared<FunctionProps>>,
    rules: Vec<Declared<RuleProps>>,
    apis: Vec<Declared<RestApiProps>>,
    resources: Vec<ResourceDecl>,
    grants: Vec<(FunctionHandle, TableHandle, AccessMode)>,
    environment: Vec<(FunctionHandle, String, EnvValue)>,
    targets: Vec<(RuleHandle, FunctionHandle)>,
    methods: Vec<(ApiResourceHandle, MethodProps)>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            token: stack_token(&name),
            name,
            tables: Vec::new(),
            functions: Vec::new(),
            rules: Vec::new(),
            apis: Vec::new(),
            resources: Vec::new(),
            grants: Vec::new(),
            environment: Vec::new(),
            targets: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── phase 1: entities ──────────────────────────────────────────

    pub fn add_table(&mut self, id: impl Into<String>, props: TableProps) -> TableHandle {
        self.tables.push(Declared {
            id: id.into(),
            props,
        });
        TableHandle {
            stack: self.token,
            index: self.tables.len() - 1,
        }
    }

    pub fn add_function(&mut self, id: impl Into<String>, props: FunctionProps) -> FunctionHandle {
        self.functions.push(Declared {
            id: id.into(),
            props,
        });
        FunctionHandle {
            stack: self.token,
            index: self.functions.len() - 1,
        }
    }

    pub fn add_rule(&mut self, id: impl Into<String>, props: RuleProps) -> RuleHandle {
        self.rules.push(Declared {
            id: id.into(),
            props,
        });
        RuleHandle {
            stack: self.token,
            index: self.rules.len() - 1,
        }
    }

    pub fn add_rest_api(&mut self, id: impl Into<String>, props: RestApiProps) -> ApiHandle {
        self.apis.push(Declared {
            id: id.into(),
            props,
        });
        ApiHandle {
            stack: self.token,
            index: self.apis.len() - 1,
        }
    }

    pub fn add_api_resource(
        &mut self,
        api: ApiHandle,
        path_part: impl Into<String>,
    ) -> ApiResourceHandle {
        self.resources.push(ResourceDecl {
            api,
            path_part: path_part.into(),
        });
        ApiResourceHandle {
            stack: self.token,
            index: self.resources.len() - 1,
        }
    }

    // ── phase 2: edges ─────────────────────────────────────────────

    /// Lets `function` access `table` in `mode`. The function's `TABLE_NAME`
    /// is bound to the table when the graph is built.
    pub fn grant(&mut self, table: TableHandle, function: FunctionHandle, mode: AccessMode) {
        self.grants.push((function, table, mode));
    }

    pub fn grant_read_data(&mut self, table: TableHandle, function: FunctionHandle) {
        self.grant(table, function, AccessMode::Read);
    }

    pub fn grant_write_data(&mut self, table: TableHandle, function: FunctionHandle) {
        self.grant(table, function, AccessMode::Write);
    }

    /// Sets an environment variable; a later call for the same key wins.
    pub fn add_environment(
        &mut self,
        function: FunctionHandle,
        key: impl Into<String>,
        value: EnvValue,
    ) {
        self.environment.push((function, key.into(), value));
    }

    pub fn add_target(&mut self, rule: RuleHandle, function: FunctionHandle) {
        self.targets.push((rule, function));
    }

    pub fn add_method(&mut self, resource: ApiResourceHandle, props: MethodProps) {
        self.methods.push((resource, props));
    }

    // ── resolution ─────────────────────────────────────────────────

    /// Validates every declaration and resolves the recorded edges.
    ///
    /// Building the same declarations twice yields equal graphs.
    pub fn build(&self) -> Result<StackGraph, DeclarationError> {
        match self.resolve() {
            Ok(graph) => {
                log_info(
                    "stack",
                    "graph_resolved",
                    json!({
                        "stack": self.name,
                        "tables": graph.tables.len(),
                        "functions": graph.functions.len(),
                        "rules": graph.rules.len(),
                        "apis": graph.apis.len(),
                    }),
                );
                Ok(graph)
            }
            Err(error) => {
                log_error(
                    "stack",
                    "validation_failed",
                    json!({
                        "stack": self.name,
                        "error": error.to_string(),
                    }),
                );
                Err(error)
            }
        }
    }

    fn resolve(&self) -> Result<StackGraph, DeclarationError> {
        self.check_construct_ids()?;
        self.check_handle_ownership()?;

        Ok(StackGraph {
            name: self.name.clone(),
            tables: self.resolve_tables()?,
            functions: self.resolve_functions()?,
            rules: self.resolve_rules()?,
            apis: self.resolve_apis()?,
        })
    }

    fn check_construct_ids(&self) -> Result<(), DeclarationError> {
        let ids = self
            .tables
            .iter()
            .map(|declared| &declared.id)
            .chain(self.functions.iter().map(|declared| &declared.id))
            .chain(self.rules.iter().map(|declared| &declared.id))
            .chain(self.apis.iter().map(|declared| &declared.id));

        let mut seen = BTreeSet::new();
        for id in ids {
            if id.trim().is_empty() {
                return Err(DeclarationError::EmptyConstructId);
            }
            if !seen.insert(id.as_str()) {
                return Err(DeclarationError::DuplicateConstructId(id.clone()));
            }
        }
        Ok(())
    }

    fn check_handle_ownership(&self) -> Result<(), DeclarationError> {
        let mut stacks = Vec::new();
        stacks.extend(self.resources.iter().map(|resource| resource.api.stack));
        for (function, table, _) in &self.grants {
            stacks.extend([function.stack, table.stack]);
        }
        for (function, _, value) in &self.environment {
            stacks.push(function.stack);
            if let EnvValue::TableName(table) = value {
                stacks.push(table.stack);
            }
        }
        for (rule, function) in &self.targets {
            stacks.extend([rule.stack, function.stack]);
        }
        for (resource, props) in &self.methods {
            stacks.extend([resource.stack, props.integration.function.stack]);
        }

        if stacks.into_iter().all(|stack| stack == self.token) {
            Ok(())
        } else {
            Err(DeclarationError::ForeignHandle(self.name.clone()))
        }
    }

    fn table_ref(&self, handle: TableHandle) -> Result<TableRef, DeclarationError> {
        self.tables
            .get(handle.index)
            .map(|declared| TableRef::new(declared.id.clone()))
            .ok_or_else(|| DeclarationError::ForeignHandle(self.name.clone()))
    }

    fn function_id(&self, handle: FunctionHandle) -> Result<&str, DeclarationError> {
        self.functions
            .get(handle.index)
            .map(|declared| declared.id.as_str())
            .ok_or_else(|| DeclarationError::ForeignHandle(self.name.clone()))
    }

    fn resolve_tables(&self) -> Result<Vec<TableNode>, DeclarationError> {
        self.tables
            .iter()
            .map(|declared| {
                if declared.props.partition_key.name.trim().is_empty() {
                    return Err(DeclarationError::MissingPartitionKey(declared.id.clone()));
                }
                if declared.props.read_capacity == 0 || declared.props.write_capacity == 0 {
                    return Err(DeclarationError::ZeroCapacity(declared.id.clone()));
                }
                Ok(TableNode {
                    id: declared.id.clone(),
                    props: declared.props.clone(),
                })
            })
            .collect()
    }

    fn resolve_functions(&self) -> Result<Vec<FunctionNode>, DeclarationError> {
        let mut nodes = Vec::with_capacity(self.functions.len());

        for (index, declared) in self.functions.iter().enumerate() {
            if declared.props.handler.trim().is_empty() {
                return Err(DeclarationError::MissingHandler(declared.id.clone()));
            }

            let mut environment = BTreeMap::new();
            for (_, key, value) in self
                .environment
                .iter()
                .filter(|(function, _, _)| function.index == index)
            {
                if !is_valid_env_key(key) {
                    return Err(DeclarationError::InvalidEnvironmentKey {
                        function: declared.id.clone(),
                        key: key.clone(),
                    });
                }
                let binding = match value {
                    EnvValue::Literal(text) => EnvBinding::Literal(text.clone()),
                    EnvValue::TableName(table) => EnvBinding::TableName(self.table_ref(*table)?),
                };
                environment.insert(key.clone(), binding);
            }

            let mut grant: Option<Grant> = None;
            for (_, table, mode) in self
                .grants
                .iter()
                .filter(|(function, _, _)| function.index == index)
            {
                let table = self.table_ref(*table)?;
                match grant.as_mut() {
                    Some(existing) if existing.table != table => {
                        return Err(DeclarationError::MultipleTableGrants(declared.id.clone()));
                    }
                    Some(existing) => {
                        existing.modes.insert(*mode);
                    }
                    None => {
                        grant = Some(Grant {
                            table,
                            modes: BTreeSet::from([*mode]),
                        });
                    }
                }
            }

            let table_name = environment.get(TABLE_NAME_ENV).cloned();
            match (&grant, table_name) {
                (_, Some(EnvBinding::Literal(_))) => {
                    return Err(DeclarationError::HardcodedTableName(declared.id.clone()));
                }
                (None, Some(EnvBinding::TableName(bound))) => {
                    return Err(DeclarationError::UngrantedTableAccess {
                        function: declared.id.clone(),
                        table: bound.construct_id().to_string(),
                    });
                }
                (Some(grant), Some(EnvBinding::TableName(bound))) if bound != grant.table => {
                    return Err(DeclarationError::TableNameMismatch {
                        function: declared.id.clone(),
                        table: grant.table.construct_id().to_string(),
                    });
                }
                (Some(grant), None) => {
                    environment.insert(
                        TABLE_NAME_ENV.to_string(),
                        EnvBinding::TableName(grant.table.clone()),
                    );
                }
                _ => {}
            }

            nodes.push(FunctionNode {
                id: declared.id.clone(),
                props: declared.props.clone(),
                environment,
                grant,
            });
        }

        Ok(nodes)
    }

    fn resolve_rules(&self) -> Result<Vec<RuleNode>, DeclarationError> {
        let mut nodes = Vec::with_capacity(self.rules.len());

        for (index, declared) in self.rules.iter().enumerate() {
            let mut targets: Vec<String> = Vec::new();
            for (_, function) in self.targets.iter().filter(|(rule, _)| rule.index == index) {
                let function_id = self.function_id(*function)?;
                if !targets.iter().any(|existing| existing == function_id) {
                    targets.push(function_id.to_string());
                }
            }
            if targets.is_empty() {
                return Err(DeclarationError::EmptyTargets(declared.id.clone()));
            }

            nodes.push(RuleNode {
                id: declared.id.clone(),
                props: declared.props.clone(),
                targets,
            });
        }

        Ok(nodes)
    }

    fn resolve_apis(&self) -> Result<Vec<ApiNode>, DeclarationError> {
        let mut nodes = Vec::with_capacity(self.apis.len());

        for (api_index, declared) in self.apis.iter().enumerate() {
            let mut resources: Vec<ResourceNode> = Vec::new();

            for (resource_index, resource) in self
                .resources
                .iter()
                .enumerate()
                .filter(|(_, resource)| resource.api.index == api_index)
            {
                validate_path_part(&resource.path_part)?;
                if resources
                    .iter()
                    .any(|existing| existing.path_part == resource.path_part)
                {
                    return Err(DeclarationError::DuplicateConstructId(format!(
                        "{}/{}",
                        declared.id, resource.path_part
                    )));
                }

                let mut node = ResourceNode {
                    path_part: resource.path_part.clone(),
                    methods: Vec::new(),
                };
                for (_, props) in self
                    .methods
                    .iter()
                    .filter(|(handle, _)| handle.index == resource_index)
                {
                    let method = self.resolve_method(&node, props)?;
                    node.methods.push(method);
                }
                resources.push(node);
            }

            nodes.push(ApiNode {
                id: declared.id.clone(),
                props: declared.props.clone(),
                resources,
            });
        }

        Ok(nodes)
    }

    fn resolve_method(
        &self,
        resource: &ResourceNode,
        props: &MethodProps,
    ) -> Result<MethodNode, DeclarationError> {
        if resource.method(props.http_method).is_some() {
            return Err(DeclarationError::DuplicateMethod {
                resource: resource.path(),
                method: props.http_method.to_string(),
            });
        }

        let integration = &props.integration;
        if !integration.proxy {
            check_response_symmetry(
                props.http_method,
                &resource.path(),
                &integration.integration_responses,
                &props.method_responses,
            )?;
        }

        Ok(MethodNode {
            http_method: props.http_method,
            backend: self.function_id(integration.function)?.to_string(),
            proxy: integration.proxy,
            integration_responses: integration.integration_responses.clone(),
            method_responses: props.method_responses.clone(),
        })
    }
}

fn is_valid_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Cors, HttpMethod, LambdaIntegration};
    use crate::function::{Code, Runtime};
    use crate::schedule::Rate;
    use crate::table::Attribute;

    fn function_props(code: &str) -> FunctionProps {
        FunctionProps {
            runtime: Runtime::Python37,
            handler: "lambda_function.lambda_handler".to_string(),
            code: Code::asset(code),
        }
    }

    fn every_minute() -> RuleProps {
        RuleProps::new(Rate::minutes(1).expect("positive rate"))
    }

    #[test]
    fn grant_injects_table_name() {
        let mut stack = Stack::new("test");
        let table = stack.add_table("items", TableProps::new(Attribute::string("id")));
        let writer = stack.add_function("writer", function_props("lambda/writer"));
        stack.grant_write_data(table, writer);

        let graph = stack.build().expect("valid stack");
        let writer = graph.function("writer").expect("writer exists");
        assert_eq!(
            writer.table_name_binding(),
            Some(&EnvBinding::TableName(TableRef::new("items")))
        );
    }

    #[test]
    fn wiring_order_does_not_matter() {
        let mut first = Stack::new("test");
        let table = first.add_table("items", TableProps::new(Attribute::string("id")));
        let reader = first.add_function("reader", function_props("lambda/reader"));
        first.add_environment(reader, TABLE_NAME_ENV, EnvValue::TableName(table));
        first.grant_read_data(table, reader);

        let mut second = Stack::new("test");
        let table = second.add_table("items", TableProps::new(Attribute::string("id")));
        let reader = second.add_function("reader", function_props("lambda/reader"));
        second.grant_read_data(table, reader);
        second.add_environment(reader, TABLE_NAME_ENV, EnvValue::TableName(table));

        assert_eq!(
            first.build().expect("valid"),
            second.build().expect("valid")
        );
    }

    #[test]
    fn literal_table_name_is_rejected_even_with_a_grant() {
        let mut stack = Stack::new("test");
        let table = stack.add_table("items", TableProps::new(Attribute::string("id")));
        let reader = stack.add_function("reader", function_props("lambda/reader"));
        stack.add_environment(
            reader,
            TABLE_NAME_ENV,
            EnvValue::Literal("hardcoded".to_string()),
        );
        stack.grant_read_data(table, reader);

        assert_eq!(
            stack.build(),
            Err(DeclarationError::HardcodedTableName("reader".to_string()))
        );
    }

    #[test]
    fn literal_table_name_without_grant_is_rejected() {
        let mut stack = Stack::new("test");
        stack.add_table("items", TableProps::new(Attribute::string("id")));
        let reader = stack.add_function("reader", function_props("lambda/reader"));
        stack.add_environment(
            reader,
            TABLE_NAME_ENV,
            EnvValue::Literal("hardcoded".to_string()),
        );

        assert_eq!(
            stack.build(),
            Err(DeclarationError::HardcodedTableName("reader".to_string()))
        );
    }

    #[test]
    fn table_reference_without_grant_is_rejected() {
        let mut stack = Stack::new("test");
        let table = stack.add_table("items", TableProps::new(Attribute::string("id")));
        let reader = stack.add_function("reader", function_props("lambda/reader"));
        stack.add_environment(reader, TABLE_NAME_ENV, EnvValue::TableName(table));

        assert_eq!(
            stack.build(),
            Err(DeclarationError::UngrantedTableAccess {
                function: "reader".to_string(),
                table: "items".to_string(),
            })
        );
    }

    #[test]
    fn table_name_pointing_at_another_table_is_rejected() {
        let mut stack = Stack::new("test");
        let granted = stack.add_table("granted", TableProps::new(Attribute::string("id")));
        let other = stack.add_table("other", TableProps::new(Attribute::string("id")));
        let reader = stack.add_function("reader", function_props("lambda/reader"));
        stack.add_environment(reader, TABLE_NAME_ENV, EnvValue::TableName(other));
        stack.grant_read_data(granted, reader);

        assert_eq!(
            stack.build(),
            Err(DeclarationError::TableNameMismatch {
                function: "reader".to_string(),
                table: "granted".to_string(),
            })
        );
    }

    #[test]
    fn ungranted_function_without_table_name_is_accepted() {
        let mut stack = Stack::new("test");
        let function = stack.add_function("worker", function_props("lambda/worker"));
        stack.add_environment(function, "MODE", EnvValue::Literal("batch".to_string()));

        let graph = stack.build().expect("no table involved");
        let worker = graph.function("worker").expect("worker exists");
        assert!(worker.grant.is_none());
        assert_eq!(worker.table_name_binding(), None);
    }

    #[test]
    fn grants_on_two_tables_are_rejected() {
        let mut stack = Stack::new("test");
        let first = stack.add_table("first", TableProps::new(Attribute::string("id")));
        let second = stack.add_table("second", TableProps::new(Attribute::string("id")));
        let reader = stack.add_function("reader", function_props("lambda/reader"));
        stack.grant_read_data(first, reader);
        stack.grant_read_data(second, reader);

        assert_eq!(
            stack.build(),
            Err(DeclarationError::MultipleTableGrants("reader".to_string()))
        );
    }

    #[test]
    fn repeated_grants_and_targets_collapse() {
        let mut stack = Stack::new("test");
        let table = stack.add_table("items", TableProps::new(Attribute::string("id")));
        let reader = stack.add_function("reader", function_props("lambda/reader"));
        let rule = stack.add_rule("tick", every_minute());
        stack.grant_read_data(table, reader);
        stack.grant_read_data(table, reader);
        stack.add_target(rule, reader);
        stack.add_target(rule, reader);

        let graph = stack.build().expect("valid stack");
        assert_eq!(
            graph.granted_modes("reader"),
            BTreeSet::from([AccessMode::Read])
        );
        assert_eq!(graph.rule("tick").expect("rule").targets, vec!["reader"]);
    }

    #[test]
    fn duplicate_and_empty_construct_ids_are_rejected() {
        let mut stack = Stack::new("test");
        stack.add_table("shared", TableProps::new(Attribute::string("id")));
        stack.add_function("shared", function_props("lambda/x"));
        assert_eq!(
            stack.build(),
            Err(DeclarationError::DuplicateConstructId("shared".to_string()))
        );

        let mut stack = Stack::new("test");
        stack.add_table(" ", TableProps::new(Attribute::string("id")));
        assert_eq!(stack.build(), Err(DeclarationError::EmptyConstructId));
    }

    #[test]
    fn missing_partition_key_is_rejected() {
        let mut stack = Stack::new("test");
        stack.add_table("items", TableProps::new(Attribute::string("")));
        assert_eq!(
            stack.build(),
            Err(DeclarationError::MissingPartitionKey("items".to_string()))
        );
    }

    #[test]
    fn rule_without_targets_is_rejected() {
        let mut stack = Stack::new("test");
        stack.add_rule("tick", every_minute());
        assert_eq!(
            stack.build(),
            Err(DeclarationError::EmptyTargets("tick".to_string()))
        );
    }

    #[test]
    fn handles_from_another_stack_are_rejected() {
        let mut other = Stack::new("other");
        let foreign = other.add_function("reader", function_props("lambda/reader"));

        let mut stack = Stack::new("test");
        let table = stack.add_table("items", TableProps::new(Attribute::string("id")));
        stack.add_function("reader", function_props("lambda/reader"));
        stack.grant_read_data(table, foreign);

        assert_eq!(
            stack.build(),
            Err(DeclarationError::ForeignHandle("test".to_string()))
        );
    }

    #[test]
    fn stack_identity_follows_the_stack_name() {
        let mut first = Stack::new("test");
        let mut second = Stack::new("test");
        let mut other = Stack::new("other");
        let props = || TableProps::new(Attribute::string("id"));

        let from_first = first.add_table("items", props());
        assert_eq!(from_first, second.add_table("items", props()));
        assert_ne!(from_first, other.add_table("items", props()));
    }

    #[test]
    fn invalid_environment_keys_are_rejected() {
        let mut stack = Stack::new("test");
        let function = stack.add_function("reader", function_props("lambda/reader"));
        stack.add_environment(function, "1BAD", EnvValue::Literal("x".to_string()));
        assert!(matches!(
            stack.build(),
            Err(DeclarationError::InvalidEnvironmentKey { .. })
        ));
    }

    #[test]
    fn duplicate_methods_are_rejected() {
        let mut stack = Stack::new("test");
        let function = stack.add_function("reader", function_props("lambda/reader"));
        let api = stack.add_rest_api("api", RestApiProps::new("api"));
        let stats = stack.add_api_resource(api, "stats");
        let cors = Cors::allow_origin("*");
        for _ in 0..2 {
            stack.add_method(
                stats,
                MethodProps {
                    http_method: HttpMethod::Get,
                    integration: LambdaIntegration::non_proxy(
                        function,
                        vec![cors.integration_response(200)],
                    ),
                    method_responses: vec![cors.method_response(200)],
                },
            );
        }

        assert_eq!(
            stack.build(),
            Err(DeclarationError::DuplicateMethod {
                resource: "/stats".to_string(),
                method: "GET".to_string(),
            })
        );
    }

    #[test]
    fn proxy_integrations_skip_response_checks() {
        let mut stack = Stack::new("test");
        let function = stack.add_function("reader", function_props("lambda/reader"));
        let api = stack.add_rest_api("api", RestApiProps::new("api"));
        let stats = stack.add_api_resource(api, "stats");
        stack.add_method(
            stats,
            MethodProps {
                http_method: HttpMethod::Get,
                integration: LambdaIntegration::proxy(function),
                method_responses: Vec::new(),
            },
        );

        let graph = stack.build().expect("proxy needs no response shapes");
        let method = graph
            .api("api")
            .and_then(|api| api.resource("/stats"))
            .and_then(|resource| resource.method(HttpMethod::Get))
            .expect("method exists");
        assert!(method.proxy);
        assert_eq!(method.backend, "reader");
    }

    #[test]
    fn env_key_rules() {
        assert!(is_valid_env_key("TABLE_NAME"));
        assert!(is_valid_env_key("_x1"));
        assert!(!is_valid_env_key(""));
        assert!(!is_valid_env_key("A-B"));
    }
}
