use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::api::HttpMethod;
use crate::assets::{AssetError, AssetManifest};
use crate::function::policy_actions;
use crate::graph::{
    ApiNode, EnvBinding, FunctionNode, MethodNode, ResourceNode, RuleNode, StackGraph, TableNode,
};
use crate::logical_id::logical_id;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
pub const POLICY_VERSION: &str = "2012-10-17";

const LAMBDA_BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
}

impl Resource {
    fn new(kind: &str, properties: Value) -> Self {
        Self {
            kind: kind.to_string(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Value,
}

impl Template {
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.kind == kind)
            .map(|(id, resource)| (id.as_str(), resource))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ── logical ids ────────────────────────────────────────────────────

pub fn table_logical_id(table_id: &str) -> String {
    logical_id(&[table_id])
}

pub fn function_logical_id(function_id: &str) -> String {
    logical_id(&[function_id])
}

pub fn role_logical_id(function_id: &str) -> String {
    logical_id(&[function_id, "ServiceRole"])
}

pub fn policy_logical_id(function_id: &str) -> String {
    logical_id(&[function_id, "ServiceRole", "DefaultPolicy"])
}

pub fn rule_logical_id(rule_id: &str) -> String {
    logical_id(&[rule_id])
}

pub fn rule_permission_logical_id(rule_id: &str, function_id: &str) -> String {
    logical_id(&[rule_id, "AllowInvoke", function_id])
}

pub fn api_logical_id(api_id: &str) -> String {
    logical_id(&[api_id])
}

pub fn api_resource_logical_id(api_id: &str, path_part: &str) -> String {
    logical_id(&[api_id, path_part])
}

pub fn method_logical_id(api_id: &str, path_part: &str, method: HttpMethod) -> String {
    logical_id(&[api_id, path_part, method.as_str()])
}

pub fn method_permission_logical_id(api_id: &str, path_part: &str, method: HttpMethod) -> String {
    logical_id(&[api_id, path_part, method.as_str(), "ApiPermission"])
}

pub fn deployment_logical_id(api_id: &str) -> String {
    logical_id(&[api_id, "Deployment"])
}

pub fn stage_logical_id(api_id: &str, stage_name: &str) -> String {
    logical_id(&[api_id, "DeploymentStage", stage_name])
}

pub fn endpoint_output_id(api_id: &str) -> String {
    logical_id(&[api_id, "Endpoint"])
}

// ── intrinsic helpers ──────────────────────────────────────────────

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

fn join(parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": ["", parts] })
}

// ── synthesis ──────────────────────────────────────────────────────

/// Renders `graph` as a CloudFormation-shaped template. Identical graphs and
/// manifests always yield identical templates.
pub fn synthesize(graph: &StackGraph, assets: &AssetManifest) -> Result<Template, AssetError> {
    let mut template = Template {
        format_version: TEMPLATE_FORMAT_VERSION.to_string(),
        description: format!("Resource graph of stack {}", graph.name()),
        resources: BTreeMap::new(),
        outputs: BTreeMap::new(),
    };

    for table in graph.tables() {
        emit_table(&mut template, table);
    }
    for function in graph.functions() {
        emit_function(&mut template, function, assets)?;
    }
    for rule in graph.rules() {
        emit_rule(&mut template, rule);
    }
    for api in graph.apis() {
        emit_api(&mut template, api);
    }

    Ok(template)
}

fn emit_table(template: &mut Template, table: &TableNode) {
    let key = &table.props.partition_key;
    let mut resource = Resource::new(
        "AWS::DynamoDB::Table",
        json!({
            "KeySchema": [{ "AttributeName": key.name, "KeyType": "HASH" }],
            "AttributeDefinitions": [{ "AttributeName": key.name, "AttributeType": key.kind.as_str() }],
            "ProvisionedThroughput": {
                "ReadCapacityUnits": table.props.read_capacity,
                "WriteCapacityUnits": table.props.write_capacity,
            },
        }),
    );
    let policy = table.props.removal_policy.as_str().to_string();
    resource.deletion_policy = Some(policy.clone());
    resource.update_replace_policy = Some(policy);
    template
        .resources
        .insert(table_logical_id(&table.id), resource);
}

fn emit_function(
    template: &mut Template,
    function: &FunctionNode,
    assets: &AssetManifest,
) -> Result<(), AssetError> {
    let role_id = role_logical_id(&function.id);
    template.resources.insert(
        role_id.clone(),
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": "lambda.amazonaws.com" },
                    }],
                    "Version": POLICY_VERSION,
                },
                "ManagedPolicyArns": [join(vec![
                    Value::from("arn:"),
                    reference("AWS::Partition"),
                    Value::from(format!(":iam::aws:policy/{LAMBDA_BASIC_EXECUTION_POLICY}")),
                ])],
            }),
        ),
    );

    let mut depends_on = Vec::new();
    if let Some(grant) = &function.grant {
        let policy_id = policy_logical_id(&function.id);
        template.resources.insert(
            policy_id.clone(),
            Resource::new(
                "AWS::IAM::Policy",
                json!({
                    "PolicyDocument": {
                        "Statement": [{
                            "Action": policy_actions(&grant.modes),
                            "Effect": "Allow",
                            "Resource": [get_att(&table_logical_id(grant.table.construct_id()), "Arn")],
                        }],
                        "Version": POLICY_VERSION,
                    },
                    "PolicyName": policy_id,
                    "Roles": [reference(&role_id)],
                }),
            ),
        );
        depends_on.push(policy_id);
    }
    depends_on.push(role_id.clone());

    let variables: Map<String, Value> = function
        .environment
        .iter()
        .map(|(key, binding)| {
            let value = match binding {
                EnvBinding::Literal(text) => Value::from(text.as_str()),
                EnvBinding::TableName(table) => reference(&table_logical_id(table.construct_id())),
            };
            (key.clone(), value)
        })
        .collect();

    let code_path = function.props.code.path();
    let mut properties = json!({
        "Code": {
            "S3Bucket": assets.bucket(),
            "S3Key": assets.object_key(code_path)?,
        },
        "Handler": function.props.handler,
        "Role": get_att(&role_id, "Arn"),
        "Runtime": function.props.runtime.as_str(),
    });
    if !variables.is_empty() {
        properties["Environment"] = json!({ "Variables": variables });
    }

    let mut resource = Resource::new("AWS::Lambda::Function", properties);
    resource.depends_on = depends_on;
    template
        .resources
        .insert(function_logical_id(&function.id), resource);
    Ok(())
}

fn emit_rule(template: &mut Template, rule: &RuleNode) {
    let rule_id = rule_logical_id(&rule.id);
    let targets: Vec<Value> = rule
        .targets
        .iter()
        .enumerate()
        .map(|(index, function_id)| {
            json!({
                "Arn": get_att(&function_logical_id(function_id), "Arn"),
                "Id": format!("Target{index}"),
            })
        })
        .collect();

    let state = if rule.props.enabled {
        "ENABLED"
    } else {
        "DISABLED"
    };
    template.resources.insert(
        rule_id.clone(),
        Resource::new(
            "AWS::Events::Rule",
            json!({
                "ScheduleExpression": rule.props.rate.expression(),
                "State": state,
                "Targets": targets,
            }),
        ),
    );

    for function_id in &rule.targets {
        template.resources.insert(
            rule_permission_logical_id(&rule.id, function_id),
            Resource::new(
                "AWS::Lambda::Permission",
                json!({
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": get_att(&function_logical_id(function_id), "Arn"),
                    "Principal": "events.amazonaws.com",
                    "SourceArn": get_att(&rule_id, "Arn"),
                }),
            ),
        );
    }
}

fn emit_api(template: &mut Template, api: &ApiNode) {
    let api_id = api_logical_id(&api.id);
    template.resources.insert(
        api_id.clone(),
        Resource::new(
            "AWS::ApiGateway::RestApi",
            json!({ "Name": api.props.rest_api_name }),
        ),
    );

    let stage_id = stage_logical_id(&api.id, &api.props.stage_name);
    let mut method_ids = Vec::new();
    for resource in &api.resources {
        let resource_id = api_resource_logical_id(&api.id, &resource.path_part);
        template.resources.insert(
            resource_id.clone(),
            Resource::new(
                "AWS::ApiGateway::Resource",
                json!({
                    "ParentId": get_att(&api_id, "RootResourceId"),
                    "PathPart": resource.path_part,
                    "RestApiId": reference(&api_id),
                }),
            ),
        );

        for method in &resource.methods {
            method_ids.push(emit_method(
                template, api, &api_id, &stage_id, resource, &resource_id, method,
            ));
        }
    }

    // A deployment with no methods is rejected by the gateway.
    if method_ids.is_empty() {
        return;
    }

    let deployment_id = deployment_logical_id(&api.id);
    let mut deployment = Resource::new(
        "AWS::ApiGateway::Deployment",
        json!({ "RestApiId": reference(&api_id) }),
    );
    deployment.depends_on = method_ids;
    template.resources.insert(deployment_id.clone(), deployment);

    template.resources.insert(
        stage_id.clone(),
        Resource::new(
            "AWS::ApiGateway::Stage",
            json!({
                "DeploymentId": reference(&deployment_id),
                "RestApiId": reference(&api_id),
                "StageName": api.props.stage_name,
            }),
        ),
    );

    template.outputs.insert(
        endpoint_output_id(&api.id),
        Output {
            description: Some(format!("Invoke URL of {}", api.props.rest_api_name)),
            value: join(vec![
                Value::from("https://"),
                reference(&api_id),
                Value::from(".execute-api."),
                reference("AWS::Region"),
                Value::from("."),
                reference("AWS::URLSuffix"),
                Value::from("/"),
                reference(&stage_id),
                Value::from("/"),
            ]),
        },
    );
}

fn emit_method(
    template: &mut Template,
    api: &ApiNode,
    api_id: &str,
    stage_id: &str,
    resource: &ResourceNode,
    resource_id: &str,
    method: &MethodNode,
) -> String {
    let function_id = function_logical_id(&method.backend);
    let integration_type = if method.proxy { "AWS_PROXY" } else { "AWS" };
    let mut integration = json!({
        "IntegrationHttpMethod": "POST",
        "Type": integration_type,
        "Uri": join(vec![
            Value::from("arn:"),
            reference("AWS::Partition"),
            Value::from(":apigateway:"),
            reference("AWS::Region"),
            Value::from(":lambda:path/2015-03-31/functions/"),
            get_att(&function_id, "Arn"),
            Value::from("/invocations"),
        ]),
    });
    if !method.proxy {
        integration["IntegrationResponses"] = method
            .integration_responses
            .iter()
            .map(|response| {
                let mut rendered = json!({ "StatusCode": response.status_code.to_string() });
                if !response.response_parameters.is_empty() {
                    rendered["ResponseParameters"] = json!(response.response_parameters);
                }
                rendered
            })
            .collect();
    }

    let method_responses: Vec<Value> = method
        .method_responses
        .iter()
        .map(|response| {
            let mut rendered = json!({ "StatusCode": response.status_code.to_string() });
            if !response.response_parameters.is_empty() {
                rendered["ResponseParameters"] = json!(response.response_parameters);
            }
            rendered
        })
        .collect();

    let method_id = method_logical_id(&api.id, &resource.path_part, method.http_method);
    let mut properties = json!({
        "AuthorizationType": "NONE",
        "HttpMethod": method.http_method.as_str(),
        "Integration": integration,
        "ResourceId": reference(resource_id),
        "RestApiId": reference(api_id),
    });
    if !method_responses.is_empty() {
        properties["MethodResponses"] = Value::from(method_responses);
    }
    template.resources.insert(
        method_id.clone(),
        Resource::new("AWS::ApiGateway::Method", properties),
    );

    let route_method = match method.http_method {
        HttpMethod::Any => "*",
        other => other.as_str(),
    };
    template.resources.insert(
        method_permission_logical_id(&api.id, &resource.path_part, method.http_method),
        Resource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": get_att(&function_id, "Arn"),
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": join(vec![
                    Value::from("arn:"),
                    reference("AWS::Partition"),
                    Value::from(":execute-api:"),
                    reference("AWS::Region"),
                    Value::from(":"),
                    reference("AWS::AccountId"),
                    Value::from(":"),
                    reference(api_id),
                    Value::from("/"),
                    reference(stage_id),
                    Value::from(format!("/{route_method}{}", resource.path())),
                ]),
            }),
        ),
    );

    method_id
}
