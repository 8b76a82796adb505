//! The web-shell stack: a table written by a scheduled producer and read by a
//! consumer that runs on the same schedule and behind `GET /stats`.

use crate::api::{Cors, HttpMethod, LambdaIntegration, MethodProps, RestApiProps};
use crate::config::StackConfig;
use crate::error::DeclarationError;
use crate::function::{Code, FunctionProps, TABLE_NAME_ENV};
use crate::graph::StackGraph;
use crate::schedule::{Rate, RuleProps};
use crate::stack::{
    ApiHandle, ApiResourceHandle, EnvValue, FunctionHandle, RuleHandle, Stack, TableHandle,
};
use crate::table::{Attribute, TableProps};

pub const PRODUCER_ID: &str = "producer_lambda_function";
pub const CONSUMER_ID: &str = "consumer_lambda_function";
pub const RULE_ID: &str = "one_minute_rule";
pub const API_ID: &str = "WebShellApiGateway";
pub const STATS_SUCCESS_STATUS: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebShellHandles {
    pub table: TableHandle,
    pub producer: FunctionHandle,
    pub consumer: FunctionHandle,
    pub rule: RuleHandle,
    pub api: ApiHandle,
    pub stats: ApiResourceHandle,
}

pub fn declare_web_shell(
    stack: &mut Stack,
    config: &StackConfig,
) -> Result<WebShellHandles, DeclarationError> {
    let rate = Rate::minutes(config.schedule_minutes)?;

    let table = stack.add_table(
        &config.table_id,
        TableProps::new(Attribute::string(&config.partition_key)),
    );
    let producer = stack.add_function(
        PRODUCER_ID,
        FunctionProps {
            runtime: config.runtime,
            handler: config.handler.clone(),
            code: Code::asset(&config.producer_code),
        },
    );
    let consumer = stack.add_function(
        CONSUMER_ID,
        FunctionProps {
            runtime: config.runtime,
            handler: config.handler.clone(),
            code: Code::asset(&config.consumer_code),
        },
    );
    let rule = stack.add_rule(RULE_ID, RuleProps::new(rate));
    let api = stack.add_rest_api(
        API_ID,
        RestApiProps {
            rest_api_name: config.api_name.clone(),
            stage_name: config.stage_name.clone(),
        },
    );
    let stats = stack.add_api_resource(api, &config.stats_path);

    stack.add_environment(producer, TABLE_NAME_ENV, EnvValue::TableName(table));
    stack.grant_write_data(table, producer);

    stack.add_environment(consumer, TABLE_NAME_ENV, EnvValue::TableName(table));
    stack.grant_read_data(table, consumer);

    stack.add_target(rule, producer);
    stack.add_target(rule, consumer);

    let cors = Cors::allow_origin(&config.cors_allow_origin);
    stack.add_method(
        stats,
        MethodProps {
            http_method: HttpMethod::Get,
            integration: LambdaIntegration::non_proxy(
                consumer,
                vec![cors.integration_response(STATS_SUCCESS_STATUS)],
            ),
            method_responses: vec![cors.method_response(STATS_SUCCESS_STATUS)],
        },
    );

    Ok(WebShellHandles {
        table,
        producer,
        consumer,
        rule,
        api,
        stats,
    })
}

pub fn build_web_shell(config: &StackConfig) -> Result<StackGraph, DeclarationError> {
    let mut stack = Stack::new(&config.stack_name);
    declare_web_shell(&mut stack, config)?;
    stack.build()
}
