use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::DeclarationError;
use crate::stack::FunctionHandle;

pub const DEFAULT_STAGE_NAME: &str = "prod";
pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";

const HEADER_PARAMETER_PREFIX: &str = "method.response.header.";

/// Name of the response parameter that maps `header` onto the method response.
pub fn header_parameter(header: &str) -> String {
    format!("{HEADER_PARAMETER_PREFIX}{header}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Any,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Any => "ANY",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DeclarationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "ANY" => Ok(Self::Any),
            _ => Err(DeclarationError::UnsupportedHttpMethod(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApiProps {
    pub rest_api_name: String,
    pub stage_name: String,
}

impl RestApiProps {
    pub fn new(rest_api_name: impl Into<String>) -> Self {
        Self {
            rest_api_name: rest_api_name.into(),
            stage_name: DEFAULT_STAGE_NAME.to_string(),
        }
    }
}

/// Response the gateway builds from the backend result of a non-proxy
/// integration. Parameter values are mapping expressions such as `'*'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationResponse {
    pub status_code: u16,
    pub response_parameters: BTreeMap<String, String>,
}

/// Response shape the method advertises. `true` marks a parameter required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    pub status_code: u16,
    pub response_parameters: BTreeMap<String, bool>,
}

/// Builds integration and method responses that agree on the
/// `Access-Control-Allow-Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cors {
    allow_origin: String,
}

impl Cors {
    pub fn allow_origin(origin: impl Into<String>) -> Self {
        Self {
            allow_origin: origin.into(),
        }
    }

    pub fn integration_response(&self, status_code: u16) -> IntegrationResponse {
        IntegrationResponse {
            status_code,
            response_parameters: BTreeMap::from([(
                header_parameter(ALLOW_ORIGIN_HEADER),
                format!("'{}'", self.allow_origin),
            )]),
        }
    }

    pub fn method_response(&self, status_code: u16) -> MethodResponse {
        MethodResponse {
            status_code,
            response_parameters: BTreeMap::from([(header_parameter(ALLOW_ORIGIN_HEADER), true)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaIntegration {
    pub function: FunctionHandle,
    pub proxy: bool,
    pub integration_responses: Vec<IntegrationResponse>,
}

impl LambdaIntegration {
    pub fn non_proxy(function: FunctionHandle, integration_responses: Vec<IntegrationResponse>) -> Self {
        Self {
            function,
            proxy: false,
            integration_responses,
        }
    }

    pub fn proxy(function: FunctionHandle) -> Self {
        Self {
            function,
            proxy: true,
            integration_responses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodProps {
    pub http_method: HttpMethod,
    pub integration: LambdaIntegration,
    pub method_responses: Vec<MethodResponse>,
}

pub(crate) fn validate_path_part(path_part: &str) -> Result<(), DeclarationError> {
    let valid = !path_part.is_empty()
        && path_part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '{' | '}' | '+'));
    if valid {
        Ok(())
    } else {
        Err(DeclarationError::InvalidPathPart(path_part.to_string()))
    }
}

/// Checks that every integration response has a method response with the same
/// status, and that both sides declare the same header parameters.
pub(crate) fn check_response_symmetry(
    method: HttpMethod,
    path: &str,
    integration_responses: &[IntegrationResponse],
    method_responses: &[MethodResponse],
) -> Result<(), DeclarationError> {
    if integration_responses.is_empty() {
        return Err(DeclarationError::MissingIntegrationResponses {
            method: method.to_string(),
            path: path.to_string(),
        });
    }

    let duplicate = first_repeated_status(integration_responses.iter().map(|r| r.status_code))
        .map(|status| (status, "integration"))
        .or_else(|| {
            first_repeated_status(method_responses.iter().map(|r| r.status_code))
                .map(|status| (status, "method"))
        });
    if let Some((status, side)) = duplicate {
        return Err(DeclarationError::DuplicateResponseStatus {
            method: method.to_string(),
            path: path.to_string(),
            status,
            side,
        });
    }

    for integration in integration_responses {
        let Some(declared) = method_responses
            .iter()
            .find(|response| response.status_code == integration.status_code)
        else {
            return Err(DeclarationError::UnmatchedIntegrationResponse {
                method: method.to_string(),
                path: path.to_string(),
                status: integration.status_code,
            });
        };

        let integration_headers: BTreeSet<&str> = header_keys(integration.response_parameters.keys());
        let method_headers: BTreeSet<&str> = header_keys(declared.response_parameters.keys());
        if let Some(parameter) = integration_headers
            .symmetric_difference(&method_headers)
            .next()
        {
            return Err(DeclarationError::ResponseParameterMismatch {
                method: method.to_string(),
                path: path.to_string(),
                status: integration.status_code,
                parameter: (*parameter).to_string(),
            });
        }
    }

    for response in method_responses {
        if !integration_responses
            .iter()
            .any(|integration| integration.status_code == response.status_code)
        {
            return Err(DeclarationError::UnmatchedMethodResponse {
                method: method.to_string(),
                path: path.to_string(),
                status: response.status_code,
            });
        }
    }

    Ok(())
}

fn first_repeated_status(mut statuses: impl Iterator<Item = u16>) -> Option<u16> {
    let mut seen = BTreeSet::new();
    statuses.find(|status| !seen.insert(*status))
}

fn header_keys<'a>(keys: impl Iterator<Item = &'a String>) -> BTreeSet<&'a str> {
    keys.map(String::as_str)
        .filter(|key| key.starts_with(HEADER_PARAMETER_PREFIX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_helper_builds_symmetric_responses() {
        let cors = Cors::allow_origin("*");
        let integration = cors.integration_response(200);
        let method = cors.method_response(200);

        let key = header_parameter(ALLOW_ORIGIN_HEADER);
        assert_eq!(key, "method.response.header.Access-Control-Allow-Origin");
        assert_eq!(integration.response_parameters.get(&key), Some(&"'*'".to_string()));
        assert_eq!(method.response_parameters.get(&key), Some(&true));

        check_response_symmetry(HttpMethod::Get, "/stats", &[integration], &[method])
            .expect("cors responses are symmetric");
    }

    #[test]
    fn header_on_integration_only_is_rejected() {
        let cors = Cors::allow_origin("*");
        let bare = MethodResponse {
            status_code: 200,
            response_parameters: BTreeMap::new(),
        };

        let error = check_response_symmetry(
            HttpMethod::Get,
            "/stats",
            &[cors.integration_response(200)],
            &[bare],
        )
        .expect_err("dangling header");
        assert!(matches!(
            error,
            DeclarationError::ResponseParameterMismatch { status: 200, .. }
        ));
    }

    #[test]
    fn header_on_method_only_is_rejected() {
        let cors = Cors::allow_origin("*");
        let bare = IntegrationResponse {
            status_code: 200,
            response_parameters: BTreeMap::new(),
        };

        let error = check_response_symmetry(
            HttpMethod::Get,
            "/stats",
            &[bare],
            &[cors.method_response(200)],
        )
        .expect_err("dangling header");
        assert!(matches!(
            error,
            DeclarationError::ResponseParameterMismatch { .. }
        ));
    }

    #[test]
    fn status_codes_must_pair_up() {
        let cors = Cors::allow_origin("*");

        let error = check_response_symmetry(
            HttpMethod::Get,
            "/stats",
            &[cors.integration_response(200)],
            &[cors.method_response(404)],
        )
        .expect_err("200 has no method response");
        assert!(matches!(
            error,
            DeclarationError::UnmatchedIntegrationResponse { status: 200, .. }
        ));

        let error = check_response_symmetry(
            HttpMethod::Get,
            "/stats",
            &[cors.integration_response(200)],
            &[cors.method_response(200), cors.method_response(500)],
        )
        .expect_err("500 has no integration response");
        assert!(matches!(
            error,
            DeclarationError::UnmatchedMethodResponse { status: 500, .. }
        ));
    }

    #[test]
    fn repeated_method_status_is_rejected() {
        let cors = Cors::allow_origin("*");
        let bare = MethodResponse {
            status_code: 200,
            response_parameters: BTreeMap::new(),
        };

        let error = check_response_symmetry(
            HttpMethod::Get,
            "/stats",
            &[cors.integration_response(200)],
            &[cors.method_response(200), bare],
        )
        .expect_err("second 200 would escape the header check");
        assert_eq!(
            error,
            DeclarationError::DuplicateResponseStatus {
                method: "GET".to_string(),
                path: "/stats".to_string(),
                status: 200,
                side: "method",
            }
        );
    }

    #[test]
    fn repeated_integration_status_is_rejected() {
        let cors = Cors::allow_origin("*");

        let error = check_response_symmetry(
            HttpMethod::Get,
            "/stats",
            &[cors.integration_response(200), cors.integration_response(200)],
            &[cors.method_response(200)],
        )
        .expect_err("duplicate integration status");
        assert!(matches!(
            error,
            DeclarationError::DuplicateResponseStatus {
                status: 200,
                side: "integration",
                ..
            }
        ));
    }

    #[test]
    fn non_proxy_needs_an_integration_response() {
        let error = check_response_symmetry(HttpMethod::Get, "/stats", &[], &[])
            .expect_err("nothing declared");
        assert!(matches!(
            error,
            DeclarationError::MissingIntegrationResponses { .. }
        ));
    }

    #[test]
    fn path_parts_are_single_segments() {
        assert!(validate_path_part("stats").is_ok());
        assert!(validate_path_part("{id}").is_ok());
        assert!(validate_path_part("").is_err());
        assert!(validate_path_part("a/b").is_err());
    }

    #[test]
    fn http_methods_parse_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }
}
