use thiserror::Error;

/// Structural failures detected while building a stack, before anything is
/// provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("construct id cannot be empty")]
    EmptyConstructId,

    #[error("construct id '{0}' is already declared in this stack")]
    DuplicateConstructId(String),

    #[error("handle does not belong to stack '{0}'")]
    ForeignHandle(String),

    #[error("table '{0}' must declare a partition key name")]
    MissingPartitionKey(String),

    #[error("table '{0}' must provision at least one read and one write capacity unit")]
    ZeroCapacity(String),

    #[error("function '{0}' must declare a handler entry point")]
    MissingHandler(String),

    #[error("unsupported runtime '{0}'")]
    UnsupportedRuntime(String),

    #[error("unsupported access mode '{0}', expected 'read' or 'write'")]
    UnsupportedAccessMode(String),

    #[error("function '{0}' is granted access to more than one table")]
    MultipleTableGrants(String),

    #[error("function '{0}' sets TABLE_NAME to a hardcoded value instead of a table reference")]
    HardcodedTableName(String),

    #[error("function '{function}' points TABLE_NAME at table '{table}' without a grant on it")]
    UngrantedTableAccess { function: String, table: String },

    #[error("function '{function}' is granted access to table '{table}' but TABLE_NAME points elsewhere")]
    TableNameMismatch { function: String, table: String },

    #[error("environment variable name '{key}' on function '{function}' is invalid")]
    InvalidEnvironmentKey { function: String, key: String },

    #[error("rate must be a positive number of minutes")]
    NonPositiveRate,

    #[error("rule '{0}' has no targets")]
    EmptyTargets(String),

    #[error("invalid path segment '{0}'")]
    InvalidPathPart(String),

    #[error("unsupported http method '{0}'")]
    UnsupportedHttpMethod(String),

    #[error("resource '{resource}' declares {method} more than once")]
    DuplicateMethod { resource: String, method: String },

    #[error("non-proxy integration for {method} {path} must declare at least one integration response")]
    MissingIntegrationResponses { method: String, path: String },

    #[error("status {status} is declared more than once among the {side} responses of {method} {path}")]
    DuplicateResponseStatus {
        method: String,
        path: String,
        status: u16,
        side: &'static str,
    },

    #[error("integration response {status} on {method} {path} has no matching method response")]
    UnmatchedIntegrationResponse {
        method: String,
        path: String,
        status: u16,
    },

    #[error("method response {status} on {method} {path} has no matching integration response")]
    UnmatchedMethodResponse {
        method: String,
        path: String,
        status: u16,
    },

    #[error("response parameter '{parameter}' for status {status} on {method} {path} is declared on only one side")]
    ResponseParameterMismatch {
        method: String,
        path: String,
        status: u16,
        parameter: String,
    },
}
