//! Runtime side of the function environment contract.
//!
//! Deployed functions locate their table only through `TABLE_NAME`; a missing
//! or blank value is a deployment misconfiguration, never something to paper
//! over with a default.

use thiserror::Error;

use crate::function::TABLE_NAME_ENV;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("{0} must be configured")]
    Missing(&'static str),

    #[error("{0} must not be blank")]
    Blank(&'static str),
}

pub fn table_name_from_env() -> Result<String, EnvironmentError> {
    table_name_from_lookup(|key| std::env::var(key).ok())
}

pub fn table_name_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, EnvironmentError> {
    let value = lookup(TABLE_NAME_ENV).ok_or(EnvironmentError::Missing(TABLE_NAME_ENV))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvironmentError::Blank(TABLE_NAME_ENV));
    }
    Ok(trimmed.to_string())
}
