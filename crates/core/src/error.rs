//! Centralized error types for the ruleswitch workspace.

use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RuleSwitchError {
    #[error("Not authenticated: log in before calling the Tooling API")]
    NotAuthenticated,

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RuleSwitchResult<T> = Result<T, RuleSwitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let e = RuleSwitchError::Api {
            status: 403,
            message: "INSUFFICIENT_ACCESS".into(),
        };
        assert_eq!(e.to_string(), "API error (HTTP 403): INSUFFICIENT_ACCESS");
    }
}
