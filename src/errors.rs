//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the retrieval core. A single error enum is
//! threaded through the Store, Citation Grammar, Adapter, and Shell layers.
//! Only the Shell ever turns a `CoreError` into the closed `error.code`
//! vocabulary consumed by callers; internal variants never leak past that
//! boundary except inside `error.message`/`details`.
//!
//! ## Usage
//! ```rust
//! use german_law_retrieval_core::errors::{CoreError, Result};
//!
//! fn parse_something(s: &str) -> Result<()> {
//!     if s.trim().is_empty() {
//!         return Err(CoreError::Validation {
//!             field: "citation".to_string(),
//!             reason: "must not be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

/// Result type used throughout the application.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Comprehensive error type for the retrieval core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Generic I/O errors (config loading, subprocess spawning).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the indexed corpus database.
    #[error("store error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration errors (missing/invalid settings).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Argument validation failure; maps to `invalid_arguments`.
    #[error("validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// No adapter registered for the requested jurisdiction code.
    #[error("unknown country: {code}")]
    UnknownCountry { code: String },

    /// Attempted to register two adapters under the same normalized code.
    #[error("duplicate country registration: {code}")]
    DuplicateCountry { code: String },

    /// Adapter's static capability contract does not cover the requested tool.
    #[error("capability '{capability}' is not supported by adapter '{country}'")]
    UnsupportedCapability { country: String, capability: String },

    /// Tool name not in the recognized set.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// Catch-all for unexpected internal failures.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Maps this error onto the closed `error.code` vocabulary from the tool
    /// envelope contract. Only the Shell should call this.
    pub fn tool_error_code(&self) -> &'static str {
        match self {
            CoreError::Validation { .. } => "invalid_arguments",
            CoreError::UnknownCountry { .. } => "unknown_country",
            CoreError::DuplicateCountry { .. } => "duplicate_country",
            CoreError::UnsupportedCapability { .. } => "unsupported_capability",
            CoreError::UnknownTool { .. } => "unknown_tool",
            CoreError::Io(_)
            | CoreError::Database(_)
            | CoreError::Json(_)
            | CoreError::Toml(_)
            | CoreError::Config { .. }
            | CoreError::Internal { .. } => "internal_error",
        }
    }

    /// Error category used for log correlation and metrics grouping.
    pub fn category(&self) -> &'static str {
        match self {
            CoreError::Io(_) => "io",
            CoreError::Database(_) => "store",
            CoreError::Json(_) | CoreError::Toml(_) => "serialization",
            CoreError::Config { .. } => "configuration",
            CoreError::Validation { .. } => "validation",
            CoreError::UnknownCountry { .. } | CoreError::DuplicateCountry { .. } => "registry",
            CoreError::UnsupportedCapability { .. } => "capability",
            CoreError::UnknownTool { .. } => "dispatch",
            CoreError::Internal { .. } => "internal",
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal {
            message: message.into(),
        }
    }
}

/// Error payload embedded in a `ToolResult` when `ok == false`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&CoreError> for ToolErrorPayload {
    fn from(err: &CoreError) -> Self {
        let details = match err {
            CoreError::Validation { field, .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            CoreError::UnknownCountry { code } => Some(serde_json::json!({ "country": code })),
            CoreError::DuplicateCountry { code } => Some(serde_json::json!({ "country": code })),
            CoreError::UnsupportedCapability { country, capability } => {
                Some(serde_json::json!({ "country": country, "capability": capability }))
            }
            CoreError::UnknownTool { name } => Some(serde_json::json!({ "tool": name })),
            _ => None,
        };

        ToolErrorPayload {
            code: err.tool_error_code().to_string(),
            message: err.to_string(),
            details,
        }
    }
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::CoreError::Internal { message: $msg.to_string() }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::CoreError::Internal { message: format!($fmt, $($arg)*) }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_invalid_arguments() {
        let err = CoreError::validation("query", "must not be empty");
        assert_eq!(err.tool_error_code(), "invalid_arguments");
        let payload = ToolErrorPayload::from(&err);
        assert_eq!(payload.code, "invalid_arguments");
        assert!(payload.details.is_some());
    }

    #[test]
    fn unknown_country_maps_correctly() {
        let err = CoreError::UnknownCountry { code: "se".to_string() };
        assert_eq!(err.tool_error_code(), "unknown_country");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = CoreError::internal("boom");
        let payload = ToolErrorPayload::from(&err);
        assert_eq!(payload.code, "internal_error");
        assert!(payload.details.is_none());
    }
}
