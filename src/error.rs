//! Error type shared by every stream function and the dispatch runtime.

use std::fmt;

/// Per-message failure surfaced to the binder.
///
/// Stream functions never recover locally: every variant propagates to the
/// caller, which owns retry and dead-letter policy.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A field declared in the record schema could not be read from the record.
    SchemaResolution {
        field: String,
    },
    /// A required field is missing, null or empty.
    InvalidField {
        field: String,
        reason: String,
    },
    /// Any other runtime fault (payload mismatch, undecodable body, unknown route).
    UnexpectedFault(String),
    /// Binding configuration could not be loaded or is inconsistent.
    Config(String),
}

impl StreamError {
    pub fn schema_resolution(field: impl Into<String>) -> Self {
        StreamError::SchemaResolution { field: field.into() }
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        StreamError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn fault(msg: impl Into<String>) -> Self {
        StreamError::UnexpectedFault(msg.into())
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::SchemaResolution { field } => {
                write!(f, "Schema field '{}' cannot be resolved on record", field)
            }
            StreamError::InvalidField { field, reason } => {
                write!(f, "Invalid field '{}': {}", field, reason)
            }
            StreamError::UnexpectedFault(msg) => write!(f, "Unexpected fault: {}", msg),
            StreamError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::UnexpectedFault(format!("JSON error: {}", err))
    }
}

impl From<apache_avro::Error> for StreamError {
    fn from(err: apache_avro::Error) -> Self {
        StreamError::UnexpectedFault(format!("Avro error: {}", err))
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::UnexpectedFault(format!("IO error: {}", err))
    }
}

impl From<serde_yaml::Error> for StreamError {
    fn from(err: serde_yaml::Error) -> Self {
        StreamError::Config(format!("Failed to parse YAML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            StreamError::schema_resolution("id").to_string(),
            "Schema field 'id' cannot be resolved on record"
        );
        assert_eq!(
            StreamError::invalid_field("code", "must not be empty").to_string(),
            "Invalid field 'code': must not be empty"
        );
        assert_eq!(
            StreamError::fault("boom").to_string(),
            "Unexpected fault: boom"
        );
    }
}
