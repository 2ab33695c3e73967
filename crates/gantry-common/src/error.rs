//! Error types shared across Gantry crates
//!
//! Errors are structured with fields to aid debugging in production.
//! Variants carry the object kind and name they concern whenever known.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Gantry cluster-facing operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The object kind being serialized (if known)
        kind: Option<String>,
    },

    /// The store does not know how to handle an object kind
    #[error("unsupported kind {kind}: {message}")]
    UnsupportedKind {
        /// Kind string as reported by the object
        kind: String,
        /// Description of what failed
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "store", "driver")
        context: String,
    },
}

impl Error {
    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with object kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an unsupported-kind error
    pub fn unsupported_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Serialization and unsupported-kind errors need a code or config fix.
    /// Kubernetes errors are retried unless the API rejected the request (4xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::Serialization { .. } => false,
            Error::UnsupportedKind { .. } => false,
            Error::Internal { .. } => true,
        }
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Internal { context, .. } => Some(context),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_errors_carry_kind_and_are_permanent() {
        let err = Error::serialization_for_kind("PrometheusRule", "missing field 'spec'");
        match &err {
            Error::Serialization { kind, .. } => {
                assert_eq!(kind.as_deref(), Some("PrometheusRule"));
            }
            _ => panic!("Expected Serialization variant"),
        }
        assert!(err.to_string().contains("serialization error"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn unsupported_kind_is_not_retryable() {
        let err = Error::unsupported_kind("CronJob", "no typed API registered");
        assert!(err.to_string().contains("CronJob"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn internal_error_context() {
        let err = Error::internal_with_context("store", "unexpected state");
        assert!(err.is_retryable());
        assert_eq!(err.context(), Some("store"));
        assert!(err.to_string().contains("[store]"));

        let err = Error::internal("unexpected state");
        assert_eq!(err.context(), Some(UNKNOWN_CONTEXT));
    }

    #[test]
    fn api_rejections_are_not_retried() {
        let err = Error::from(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "field is immutable".to_string(),
            reason: "Invalid".to_string(),
            code: 422,
        }));
        assert!(!err.is_retryable());

        let err = Error::from(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "etcd timeout".to_string(),
            reason: "InternalError".to_string(),
            code: 500,
        }));
        assert!(err.is_retryable());
    }

    #[test]
    fn json_errors_convert_to_serialization() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err = Error::from(parse.unwrap_err());
        assert!(matches!(err, Error::Serialization { kind: None, .. }));
    }
}
