//! Reconciliation errors
//!
//! Dispatch and mutation failures are scoped to a single object: the driver
//! records them against that object, skips its write, and moves on.

use thiserror::Error;

/// Error raised while dispatching or applying a mutator
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No mutator is registered for the object's kind
    #[error("no mutator registered for kind {kind}")]
    NoMutatorForKind {
        /// Kind that missed the registry
        kind: String,
    },

    /// A second mutator was registered for a kind
    #[error("a mutator is already registered for kind {kind}")]
    DuplicateMutator {
        /// Kind registered twice
        kind: String,
    },

    /// A mutator received an object of a kind it does not handle
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind the mutator handles
        expected: String,
        /// Kind actually received
        found: String,
    },

    /// The live object lacks structure the mutator needs
    #[error("malformed existing {kind}/{name}: {reason}")]
    MalformedExisting {
        /// Kind of the live object
        kind: String,
        /// Name of the live object
        name: String,
        /// What is missing
        reason: String,
    },

    /// Fetching or writing the object failed
    #[error("store error: {0}")]
    Store(#[from] gantry_common::Error),
}

impl ReconcileError {
    /// Build a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Build a malformed-existing error
    pub fn malformed(
        kind: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedExisting {
            kind: kind.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the store should be asked again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_object() {
        let err = ReconcileError::malformed("PrometheusRule", "redis", "no rule groups");
        assert_eq!(
            err.to_string(),
            "malformed existing PrometheusRule/redis: no rule groups"
        );

        let err = ReconcileError::type_mismatch("Service", "ConfigMap");
        assert_eq!(err.to_string(), "type mismatch: expected Service, found ConfigMap");
    }

    #[test]
    fn only_store_errors_retry() {
        assert!(!ReconcileError::NoMutatorForKind {
            kind: "CronJob".to_string()
        }
        .is_retryable());
        assert!(ReconcileError::from(gantry_common::Error::internal("timeout")).is_retryable());
        assert!(
            !ReconcileError::from(gantry_common::Error::serialization("bad json")).is_retryable()
        );
    }
}
