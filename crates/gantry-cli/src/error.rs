//! Error types for the CLI

use gantry_common::telemetry::TelemetryError;
use gantry_component::OptionsError;
use gantry_reconcile::ReconcileError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid options: {0}")]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Gantry(#[from] gantry_common::Error),

    #[error("reconciler setup failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("logging setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{failed} of {total} objects failed to reconcile")]
    ReconcileFailed { failed: usize, total: usize },

    #[error("command failed: {message}")]
    CommandFailed { message: String },
}

impl Error {
    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }
}
