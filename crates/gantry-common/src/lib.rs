//! Common types for Gantry: object model, errors, and utilities

#![deny(missing_docs)]

pub mod error;
pub mod monitoring;
pub mod object;
pub mod retry;
pub mod telemetry;

pub use error::Error;
pub use object::{KubeObject, ObjectKey};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label carrying the application name on every assembled object
pub const LABEL_APP: &str = "app";

/// Label naming the product component an object belongs to (backend, system)
pub const LABEL_COMPONENT: &str = "3scale.component";

/// Label naming the element within a component (redis, mysql, ...)
pub const LABEL_COMPONENT_ELEMENT: &str = "3scale.component-element";

/// Pod label used as the workload selector
pub const LABEL_DEPLOYMENT_SELECTOR: &str = "deploymentConfig";
