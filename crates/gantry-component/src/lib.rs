//! Desired-state assembly for Gantry components
//!
//! Validated options go in, a deterministic list of typed Kubernetes objects
//! comes out. Nothing here performs I/O.
//!
//! # Usage
//!
//! ```rust,ignore
//! let options = RedisOptionsBuilder::new()
//!     .app_label("3scale-api-management")
//!     .image("registry.access.redhat.com/rhscl/redis-32-rhel7:3.2")
//!     .build()?;
//! let objects = Redis::new(options).assemble();
//! ```

pub mod component;
pub mod error;
pub mod parameters;
pub mod redis;
pub mod template;

pub use component::{Component, OptionsProvider};
pub use error::OptionsError;
pub use parameters::ParameterDeclaration;
pub use redis::{Redis, RedisOptions, RedisOptionsBuilder, RedisSettings};
pub use template::{render_manifests, Template};
