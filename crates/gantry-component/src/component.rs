//! Component and option-provider seams
//!
//! A component turns validated options into desired objects. Where the
//! options come from (template placeholders, resolved values) is the
//! provider's business; components never look at it.

use gantry_common::KubeObject;

use crate::error::OptionsError;
use crate::parameters::ParameterDeclaration;
use crate::template::Template;

/// Supplies validated options for one component.
pub trait OptionsProvider {
    /// The component's immutable options type
    type Options;

    /// Build the options, failing if any required option is missing
    fn provide(&self) -> Result<Self::Options, OptionsError>;
}

/// A logical application component that assembles desired objects.
pub trait Component: Send + Sync {
    /// Component name used in logs and template metadata
    fn name(&self) -> &str;

    /// Parameters referenced by placeholder options
    fn declare_parameters(&self) -> Vec<ParameterDeclaration>;

    /// Desired objects in a stable order.
    ///
    /// Pure: identical options always yield identical objects.
    fn assemble(&self) -> Vec<KubeObject>;

    /// Adjust the template after every component has been assembled into it.
    ///
    /// `others` holds the remaining components of the same template.
    fn post_process(&self, _template: &mut Template, _others: &[&dyn Component]) {}
}
