//! Template parameter declarations
//!
//! A component declares the parameters its placeholder options refer to, so
//! the packaging layer can prompt for them or fall back to their defaults.

use serde::{Deserialize, Serialize};

/// One substitutable template parameter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDeclaration {
    /// Parameter name as referenced by `${NAME}` placeholders
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Whether the template processor must resolve a value
    #[serde(default)]
    pub required: bool,
    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ParameterDeclaration {
    /// Declare a required parameter with a default value
    pub fn required(
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
            value: Some(default.into()),
        }
    }

    /// Declare an optional parameter
    pub fn optional(
        name: impl Into<String>,
        description: impl Into<String>,
        default: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
            value: default,
        }
    }

    /// `${NAME}` placeholder referring to this parameter
    pub fn placeholder(&self) -> String {
        placeholder(&self.name)
    }
}

/// `${NAME}` placeholder for a parameter name
pub fn placeholder(name: &str) -> String {
    format!("${{{}}}", name)
}
