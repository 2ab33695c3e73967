//! Option validation errors

/// Errors raised while building component options.
///
/// Always surfaced before any object is assembled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("{component}: required option '{option}' has not been provided")]
    MissingRequiredOption {
        component: &'static str,
        option: &'static str,
    },

    #[error("{component}: option '{option}' is invalid: {message}")]
    InvalidOption {
        component: &'static str,
        option: &'static str,
        message: String,
    },
}

impl OptionsError {
    /// Name of the option at fault
    pub fn option(&self) -> &'static str {
        match self {
            Self::MissingRequiredOption { option, .. } | Self::InvalidOption { option, .. } => {
                option
            }
        }
    }
}
