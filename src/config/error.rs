//! Errors raised while interpreting user-authored option values.

use thiserror::Error;

/// A single option value that could not be interpreted.
///
/// These never abort a configuration load: the offending value is skipped and
/// the previous or default value stays in effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown modifier token '{0}'")]
    UnknownModifier(String),

    #[error("unknown termination mode '{0}'")]
    UnknownTerminationMode(String),

    #[error("termination character must be exactly one character, got '{0}'")]
    InvalidCharacter(String),

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}
