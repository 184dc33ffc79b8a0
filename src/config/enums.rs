//! Configuration enum types.

use super::error::OptionError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How sentence boundaries are detected around a scanned span.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationMode {
    /// Configured terminators and quotes, plus line breaks
    Custom,
    /// Configured terminators and quotes only
    CustomNoNewlines,
    /// Line breaks only
    Newlines,
    /// Only the scan extent bounds the sentence
    None,
}

impl TerminationMode {
    /// Whether configured termination characters take part.
    pub fn uses_characters(self) -> bool {
        matches!(self, Self::Custom | Self::CustomNoNewlines)
    }

    /// Whether a bare line break ends the sentence.
    pub fn terminates_at_newlines(self) -> bool {
        matches!(self, Self::Custom | Self::Newlines)
    }
}

impl FromStr for TerminationMode {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "custom" => Ok(Self::Custom),
            "custom-no-newlines" => Ok(Self::CustomNoNewlines),
            "newlines" => Ok(Self::Newlines),
            "none" => Ok(Self::None),
            _ => Err(OptionError::UnknownTerminationMode(s.to_string())),
        }
    }
}
