//! Replay script format.
//!
//! ```toml
//! lookup_delay_ms = 5
//!
//! [document]
//! text = "cat dog"
//!
//! [[dictionary]]
//! term = "cat"
//! definitions = ["a small feline"]
//!
//! [[steps]]
//! type = "mouse-move"
//! x = 4.0
//! y = 0.0
//! modifiers = { shift = true }
//!
//! [[steps]]
//! action = "settle"
//! ```
//!
//! A step is either a host event (tagged by `type`, see
//! [`InputEvent`]) or a control action (tagged by `action`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::ScanningConfig;
use crate::input::InputEvent;
use crate::replay::document::TagSpan;
use crate::scan::DictionaryEntry;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub document: DocumentSpec,

    #[serde(default)]
    pub dictionary: Vec<DictionaryEntry>,

    /// Simulated lookup latency, in milliseconds
    #[serde(default)]
    pub lookup_delay_ms: u64,

    /// Overrides the `[scanning]` table of the loaded config
    #[serde(default)]
    pub scanning: Option<ScanningConfig>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSpec {
    pub text: String,

    #[serde(default)]
    pub tags: Vec<TagSpan>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Control(Control),
    Input(InputEvent),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Control {
    /// Let time pass
    Wait { ms: u64 },
    Enable,
    Disable,
    /// Wait for every spawned lookup to finish
    Settle,
    SearchLast,
    ClearSelection,
    /// Programmatic search at a document position
    Search {
        x: f64,
        y: f64,
        #[serde(default)]
        restore_selection: bool,
    },
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script from {}", path.display()))?;
        Self::from_toml(&source)
            .with_context(|| format!("Failed to parse script from {}", path.display()))
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
