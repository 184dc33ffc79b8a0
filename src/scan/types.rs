//! Data types shared by the scanner and its collaborators.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::input::{
    ActiveModifierSet, DeviceClass, GesturePhase, InputBehavior, InputConfig, KeyModifiers,
};
use crate::scan::source::TextSource;
use crate::sentence::Sentence;

/// Failures reported by the scanner's collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Hit test failed: {0}")]
    HitTest(String),

    #[error("Dictionary lookup failed: {0}")]
    Lookup(String),

    #[error("Selection update failed: {0}")]
    Selection(String),
}

/// What the returned dictionary entries were looked up as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupKind {
    Terms,
    Kanji,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    Exact,
    Prefix,
}

/// How the lookup service should interpret the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDetails {
    pub kind: LookupKind,
    pub match_type: MatchType,
}

/// Input state forwarded to the lookup service with each request.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupContext {
    pub modifier_keys: KeyModifiers,
    pub modifiers: ActiveModifierSet,
    /// `None` for programmatic searches
    pub device: Option<DeviceClass>,
    pub detail: Option<SearchDetail>,
}

/// A single dictionary hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    #[serde(default)]
    pub definitions: Vec<String>,
}

/// Result of one lookup request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResult {
    pub entries: Vec<DictionaryEntry>,
    /// Number of characters of the scanned text the entries account for
    pub consumed_length: usize,
}

/// Extra data attached to a programmatic search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDetail {
    /// Remember the host selection before the first search so that
    /// `clear_selection` can put it back
    #[serde(default)]
    pub restore_selection: bool,
}

/// Everything known about the input that triggered a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputInfo {
    /// Matched binding, `None` for click and programmatic searches
    pub config: Option<InputConfig>,
    pub device: Option<DeviceClass>,
    pub phase: GesturePhase,
    pub is_fallback: bool,
    pub modifiers: ActiveModifierSet,
    pub modifier_keys: KeyModifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<SearchDetail>,
}

impl InputInfo {
    /// Input info for a search that did not come from a matched binding.
    pub fn unmatched(
        device: Option<DeviceClass>,
        phase: GesturePhase,
        modifier_keys: KeyModifiers,
        modifiers: ActiveModifierSet,
        detail: Option<SearchDetail>,
    ) -> Self {
        Self {
            config: None,
            device,
            phase,
            is_fallback: false,
            modifiers,
            modifier_keys,
            detail,
        }
    }

    /// Behaviour flags of the matched binding, or the defaults.
    pub fn behavior(&self) -> InputBehavior {
        self.config
            .as_ref()
            .map(|config| config.behavior)
            .unwrap_or_default()
    }

    pub fn lookup_context(&self) -> LookupContext {
        LookupContext {
            modifier_keys: self.modifier_keys,
            modifiers: self.modifiers,
            device: self.device,
            detail: self.detail.clone(),
        }
    }
}

/// Why the scanner asked consumers to clear their results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClearReason {
    MouseDown,
}

/// Whether the host should suppress the default action of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    #[default]
    Propagate,
    PreventDefault,
}

impl Disposition {
    pub fn is_prevented(self) -> bool {
        self == Self::PreventDefault
    }
}

/// Outcome events emitted by the scanner.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ScanEvent {
    SearchSuccess {
        entries: Vec<DictionaryEntry>,
        kind: LookupKind,
        sentence: Sentence,
        input_info: InputInfo,
        /// Snapshot of the matched span
        #[serde(serialize_with = "serialize_source")]
        text_source: Box<dyn TextSource>,
    },
    SearchEmpty {
        input_info: InputInfo,
    },
    SearchError {
        #[serde(serialize_with = "serialize_display")]
        error: ScanError,
        #[serde(serialize_with = "serialize_optional_source")]
        text_source: Option<Box<dyn TextSource>>,
        input_info: InputInfo,
    },
    Clear {
        reason: ClearReason,
    },
}

#[allow(clippy::borrowed_box)]
fn serialize_source<S: Serializer>(
    source: &Box<dyn TextSource>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&source.text())
}

fn serialize_optional_source<S: Serializer>(
    source: &Option<Box<dyn TextSource>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match source {
        Some(source) => serializer.serialize_some(&source.text()),
        None => serializer.serialize_none(),
    }
}

fn serialize_display<S: Serializer>(error: &ScanError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}
