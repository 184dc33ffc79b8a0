//! Configuration type definitions.
//!
//! These mirror the TOML file one to one. Values that need interpretation
//! (modifier strings, termination mode, termination characters) are kept as
//! authored so that a malformed entry can be rejected on its own when the
//! runtime options are resolved.

use crate::input::{DeviceSet, InputBehavior};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scanning behaviour: when lookups fire and what text they cover.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScanningConfig {
    /// Input bindings, checked in order
    #[serde(default = "default_inputs")]
    pub inputs: Vec<InputDefinition>,

    /// Hit-test through overlays and shadow content
    #[serde(default)]
    pub deep_content_scan: bool,

    /// Compensate for CSS zoom when the host supports it
    #[serde(default = "default_true")]
    pub normalize_css_zoom: bool,

    /// Select the matched text in the host after a successful lookup
    #[serde(default = "default_true")]
    pub select_text: bool,

    /// Hover delay before a passive (no modifier) lookup, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Listen for touch input when pointer events are disabled
    #[serde(default = "default_true")]
    pub touch_input_enabled: bool,

    /// Use unified pointer events instead of separate mouse/touch listeners
    #[serde(default)]
    pub pointer_events_enabled: bool,

    /// Number of characters handed to the lookup service
    #[serde(default = "default_scan_length")]
    pub scan_length: usize,

    /// Follow rendered layout when extending the scanned text
    #[serde(default)]
    pub layout_aware_scan: bool,

    /// Suppress the host's middle-click behaviour
    #[serde(default)]
    pub prevent_middle_mouse: bool,

    /// Ask the lookup service for prefix matches
    #[serde(default)]
    pub match_type_prefix: bool,

    /// Scan image alt text
    #[serde(default = "default_true")]
    pub scan_alt_text: bool,

    /// Allow term lookups at all
    #[serde(default = "default_true")]
    pub search_terms: bool,

    /// Allow single-character kanji lookups when terms find nothing
    #[serde(default = "default_true")]
    pub search_kanji: bool,

    /// Scan at the position of a primary click
    #[serde(default)]
    pub search_on_click: bool,

    /// Scan on clicks only, never on mouse movement
    #[serde(default)]
    pub search_on_click_only: bool,

    /// Window after a press in which a selection change is attributed to the
    /// press itself, in milliseconds
    #[serde(default = "default_guard_ms")]
    pub click_guard_ms: u64,

    /// How long an engine-initiated selection change is ignored, in milliseconds
    #[serde(default = "default_guard_ms")]
    pub selection_bracket_ms: u64,

    /// When set, scanned text is cut at the first node whose tag is not listed
    #[serde(default)]
    pub include_tags: Vec<String>,

    /// Scanned text is cut at the first node whose tag is listed
    #[serde(default)]
    pub exclude_tags: Vec<String>,

    /// Sentence extraction settings
    #[serde(default)]
    pub sentence_parsing: SentenceParsingConfig,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            inputs: default_inputs(),
            deep_content_scan: false,
            normalize_css_zoom: true,
            select_text: true,
            delay_ms: default_delay_ms(),
            touch_input_enabled: true,
            pointer_events_enabled: false,
            scan_length: default_scan_length(),
            layout_aware_scan: false,
            prevent_middle_mouse: false,
            match_type_prefix: false,
            scan_alt_text: true,
            search_terms: true,
            search_kanji: true,
            search_on_click: false,
            search_on_click_only: false,
            click_guard_ms: default_guard_ms(),
            selection_bracket_ms: default_guard_ms(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            sentence_parsing: SentenceParsingConfig::default(),
        }
    }
}

/// One input binding as authored.
///
/// ```toml
/// [[scanning.inputs]]
/// include = "shift"
/// exclude = "mouse0"
/// types = { mouse = true }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InputDefinition {
    /// Space separated tokens that must all be held (`alt ctrl meta shift mouse0..mouse5`)
    #[serde(default)]
    pub include: String,

    /// Space separated tokens that disqualify the binding when all are held
    #[serde(default)]
    pub exclude: String,

    /// Device classes the binding applies to
    #[serde(default)]
    pub types: DeviceSet,

    /// Behaviour toggles
    #[serde(default)]
    pub options: InputBehavior,
}

/// Sentence extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SentenceParsingConfig {
    /// Characters scanned in each direction from the matched text
    #[serde(default = "default_scan_extent")]
    pub scan_extent: usize,

    /// One of `custom`, `custom-no-newlines`, `newlines`, `none`
    #[serde(default = "default_termination_mode")]
    pub termination_mode: String,

    /// Terminators (single character) and quote pairs (two characters)
    #[serde(default = "default_termination_characters")]
    pub termination_characters: Vec<TerminationCharacter>,
}

impl Default for SentenceParsingConfig {
    fn default() -> Self {
        Self {
            scan_extent: default_scan_extent(),
            termination_mode: default_termination_mode(),
            termination_characters: default_termination_characters(),
        }
    }
}

/// A sentence terminator, or a quote pair when `character2` is set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TerminationCharacter {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Terminator, or the opening quote
    pub character1: String,

    /// Closing quote
    #[serde(default)]
    pub character2: Option<String>,

    /// Keep the character when it starts the sentence
    #[serde(default)]
    pub include_character_at_start: bool,

    /// Keep the character when it ends the sentence
    #[serde(default)]
    pub include_character_at_end: bool,
}

impl TerminationCharacter {
    fn terminator(c: &str) -> Self {
        Self {
            enabled: true,
            character1: c.to_string(),
            character2: None,
            include_character_at_start: false,
            include_character_at_end: true,
        }
    }

    fn quote(open: &str, close: &str) -> Self {
        Self {
            enabled: true,
            character1: open.to_string(),
            character2: Some(close.to_string()),
            include_character_at_start: true,
            include_character_at_end: true,
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    20
}

fn default_scan_length() -> usize {
    16
}

fn default_guard_ms() -> u64 {
    50
}

fn default_scan_extent() -> usize {
    200
}

fn default_termination_mode() -> String {
    "custom".to_string()
}

fn default_inputs() -> Vec<InputDefinition> {
    vec![
        InputDefinition {
            include: "shift".to_string(),
            exclude: String::new(),
            types: DeviceSet {
                mouse: true,
                touch: false,
                pen: false,
            },
            options: InputBehavior::default(),
        },
        InputDefinition {
            include: String::new(),
            exclude: String::new(),
            types: DeviceSet {
                mouse: false,
                touch: true,
                pen: true,
            },
            options: InputBehavior {
                scan_on_touch_press: true,
                scan_on_touch_tap: true,
                scan_on_pen_hover: true,
                scan_on_pen_press: true,
                prevent_touch_scrolling: true,
                prevent_pen_scrolling: true,
                ..InputBehavior::default()
            },
        },
    ]
}

fn default_termination_characters() -> Vec<TerminationCharacter> {
    let mut characters: Vec<TerminationCharacter> = ["。", "！", "？", ".", "!", "?", "…"]
        .into_iter()
        .map(TerminationCharacter::terminator)
        .collect();
    characters.extend(
        [
            ("「", "」"),
            ("『", "』"),
            ("\"", "\""),
            ("'", "'"),
            ("（", "）"),
            ("(", ")"),
        ]
        .into_iter()
        .map(|(open, close)| TerminationCharacter::quote(open, close)),
    );
    characters
}
