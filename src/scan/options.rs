//! Runtime scanner options resolved from the raw configuration.

use log::warn;
use tokio::time::Duration;

use crate::config::{
    InputDefinition, MAX_SCAN_EXTENT, MAX_SCAN_LENGTH, OptionError, ScanningConfig,
    SentenceParsingConfig, TerminationCharacter, TerminationMode,
};
use crate::input::{InputConfig, ModifierToken};
use crate::sentence::SentenceRules;

/// Resolved options. Replaced wholesale on every configuration change.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub inputs: Vec<InputConfig>,
    pub deep_content_scan: bool,
    pub normalize_css_zoom: bool,
    pub select_text: bool,
    pub delay: Duration,
    pub touch_input_enabled: bool,
    pub pointer_events_enabled: bool,
    pub scan_length: usize,
    pub layout_aware_scan: bool,
    pub prevent_middle_mouse: bool,
    pub match_type_prefix: bool,
    pub scan_alt_text: bool,
    pub search_terms: bool,
    pub search_kanji: bool,
    pub search_on_click: bool,
    pub search_on_click_only: bool,
    pub click_guard: Duration,
    pub selection_bracket: Duration,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub termination_mode: TerminationMode,
    pub sentence: SentenceRules,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::resolve(&ScanningConfig::default(), &Self::baseline())
    }
}

impl ScanOptions {
    /// Options with nothing bound, used as the fallback for the defaults.
    fn baseline() -> Self {
        Self {
            inputs: Vec::new(),
            deep_content_scan: false,
            normalize_css_zoom: true,
            select_text: true,
            delay: Duration::from_millis(20),
            touch_input_enabled: true,
            pointer_events_enabled: false,
            scan_length: 16,
            layout_aware_scan: false,
            prevent_middle_mouse: false,
            match_type_prefix: false,
            scan_alt_text: true,
            search_terms: true,
            search_kanji: true,
            search_on_click: false,
            search_on_click_only: false,
            click_guard: Duration::from_millis(50),
            selection_bracket: Duration::from_millis(50),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            termination_mode: TerminationMode::Custom,
            sentence: SentenceRules::new(200, true),
        }
    }

    /// Interprets `raw`. A value that cannot be interpreted is reported and
    /// the corresponding value of `previous` is kept; a malformed input
    /// binding or termination character is dropped on its own.
    pub fn resolve(raw: &ScanningConfig, previous: &ScanOptions) -> Self {
        let scan_length = positive(raw.scan_length, "scan_length")
            .map(|length| at_most(length, MAX_SCAN_LENGTH, "scan_length"))
            .unwrap_or_else(|err| {
                warn!("Ignoring scan_length: {err}");
                previous.scan_length
            });

        let termination_mode = raw
            .sentence_parsing
            .termination_mode
            .parse::<TerminationMode>()
            .unwrap_or_else(|err| {
                warn!("Ignoring termination_mode: {err}");
                previous.termination_mode
            });

        let extent = positive(raw.sentence_parsing.scan_extent, "scan_extent")
            .map(|extent| at_most(extent, MAX_SCAN_EXTENT, "scan_extent"))
            .unwrap_or_else(|err| {
                warn!("Ignoring scan_extent: {err}");
                previous.sentence.extent
            });

        Self {
            inputs: resolve_inputs(&raw.inputs),
            deep_content_scan: raw.deep_content_scan,
            normalize_css_zoom: raw.normalize_css_zoom,
            select_text: raw.select_text,
            delay: Duration::from_millis(raw.delay_ms),
            touch_input_enabled: raw.touch_input_enabled,
            pointer_events_enabled: raw.pointer_events_enabled,
            scan_length,
            layout_aware_scan: raw.layout_aware_scan,
            prevent_middle_mouse: raw.prevent_middle_mouse,
            match_type_prefix: raw.match_type_prefix,
            scan_alt_text: raw.scan_alt_text,
            search_terms: raw.search_terms,
            search_kanji: raw.search_kanji,
            search_on_click: raw.search_on_click,
            search_on_click_only: raw.search_on_click_only,
            click_guard: Duration::from_millis(raw.click_guard_ms),
            selection_bracket: Duration::from_millis(raw.selection_bracket_ms),
            include_tags: raw.include_tags.clone(),
            exclude_tags: raw.exclude_tags.clone(),
            termination_mode,
            sentence: compile_sentence_rules(extent, termination_mode, &raw.sentence_parsing),
        }
    }

    /// Whether switching from `self` to `other` changes which host events
    /// need listening to.
    pub fn listeners_differ(&self, other: &ScanOptions) -> bool {
        self.pointer_events_enabled != other.pointer_events_enabled
            || self.touch_input_enabled != other.touch_input_enabled
            || self.search_on_click_only != other.search_on_click_only
    }
}

fn positive(value: usize, field: &'static str) -> Result<usize, OptionError> {
    if value == 0 {
        return Err(OptionError::NotPositive { field });
    }
    Ok(value)
}

fn at_most(value: usize, max: usize, field: &str) -> usize {
    if value > max {
        warn!("Clamping {field} {value} to {max}");
        return max;
    }
    value
}

fn resolve_inputs(definitions: &[InputDefinition]) -> Vec<InputConfig> {
    definitions
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| match resolve_input(definition) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!("Skipping input binding #{index}: {err}");
                None
            }
        })
        .collect()
}

fn resolve_input(definition: &InputDefinition) -> Result<InputConfig, OptionError> {
    Ok(InputConfig {
        include: ModifierToken::parse_list(&definition.include)?,
        exclude: ModifierToken::parse_list(&definition.exclude)?,
        devices: definition.types,
        behavior: definition.options,
    })
}

/// Builds terminator and quote tables for `mode` from the configured
/// characters. Disabled and malformed entries are skipped.
pub fn compile_sentence_rules(
    extent: usize,
    mode: TerminationMode,
    parsing: &SentenceParsingConfig,
) -> SentenceRules {
    let mut rules = SentenceRules::new(extent, mode.terminates_at_newlines());
    if !mode.uses_characters() {
        return rules;
    }

    for entry in parsing
        .termination_characters
        .iter()
        .filter(|entry| entry.enabled)
    {
        if let Err(err) = add_termination_character(&mut rules, entry) {
            warn!("Skipping termination character: {err}");
        }
    }
    rules
}

fn add_termination_character(
    rules: &mut SentenceRules,
    entry: &TerminationCharacter,
) -> Result<(), OptionError> {
    let first = single_char(&entry.character1)?;
    match &entry.character2 {
        None => rules.add_terminator(
            first,
            entry.include_character_at_start,
            entry.include_character_at_end,
        ),
        Some(second) => rules.add_quote_pair(
            first,
            single_char(second)?,
            entry.include_character_at_start,
            entry.include_character_at_end,
        ),
    }
    Ok(())
}

fn single_char(value: &str) -> Result<char, OptionError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(OptionError::InvalidCharacter(value.to_string())),
    }
}
