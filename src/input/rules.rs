//! Input bindings and the matcher that picks one for an event.

use super::events::DeviceClass;
use super::modifiers::{ActiveModifierSet, ModifierToken};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Device classes an input binding applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DeviceSet {
    pub mouse: bool,
    pub touch: bool,
    pub pen: bool,
}

impl DeviceSet {
    pub fn contains(&self, device: DeviceClass) -> bool {
        match device {
            DeviceClass::Mouse => self.mouse,
            DeviceClass::Touch => self.touch,
            DeviceClass::Pen => self.pen,
        }
    }
}

/// Behaviour toggles attached to an input binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InputBehavior {
    pub search_terms: bool,
    pub search_kanji: bool,
    pub scan_on_touch_move: bool,
    pub scan_on_touch_press: bool,
    pub scan_on_touch_release: bool,
    pub scan_on_touch_tap: bool,
    pub scan_on_pen_hover: bool,
    pub scan_on_pen_move: bool,
    pub scan_on_pen_press: bool,
    pub scan_on_pen_release: bool,
    /// Scan while the pen hovers again after being lifted
    pub scan_on_pen_release_hover: bool,
    pub prevent_touch_scrolling: bool,
    pub prevent_pen_scrolling: bool,
}

impl Default for InputBehavior {
    fn default() -> Self {
        Self {
            search_terms: true,
            search_kanji: true,
            scan_on_touch_move: false,
            scan_on_touch_press: false,
            scan_on_touch_release: false,
            scan_on_touch_tap: false,
            scan_on_pen_hover: false,
            scan_on_pen_move: false,
            scan_on_pen_press: false,
            scan_on_pen_release: false,
            scan_on_pen_release_hover: false,
            prevent_touch_scrolling: false,
            prevent_pen_scrolling: false,
        }
    }
}

/// A resolved input binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputConfig {
    /// Tokens that must all be present
    pub include: Vec<ModifierToken>,
    /// Tokens that disqualify the binding when all are present
    pub exclude: Vec<ModifierToken>,
    pub devices: DeviceSet,
    pub behavior: InputBehavior,
}

impl InputConfig {
    /// Whether the binding accepts `modifiers`, ignoring device class.
    ///
    /// Exclusion is an all-present test and always wins over inclusion.
    pub fn matches(&self, modifiers: &ActiveModifierSet) -> bool {
        modifiers.contains_all(&self.include)
            && (self.exclude.is_empty() || !modifiers.contains_all(&self.exclude))
    }
}

/// Which binding matched, and whether it was only the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputMatch {
    pub index: usize,
    pub is_fallback: bool,
}

/// Selects the binding for an event.
///
/// Bindings are checked in author order. The first matching binding with a
/// non-empty `include` wins immediately. Otherwise the first matching binding
/// with an empty `include` is returned as a fallback.
pub fn match_input(
    device: DeviceClass,
    modifiers: &ActiveModifierSet,
    configs: &[InputConfig],
) -> Option<InputMatch> {
    let mut fallback = None;

    for (index, config) in configs.iter().enumerate() {
        if !config.devices.contains(device) || !config.matches(modifiers) {
            continue;
        }
        if !config.include.is_empty() {
            return Some(InputMatch {
                index,
                is_fallback: false,
            });
        }
        if fallback.is_none() {
            fallback = Some(InputMatch {
                index,
                is_fallback: true,
            });
        }
    }

    fallback
}
