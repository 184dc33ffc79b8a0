//! Modifier key and button state, and the classifier that canonicalizes it.

use crate::config::OptionError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of mouse buttons that map to tokens (`mouse0` through `mouse5`).
pub const BUTTON_TOKEN_COUNT: u8 = 6;

/// Keyboard modifier state carried by an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct KeyModifiers {
    /// Alt key pressed
    pub alt: bool,
    /// Ctrl key pressed
    pub ctrl: bool,
    /// Meta (Super/Command) key pressed
    pub meta: bool,
    /// Shift key pressed
    pub shift: bool,
}

impl KeyModifiers {
    /// Creates a new instance with all keys released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any modifier key is held.
    pub fn any(&self) -> bool {
        self.alt || self.ctrl || self.meta || self.shift
    }

    /// Held keys as tokens, in canonical order.
    pub fn tokens(&self) -> Vec<ModifierToken> {
        [
            (self.alt, ModifierToken::Alt),
            (self.ctrl, ModifierToken::Ctrl),
            (self.meta, ModifierToken::Meta),
            (self.shift, ModifierToken::Shift),
        ]
        .into_iter()
        .filter_map(|(held, token)| held.then_some(token))
        .collect()
    }
}

/// One abstract modifier: a key or a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierToken {
    Alt,
    Ctrl,
    Meta,
    Shift,
    /// Mouse button by index, `0..BUTTON_TOKEN_COUNT`
    Mouse(u8),
}

impl ModifierToken {
    fn bit(self) -> u16 {
        match self {
            Self::Alt => 1 << 0,
            Self::Ctrl => 1 << 1,
            Self::Meta => 1 << 2,
            Self::Shift => 1 << 3,
            Self::Mouse(index) => 1 << (4 + u16::from(index)),
        }
    }

    /// Parses a space separated token list such as `"ctrl mouse0"`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, OptionError> {
        s.split_whitespace().map(str::parse).collect()
    }
}

impl FromStr for ModifierToken {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "alt" => return Ok(Self::Alt),
            "ctrl" | "control" => return Ok(Self::Ctrl),
            "meta" => return Ok(Self::Meta),
            "shift" => return Ok(Self::Shift),
            _ => {}
        }

        lower
            .strip_prefix("mouse")
            .and_then(|index| index.parse::<u8>().ok())
            .filter(|index| *index < BUTTON_TOKEN_COUNT)
            .map(Self::Mouse)
            .ok_or_else(|| OptionError::UnknownModifier(s.to_string()))
    }
}

impl fmt::Display for ModifierToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alt => f.write_str("alt"),
            Self::Ctrl => f.write_str("ctrl"),
            Self::Meta => f.write_str("meta"),
            Self::Shift => f.write_str("shift"),
            Self::Mouse(index) => write!(f, "mouse{index}"),
        }
    }
}

impl Serialize for ModifierToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The canonical set of held modifier keys and pressed buttons for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActiveModifierSet {
    bits: u16,
}

impl ActiveModifierSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: ModifierToken) {
        self.bits |= token.bit();
    }

    pub fn contains(&self, token: ModifierToken) -> bool {
        self.bits & token.bit() != 0
    }

    /// True when every token in `tokens` is present. Vacuously true for an
    /// empty slice.
    pub fn contains_all(&self, tokens: &[ModifierToken]) -> bool {
        tokens.iter().all(|token| self.contains(*token))
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Tokens in the set, keys first, then buttons in index order.
    pub fn iter(&self) -> impl Iterator<Item = ModifierToken> + '_ {
        [
            ModifierToken::Alt,
            ModifierToken::Ctrl,
            ModifierToken::Meta,
            ModifierToken::Shift,
        ]
        .into_iter()
        .chain((0..BUTTON_TOKEN_COUNT).map(ModifierToken::Mouse))
        .filter(move |token| self.contains(*token))
    }
}

impl FromIterator<ModifierToken> for ActiveModifierSet {
    fn from_iter<I: IntoIterator<Item = ModifierToken>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

impl Serialize for ActiveModifierSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Builds the canonical modifier set for an event.
///
/// `buttons` is the pressed-buttons bitmask; bit `n` maps to `mouse{n}`.
/// Bits above the last button token are ignored.
pub fn classify(modifiers: &KeyModifiers, buttons: u16) -> ActiveModifierSet {
    let mut set: ActiveModifierSet = modifiers.tokens().into_iter().collect();

    let mut remaining = buttons;
    for index in 0..BUTTON_TOKEN_COUNT {
        if remaining == 0 {
            break;
        }
        let bit = 1 << index;
        if remaining & bit != 0 {
            set.insert(ModifierToken::Mouse(index));
            remaining &= !bit;
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty() {
        assert!(classify(&KeyModifiers::new(), 0).is_empty());
    }

    #[test]
    fn test_classify_keys_and_buttons() {
        let modifiers = KeyModifiers {
            shift: true,
            meta: true,
            ..KeyModifiers::default()
        };
        let set = classify(&modifiers, 0b101);

        let tokens: Vec<_> = set.iter().collect();
        assert_eq!(
            tokens,
            vec![
                ModifierToken::Meta,
                ModifierToken::Shift,
                ModifierToken::Mouse(0),
                ModifierToken::Mouse(2),
            ]
        );
    }

    #[test]
    fn test_classify_ignores_high_buttons() {
        let set = classify(&KeyModifiers::new(), 1 << 5 | 1 << 9);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![ModifierToken::Mouse(5)]);
    }

    #[test]
    fn test_token_parse() {
        assert_eq!("Shift".parse(), Ok(ModifierToken::Shift));
        assert_eq!("control".parse(), Ok(ModifierToken::Ctrl));
        assert_eq!("mouse3".parse(), Ok(ModifierToken::Mouse(3)));
        assert!("mouse6".parse::<ModifierToken>().is_err());
        assert!("hyper".parse::<ModifierToken>().is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ModifierToken::parse_list("  ctrl   mouse0 "),
            Ok(vec![ModifierToken::Ctrl, ModifierToken::Mouse(0)])
        );
        assert_eq!(ModifierToken::parse_list(""), Ok(vec![]));
        assert_eq!(
            ModifierToken::parse_list("ctrl bogus"),
            Err(OptionError::UnknownModifier("bogus".to_string()))
        );
    }

    #[test]
    fn test_contains_all_is_vacuous_for_empty() {
        let set = ActiveModifierSet::new();
        assert!(set.contains_all(&[]));
        assert!(!set.contains_all(&[ModifierToken::Alt]));
    }

    #[test]
    fn test_set_serializes_as_token_list() {
        let set: ActiveModifierSet = [ModifierToken::Mouse(1), ModifierToken::Ctrl]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["ctrl","mouse1"]"#);
    }
}
