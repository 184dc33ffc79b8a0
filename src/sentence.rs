//! Sentence boundary extraction.
//!
//! Widens a scanned span into the sentence that surrounds it. Two linear scans
//! walk outward from the span (the "anchor"): one to the left looking for the
//! sentence start, one to the right looking for its end. Quote characters are
//! tracked on a stack so that terminators inside a quoted clause do not end the
//! sentence early.

use serde::Serialize;
use std::collections::HashMap;

/// How a sentence terminator attaches to the sentences around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminatorInfo {
    /// Terminator belongs to the sentence that follows it (e.g. `¿`)
    pub include_at_start: bool,
    /// Terminator belongs to the sentence that precedes it (e.g. `.`)
    pub include_at_end: bool,
}

/// One side of a quote pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteInfo {
    /// The character that balances this one
    pub partner: char,
    /// Whether the quote character is kept when it bounds the sentence
    pub include: bool,
}

/// Compiled terminator and quote tables used by [`extract_sentence`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceRules {
    /// Maximum number of characters scanned in each direction
    pub extent: usize,
    /// Stop both scans at a bare `\n`, whatever the quote depth
    pub terminate_at_newlines: bool,
    /// Sentence terminators
    pub terminators: HashMap<char, TerminatorInfo>,
    /// Opening quotes, mapped to their closer
    pub forward_quotes: HashMap<char, QuoteInfo>,
    /// Closing quotes, mapped to their opener
    pub backward_quotes: HashMap<char, QuoteInfo>,
}

impl SentenceRules {
    /// Creates empty rules with the given scan extent.
    pub fn new(extent: usize, terminate_at_newlines: bool) -> Self {
        Self {
            extent,
            terminate_at_newlines,
            ..Self::default()
        }
    }

    /// Registers a single-character terminator.
    pub fn add_terminator(&mut self, c: char, include_at_start: bool, include_at_end: bool) {
        self.terminators.insert(
            c,
            TerminatorInfo {
                include_at_start,
                include_at_end,
            },
        );
    }

    /// Registers a quote pair.
    ///
    /// `include_at_start` keeps the opener when it bounds the sentence start,
    /// `include_at_end` keeps the closer when it bounds the sentence end.
    pub fn add_quote_pair(
        &mut self,
        open: char,
        close: char,
        include_at_start: bool,
        include_at_end: bool,
    ) {
        self.forward_quotes.insert(
            open,
            QuoteInfo {
                partner: close,
                include: include_at_start,
            },
        );
        self.backward_quotes.insert(
            close,
            QuoteInfo {
                partner: open,
                include: include_at_end,
            },
        );
    }

    fn terminator(&self, c: char) -> Option<TerminatorInfo> {
        self.terminators.get(&c).copied()
    }
}

/// A bounded text region with the scanned span marked inside it.
///
/// Positions are character (not byte) indices into `text`.
#[derive(Debug, Clone, Copy)]
pub struct TextWindow<'a> {
    text: &'a str,
    anchor_start: usize,
    anchor_end: usize,
}

impl<'a> TextWindow<'a> {
    /// Creates a window whose anchor spans `anchor_start..anchor_end`.
    ///
    /// Out-of-range anchors are clamped to the window.
    pub fn new(text: &'a str, anchor_start: usize, anchor_end: usize) -> Self {
        Self {
            text,
            anchor_start,
            anchor_end,
        }
    }

    /// Creates a window with an empty anchor at `position`.
    pub fn at(text: &'a str, position: usize) -> Self {
        Self::new(text, position, position)
    }
}

/// An extracted sentence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Sentence {
    /// Sentence text with surrounding whitespace trimmed
    pub text: String,
    /// Distance from the sentence start to the anchor start, so that
    /// `text[offset..]` begins with the scanned span
    pub offset: usize,
    /// Position of the sentence start within the window
    pub start: usize,
}

/// Extracts the sentence around the anchor of `window`.
///
/// Never fails: quotes still open when a scan reaches the extent limit are
/// abandoned, and a window that trims down to nothing yields an empty sentence.
pub fn extract_sentence(window: &TextWindow<'_>, rules: &SentenceRules) -> Sentence {
    let chars: Vec<char> = window.text.chars().collect();
    let anchor_end = window.anchor_end.min(chars.len());
    let anchor_start = window.anchor_start.min(anchor_end);

    let lower = anchor_start.saturating_sub(rules.extent);
    let upper = anchor_end.saturating_add(rules.extent).min(chars.len());

    let mut start = scan_backward(&chars, anchor_start, lower, rules);
    let mut end = scan_forward(&chars, anchor_end, upper, rules);

    while start < anchor_start && chars[start].is_whitespace() {
        start += 1;
    }
    while end > anchor_end && chars[end - 1].is_whitespace() {
        end -= 1;
    }

    Sentence {
        text: chars[start..end].iter().collect(),
        offset: anchor_start - start,
        start,
    }
}

fn scan_backward(chars: &[char], anchor: usize, lower: usize, rules: &SentenceRules) -> usize {
    let mut pos = anchor;
    let mut quotes: Vec<char> = Vec::new();

    while pos > lower {
        let c = chars[pos - 1];
        if c == '\n' && rules.terminate_at_newlines {
            break;
        }

        if quotes.is_empty() {
            if let Some(info) = rules.terminator(c) {
                if info.include_at_start {
                    pos -= 1;
                    while pos > lower
                        && rules
                            .terminator(chars[pos - 1])
                            .is_some_and(|t| t.include_at_start)
                    {
                        pos -= 1;
                    }
                }
                break;
            }
        }

        if let Some(info) = rules.forward_quotes.get(&c) {
            if quotes.is_empty() {
                if info.include {
                    pos -= 1;
                    while pos > lower
                        && rules
                            .forward_quotes
                            .get(&chars[pos - 1])
                            .is_some_and(|q| q.include)
                    {
                        pos -= 1;
                    }
                }
                break;
            }
            if quotes.last() == Some(&c) {
                quotes.pop();
                pos -= 1;
                continue;
            }
        }

        if let Some(info) = rules.backward_quotes.get(&c) {
            quotes.push(info.partner);
        }
        pos -= 1;
    }

    pos
}

fn scan_forward(chars: &[char], anchor: usize, upper: usize, rules: &SentenceRules) -> usize {
    let mut pos = anchor;
    let mut quotes: Vec<char> = Vec::new();

    while pos < upper {
        let c = chars[pos];
        if c == '\n' && rules.terminate_at_newlines {
            break;
        }

        if quotes.is_empty() {
            if let Some(info) = rules.terminator(c) {
                if info.include_at_end {
                    pos += 1;
                    while pos < upper
                        && rules
                            .terminator(chars[pos])
                            .is_some_and(|t| t.include_at_end)
                    {
                        pos += 1;
                    }
                }
                break;
            }
        }

        if let Some(info) = rules.backward_quotes.get(&c) {
            if quotes.is_empty() {
                if info.include {
                    pos += 1;
                    while pos < upper
                        && rules
                            .backward_quotes
                            .get(&chars[pos])
                            .is_some_and(|q| q.include)
                    {
                        pos += 1;
                    }
                }
                break;
            }
            if quotes.last() == Some(&c) {
                quotes.pop();
                pos += 1;
                continue;
            }
        }

        if let Some(info) = rules.forward_quotes.get(&c) {
            quotes.push(info.partner);
        }
        pos += 1;
    }

    pos
}
