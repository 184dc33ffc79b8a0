//! Scan coordination.
//!
//! This module turns raw input events into at most one lookup at a time:
//! - Input bindings picked per event (see [`crate::input`])
//! - Mouse hover with debounce, click and modifier-key scanning
//! - Touch press/tap/release/move scanning with scroll prevention
//! - Pen hover/press/move/release scanning
//! - Host selection capture, restore and change attribution
//! - Sentence extraction around each match
//!
//! Outcomes are delivered as [`ScanEvent`]s on the channel returned by
//! [`TextScanner::new`].

pub mod gate;
pub mod gesture;
pub mod listeners;
pub mod options;
pub mod selection;
pub mod source;
pub mod types;

mod mouse;
mod pen;
mod scanner;
mod touch;
#[cfg(test)]
mod tests;

pub use listeners::{Handler, ListenerPlan, ListenerStrategy};
pub use options::ScanOptions;
pub use scanner::TextScanner;
pub use source::{
    Capabilities, IgnorePredicate, LookupService, RangeHandle, RangeOptions, ScanDependencies,
    SelectionHost, TextSource, TextSourceProvider,
};
pub use types::{
    ClearReason, DictionaryEntry, Disposition, InputInfo, LookupContext, LookupKind, LookupResult,
    MatchDetails, MatchType, ScanError, ScanEvent, SearchDetail,
};
