//! Library exports for the textscanner engine.
//!
//! Exposes the scan coordinator together with its configuration, input
//! normalization and sentence extraction so that hosts (and the replay
//! binary) can drive lookups from raw pointer, touch and pen events.

pub mod config;
pub mod input;
pub mod replay;
pub mod scan;
pub mod sentence;

pub use config::Config;
pub use scan::TextScanner;
