//! Collaborator interfaces consumed by the scanner.
//!
//! Hosts implement these to expose their rendered content, their dictionary
//! and their native selection. Everything is single-threaded: trait objects
//! are shared through `Rc` and the lookup future is `?Send`.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;

use crate::scan::types::{LookupContext, LookupResult, MatchDetails, ScanError};

/// A span of host text.
///
/// Offsets and lengths are in characters.
pub trait TextSource: fmt::Debug {
    /// Independent copy of this span.
    fn clone_source(&self) -> Box<dyn TextSource>;

    fn text(&self) -> String;

    /// Moves the start backward by up to `length` characters and returns how
    /// far it actually moved.
    fn set_start_offset(&mut self, length: usize, layout_aware: bool) -> usize;

    /// Repositions the end of the span.
    ///
    /// With `from_end` unset the end is placed `length` characters after the
    /// start and the resulting span length is returned. With `from_end` set the
    /// current end is pushed forward by up to `length` characters and the
    /// distance moved is returned.
    fn set_end_offset(&mut self, length: usize, from_end: bool, layout_aware: bool) -> usize;

    /// Makes this span the host selection.
    fn select(&self) -> Result<(), ScanError>;

    fn deselect(&self) -> Result<(), ScanError>;

    /// Whether both spans start at the same host position.
    fn has_same_start(&self, other: &dyn TextSource) -> bool;

    /// Tag names of the host nodes the span touches.
    fn nodes_in_range(&self) -> Vec<String>;

    fn as_any(&self) -> &dyn Any;
}

/// Options for [`TextSourceProvider::range_from_point`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeOptions {
    pub deep_content_scan: bool,
    pub normalize_zoom: bool,
    pub scan_alt_text: bool,
}

/// Hit-tests host content.
pub trait TextSourceProvider {
    /// Returns the collapsed span at (`x`, `y`), or `None` when there is no
    /// text under the point.
    fn range_from_point(
        &self,
        x: f64,
        y: f64,
        options: &RangeOptions,
    ) -> Result<Option<Box<dyn TextSource>>, ScanError>;
}

/// Dictionary search.
#[async_trait(?Send)]
pub trait LookupService {
    async fn find(
        &self,
        text: &str,
        details: &MatchDetails,
        context: &LookupContext,
    ) -> Result<LookupResult, ScanError>;
}

/// Host veto on scanning at a point (for example over the host's own popup).
pub trait IgnorePredicate {
    fn ignore(&self, x: f64, y: f64) -> bool;
}

/// Opaque handle to one range of the host selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeHandle(pub u64);

/// The host's native text selection.
pub trait SelectionHost {
    /// Current ranges, in selection order.
    fn ranges(&self) -> Vec<RangeHandle>;

    fn set_ranges(&self, ranges: &[RangeHandle]);

    fn remove_all(&self);

    /// Whether (`x`, `y`) lies inside the current selection.
    fn contains_point(&self, x: f64, y: f64) -> bool;
}

/// Host capabilities detected once by the embedder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The host reports coordinates affected by CSS zoom
    pub css_zoom_supported: bool,
}

/// Bundle of collaborators used by the scanner. Each one can be mocked in tests.
#[derive(Clone)]
pub struct ScanDependencies {
    pub provider: Rc<dyn TextSourceProvider>,
    pub lookup: Rc<dyn LookupService>,
    pub selection: Rc<dyn SelectionHost>,
    pub ignore: Option<Rc<dyn IgnorePredicate>>,
    pub capabilities: Capabilities,
}

impl ScanDependencies {
    pub fn new(
        provider: Rc<dyn TextSourceProvider>,
        lookup: Rc<dyn LookupService>,
        selection: Rc<dyn SelectionHost>,
    ) -> Self {
        Self {
            provider,
            lookup,
            selection,
            ignore: None,
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_ignore(mut self, ignore: Rc<dyn IgnorePredicate>) -> Self {
        self.ignore = Some(ignore);
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}
