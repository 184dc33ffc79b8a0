//! Native selection capture, restore and change attribution.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;
use tokio::time::{Duration, Instant};

use crate::scan::source::{RangeHandle, SelectionHost};

/// Host selection ranges captured before the scanner replaced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRestoreInfo {
    pub ranges: Vec<RangeHandle>,
}

impl SelectionRestoreInfo {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Tracks which selection changes the scanner caused itself.
pub struct SelectionCoordinator {
    host: Rc<dyn SelectionHost>,
    restore_info: RefCell<Option<SelectionRestoreInfo>>,
    programmatic_until: Cell<Option<Instant>>,
    bracket: Cell<Duration>,
    user_has_not_selected_manually: Cell<bool>,
}

impl SelectionCoordinator {
    pub fn new(host: Rc<dyn SelectionHost>, bracket: Duration) -> Self {
        Self {
            host,
            restore_info: RefCell::new(None),
            programmatic_until: Cell::new(None),
            bracket: Cell::new(bracket),
            user_has_not_selected_manually: Cell::new(true),
        }
    }

    pub fn host(&self) -> &Rc<dyn SelectionHost> {
        &self.host
    }

    pub fn set_bracket(&self, bracket: Duration) {
        self.bracket.set(bracket);
    }

    pub fn capture(&self) -> SelectionRestoreInfo {
        SelectionRestoreInfo {
            ranges: self.host.ranges(),
        }
    }

    /// Puts `info` back as the host selection. Empty info is a no-op.
    pub fn restore(&self, info: &SelectionRestoreInfo) {
        if info.is_empty() {
            return;
        }
        self.begin_programmatic();
        self.host.remove_all();
        self.host.set_ranges(&info.ranges);
    }

    /// Captures the host selection for a later [`Self::restore_captured`].
    pub fn remember(&self) {
        let info = self.capture();
        debug!("Captured {} selection range(s)", info.ranges.len());
        self.restore_info.replace(Some(info));
    }

    /// Restores the remembered selection, at most once.
    pub fn restore_captured(&self) {
        let info = self.restore_info.borrow_mut().take();
        if let Some(info) = info {
            self.restore(&info);
        }
    }

    pub fn discard_captured(&self) {
        self.restore_info.replace(None);
    }

    pub fn has_captured(&self) -> bool {
        self.restore_info.borrow().is_some()
    }

    /// Marks the next selection change (within the bracket) as caused by the
    /// scanner.
    pub fn begin_programmatic(&self) {
        self.programmatic_until
            .set(Some(Instant::now() + self.bracket.get()));
    }

    pub fn is_programmatic_change(&self) -> bool {
        self.programmatic_until
            .get()
            .is_some_and(|until| Instant::now() < until)
    }

    /// Records a host selection change. Returns `false` when the change was
    /// attributed to the scanner, which consumes the bracket.
    pub fn note_change(&self, collapsed: bool) -> bool {
        if self.is_programmatic_change() {
            self.programmatic_until.set(None);
            return false;
        }
        self.programmatic_until.set(None);
        self.user_has_not_selected_manually.set(collapsed);
        true
    }

    pub fn user_has_not_selected_manually(&self) -> bool {
        self.user_has_not_selected_manually.get()
    }

    pub fn set_user_has_not_selected_manually(&self, value: bool) {
        self.user_has_not_selected_manually.set(value);
    }
}
