//! Listener plan: which host events the scanner consumes, and how.
//!
//! The plan is chosen once when scanning is enabled (and again when an option
//! that affects it changes). Hosts subscribe to exactly the listed event kinds
//! and forward them to [`crate::scan::TextScanner::dispatch`].

use crate::input::EventKind;

/// Handler a host event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    MouseDown,
    MouseMove,
    MouseOut,
    Click,
    AuxClick,
    ContextMenu,
    TouchStart,
    TouchEnd,
    TouchCancel,
    TouchMove,
    /// Pointer mode: only blocks scrolling while a touch scan holds it
    TouchMovePreventScroll,
    PointerOver,
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    PointerOut,
    SelectionChange,
    KeyDown,
}

/// Listening strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStrategy {
    /// Mouse clicks only, no hover scanning
    ClickOnly,
    /// Unified pointer events
    Pointer,
    /// Separate mouse listeners, plus touch listeners when enabled
    MouseAndTouch { touch: bool },
}

impl ListenerStrategy {
    pub fn select(search_on_click_only: bool, pointer_events: bool, touch_input: bool) -> Self {
        if search_on_click_only {
            Self::ClickOnly
        } else if pointer_events {
            Self::Pointer
        } else {
            Self::MouseAndTouch { touch: touch_input }
        }
    }
}

/// Fixed list of `(event kind, handler)` registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerPlan {
    registrations: Vec<(EventKind, Handler)>,
}

impl ListenerPlan {
    pub fn build(strategy: ListenerStrategy) -> Self {
        let mut registrations = match strategy {
            ListenerStrategy::ClickOnly => vec![
                (EventKind::MouseDown, Handler::MouseDown),
                (EventKind::Click, Handler::Click),
                (EventKind::AuxClick, Handler::AuxClick),
            ],
            ListenerStrategy::Pointer => vec![
                (EventKind::PointerOver, Handler::PointerOver),
                (EventKind::PointerDown, Handler::PointerDown),
                (EventKind::PointerMove, Handler::PointerMove),
                (EventKind::PointerUp, Handler::PointerUp),
                (EventKind::PointerCancel, Handler::PointerCancel),
                (EventKind::PointerOut, Handler::PointerOut),
                (EventKind::TouchMove, Handler::TouchMovePreventScroll),
                (EventKind::MouseDown, Handler::MouseDown),
                (EventKind::Click, Handler::Click),
                (EventKind::AuxClick, Handler::AuxClick),
                (EventKind::ContextMenu, Handler::ContextMenu),
                (EventKind::KeyDown, Handler::KeyDown),
            ],
            ListenerStrategy::MouseAndTouch { touch } => {
                let mut registrations = vec![
                    (EventKind::MouseDown, Handler::MouseDown),
                    (EventKind::MouseMove, Handler::MouseMove),
                    (EventKind::MouseOut, Handler::MouseOut),
                    (EventKind::Click, Handler::Click),
                    (EventKind::AuxClick, Handler::AuxClick),
                    (EventKind::KeyDown, Handler::KeyDown),
                ];
                if touch {
                    registrations.extend([
                        (EventKind::TouchStart, Handler::TouchStart),
                        (EventKind::TouchEnd, Handler::TouchEnd),
                        (EventKind::TouchCancel, Handler::TouchCancel),
                        (EventKind::TouchMove, Handler::TouchMove),
                        (EventKind::ContextMenu, Handler::ContextMenu),
                    ]);
                }
                registrations
            }
        };
        registrations.push((EventKind::SelectionChange, Handler::SelectionChange));

        Self { registrations }
    }

    pub fn handler_for(&self, kind: EventKind) -> Option<Handler> {
        self.registrations
            .iter()
            .find(|(registered, _)| *registered == kind)
            .map(|(_, handler)| *handler)
    }

    pub fn registrations(&self) -> &[(EventKind, Handler)] {
        &self.registrations
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
