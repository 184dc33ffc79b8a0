//! Per-device gesture state.
//!
//! Pure state and transition rules. The handlers in `mouse.rs`, `touch.rs`
//! and `pen.rs` own the side effects.

use std::collections::HashMap;

use tokio::time::{Duration, Instant};

use crate::input::{DeviceClass, InputBehavior, MouseEvent};

/// Pen contact state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PenState {
    #[default]
    Idle,
    Hovering,
    Pressed,
    /// Lifted after a press; returns to `Idle` on the next pointer-out
    Released,
}

/// Pen event that may trigger a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenTrigger {
    Over,
    Down,
    Move,
    Up,
}

impl PenState {
    /// State after `trigger` is observed.
    pub fn after(self, trigger: PenTrigger) -> Self {
        match trigger {
            PenTrigger::Over => Self::Hovering,
            PenTrigger::Down => Self::Pressed,
            PenTrigger::Up => Self::Released,
            PenTrigger::Move => self,
        }
    }
}

/// Whether `behavior` asks for a scan on `trigger` while the pen is in
/// `state` (the state after the trigger was applied).
pub fn pen_scan_enabled(trigger: PenTrigger, state: PenState, behavior: &InputBehavior) -> bool {
    match trigger {
        PenTrigger::Down => behavior.scan_on_pen_press,
        PenTrigger::Up => behavior.scan_on_pen_release,
        PenTrigger::Over | PenTrigger::Move => match state {
            PenState::Hovering => behavior.scan_on_pen_hover,
            PenState::Pressed => behavior.scan_on_pen_move,
            PenState::Released => behavior.scan_on_pen_release_hover,
            PenState::Idle => false,
        },
    }
}

/// Single primary-touch tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchGesture {
    primary: Option<i64>,
    tap_valid: bool,
}

impl TouchGesture {
    pub fn primary(&self) -> Option<i64> {
        self.primary
    }

    pub fn is_tracking(&self) -> bool {
        self.primary.is_some()
    }

    /// Starts a fresh tap. The touch is not tracked until [`Self::track`].
    pub fn arm_tap(&mut self) {
        self.tap_valid = true;
    }

    pub fn track(&mut self, identifier: i64) {
        self.primary = Some(identifier);
    }

    pub fn invalidate_tap(&mut self) {
        self.tap_valid = false;
    }

    /// Stops tracking and returns whether the touch still counted as a tap.
    pub fn finish(&mut self) -> bool {
        let tap_valid = self.tap_valid;
        self.primary = None;
        self.tap_valid = false;
        tap_valid
    }
}

/// Host default actions to suppress on the next matching event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prevention {
    pub scroll: bool,
    pub context_menu: bool,
    pub mouse_down: bool,
    pub click: bool,
}

impl Prevention {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Short window after a press during which a selection change is attributed
/// to the press itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickGuard {
    until: Option<Instant>,
}

impl ClickGuard {
    pub fn arm(&mut self, window: Duration) {
        self.until = Some(Instant::now() + window);
    }

    pub fn is_active(&self) -> bool {
        self.until.is_some_and(|until| Instant::now() < until)
    }

    pub fn disarm(&mut self) {
        self.until = None;
    }
}

/// All gesture state owned by one scanner.
#[derive(Debug, Default)]
pub struct GestureState {
    pub pen: PenState,
    pub touch: TouchGesture,
    pub prevent: Prevention,
    pub prevent_next_click_scan: bool,
    pub click_guard: ClickGuard,
    /// Device class first reported for each live pointer id
    pub pointer_types: HashMap<u32, DeviceClass>,
    pub last_mouse_move: Option<MouseEvent>,
}

impl GestureState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clears the prevention flags and arms a new click guard.
    pub fn reset_prevent_next_click_scan(&mut self, window: Duration) {
        self.prevent_next_click_scan = false;
        self.click_guard.arm(window);
    }

    /// Device class for a pointer event, preferring what was recorded on
    /// pointer-over over the event's own report.
    pub fn pointer_type(&self, pointer_id: u32, reported: DeviceClass) -> DeviceClass {
        self.pointer_types
            .get(&pointer_id)
            .copied()
            .unwrap_or(reported)
    }
}
