//! Input normalization and binding selection.
//!
//! This module turns raw host events into a canonical modifier set and picks
//! the configured input binding (if any) that applies to the event. The
//! gesture state machines that decide *when* a lookup fires live in
//! [`crate::scan`].

pub mod events;
pub mod modifiers;
pub mod rules;

// Re-export commonly used types at module level
pub use events::{
    DeviceClass, EventKind, GesturePhase, InputEvent, MouseButton, MouseEvent, PointerEvent,
    TouchEvent, TouchPoint,
};
pub use modifiers::{ActiveModifierSet, KeyModifiers, ModifierToken, classify};
pub use rules::{DeviceSet, InputBehavior, InputConfig, InputMatch, match_input};
