//! Host-neutral input event types.
//!
//! Backends (a browser bridge, a toolkit, the replay script) map their native
//! events to these types before handing them to the scanner.

use super::modifiers::KeyModifiers;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Category of pointing hardware that generated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    Mouse,
    Touch,
    Pen,
}

/// Named point in a device's interaction lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GesturePhase {
    MouseMove,
    Click,
    TouchStart,
    TouchMove,
    TouchEnd,
    PointerOver,
    PointerDown,
    PointerMove,
    PointerUp,
    /// Programmatic search, no gesture involved
    Script,
}

/// Mouse button identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary (usually left) button
    Left,
    /// Middle button / wheel press
    Middle,
    /// Secondary (usually right) button
    Right,
    /// Any other button by index
    Other(u8),
}

impl MouseButton {
    /// Maps a DOM-style button index to a button.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            other => Self::Other(other),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A mouse event in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MouseEvent {
    pub x: f64,
    pub y: f64,
    /// Button that changed state (DOM `button` index)
    #[serde(default)]
    pub button: u8,
    /// Bitmask of all currently pressed buttons (DOM `buttons`)
    #[serde(default)]
    pub buttons: u16,
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

impl MouseEvent {
    /// A plain move or hover at (`x`, `y`) with nothing held.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn mouse_button(&self) -> MouseButton {
        MouseButton::from_index(self.button)
    }
}

/// One contact point of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TouchPoint {
    pub identifier: i64,
    pub x: f64,
    pub y: f64,
}

/// A touch event. `touches` holds the changed touches only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TouchEvent {
    pub touches: Vec<TouchPoint>,
    /// Whether the host still allows the default action to be prevented
    #[serde(default = "default_true")]
    pub cancelable: bool,
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

impl TouchEvent {
    /// A cancelable single-contact event.
    pub fn single(identifier: i64, x: f64, y: f64) -> Self {
        Self {
            touches: vec![TouchPoint { identifier, x, y }],
            cancelable: true,
            modifiers: KeyModifiers::default(),
        }
    }

    pub fn find(&self, identifier: i64) -> Option<&TouchPoint> {
        self.touches.iter().find(|touch| touch.identifier == identifier)
    }
}

/// A unified pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PointerEvent {
    pub pointer_id: u32,
    /// Device class as reported by the host, which may be wrong for pens
    pub pointer_type: DeviceClass,
    #[serde(default = "default_true")]
    pub is_primary: bool,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub button: u8,
    #[serde(default)]
    pub buttons: u16,
    #[serde(default = "default_true")]
    pub cancelable: bool,
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

impl PointerEvent {
    /// A primary, cancelable pointer event with nothing held.
    pub fn new(pointer_id: u32, pointer_type: DeviceClass, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            pointer_type,
            is_primary: true,
            x,
            y,
            button: 0,
            buttons: 0,
            cancelable: true,
            modifiers: KeyModifiers::default(),
        }
    }

    /// Same event with the given pressed-buttons mask.
    pub fn with_buttons(mut self, buttons: u16) -> Self {
        self.buttons = buttons;
        self
    }

    /// Converts to the equivalent mouse event.
    pub fn as_mouse(&self) -> MouseEvent {
        MouseEvent {
            x: self.x,
            y: self.y,
            button: self.button,
            buttons: self.buttons,
            modifiers: self.modifiers,
        }
    }
}

/// Kind of a raw host event, used to key the listener table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    MouseDown,
    MouseMove,
    MouseOver,
    MouseOut,
    Click,
    AuxClick,
    ContextMenu,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    PointerOver,
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    PointerOut,
    SelectionChange,
    KeyDown,
}

/// Any raw host event the scanner can consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputEvent {
    MouseDown(MouseEvent),
    MouseMove(MouseEvent),
    MouseOver(MouseEvent),
    MouseOut(MouseEvent),
    Click(MouseEvent),
    AuxClick(MouseEvent),
    ContextMenu(MouseEvent),
    TouchStart(TouchEvent),
    TouchMove(TouchEvent),
    TouchEnd(TouchEvent),
    TouchCancel(TouchEvent),
    PointerOver(PointerEvent),
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    PointerCancel(PointerEvent),
    PointerOut(PointerEvent),
    /// The host's text selection changed
    SelectionChange {
        /// Whether the selection is now empty
        collapsed: bool,
    },
    KeyDown {
        #[serde(default)]
        modifiers: KeyModifiers,
    },
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MouseDown(_) => EventKind::MouseDown,
            Self::MouseMove(_) => EventKind::MouseMove,
            Self::MouseOver(_) => EventKind::MouseOver,
            Self::MouseOut(_) => EventKind::MouseOut,
            Self::Click(_) => EventKind::Click,
            Self::AuxClick(_) => EventKind::AuxClick,
            Self::ContextMenu(_) => EventKind::ContextMenu,
            Self::TouchStart(_) => EventKind::TouchStart,
            Self::TouchMove(_) => EventKind::TouchMove,
            Self::TouchEnd(_) => EventKind::TouchEnd,
            Self::TouchCancel(_) => EventKind::TouchCancel,
            Self::PointerOver(_) => EventKind::PointerOver,
            Self::PointerDown(_) => EventKind::PointerDown,
            Self::PointerMove(_) => EventKind::PointerMove,
            Self::PointerUp(_) => EventKind::PointerUp,
            Self::PointerCancel(_) => EventKind::PointerCancel,
            Self::PointerOut(_) => EventKind::PointerOut,
            Self::SelectionChange { .. } => EventKind::SelectionChange,
            Self::KeyDown { .. } => EventKind::KeyDown,
        }
    }
}
