//! Mouse, keyboard and selection-change handlers.

use log::debug;

use crate::input::{DeviceClass, GesturePhase, KeyModifiers, MouseButton, MouseEvent, classify};
use crate::scan::scanner::TextScanner;
use crate::scan::types::{ClearReason, Disposition, InputInfo, ScanEvent};

impl TextScanner {
    pub fn on_mouse_down(&self, event: &MouseEvent) -> Disposition {
        {
            let mut gesture = self.inner.gesture.borrow_mut();
            if gesture.prevent.mouse_down {
                gesture.prevent.mouse_down = false;
                gesture.prevent.click = true;
                return Disposition::PreventDefault;
            }
        }

        match event.mouse_button() {
            MouseButton::Left => {
                let window = self.inner.options.borrow().click_guard;
                self.inner
                    .gesture
                    .borrow_mut()
                    .reset_prevent_next_click_scan(window);
                self.inner.gate.clear();
                self.emit(ScanEvent::Clear {
                    reason: ClearReason::MouseDown,
                });
                Disposition::Propagate
            }
            MouseButton::Middle if self.inner.options.borrow().prevent_middle_mouse => {
                Disposition::PreventDefault
            }
            _ => Disposition::Propagate,
        }
    }

    pub fn on_mouse_move(&self, event: &MouseEvent) -> Disposition {
        self.inner.gate.clear();
        self.inner.gesture.borrow_mut().last_mouse_move = Some(*event);

        if self.inner.options.borrow().search_on_click_only {
            return Disposition::Propagate;
        }

        let Some(info) = self.match_input_info(
            DeviceClass::Mouse,
            GesturePhase::MouseMove,
            &event.modifiers,
            event.buttons,
        ) else {
            return Disposition::Propagate;
        };

        self.scan_from_mouse_move(event.x, event.y, info);
        Disposition::Propagate
    }

    /// Passive (fallback) matches wait out the hover delay first.
    fn scan_from_mouse_move(&self, x: f64, y: f64, info: InputInfo) {
        if self.inner.gate.is_in_flight() {
            debug!("Lookup in flight, ignoring mouse move");
            return;
        }
        if !info.is_fallback {
            self.scan_at(x, y, info);
            return;
        }

        let scanner = self.clone();
        let delay = self.inner.options.borrow().delay;
        self.spawn_scan(async move {
            if !scanner.inner.gate.wait(delay).await {
                return;
            }
            scanner.search_at(x, y, info).await;
        });
    }

    pub fn on_mouse_out(&self) -> Disposition {
        self.inner.gate.clear();
        Disposition::Propagate
    }

    pub fn on_click(&self, event: &MouseEvent) -> Disposition {
        {
            let mut gesture = self.inner.gesture.borrow_mut();
            if gesture.prevent.click {
                gesture.prevent.click = false;
                return Disposition::PreventDefault;
            }
        }

        let search_on_click = {
            let options = self.inner.options.borrow();
            options.search_on_click || options.search_on_click_only
        };
        if search_on_click && event.mouse_button() == MouseButton::Left {
            self.scan_from_click(event);
        }
        Disposition::Propagate
    }

    fn scan_from_click(&self, event: &MouseEvent) {
        let prevent_scan = {
            let mut gesture = self.inner.gesture.borrow_mut();
            gesture.click_guard.disarm();
            std::mem::take(&mut gesture.prevent_next_click_scan)
        };
        if prevent_scan {
            debug!("Selection changed since mouse down, not scanning click");
            return;
        }

        let info = InputInfo::unmatched(
            Some(DeviceClass::Mouse),
            GesturePhase::Click,
            event.modifiers,
            classify(&event.modifiers, event.buttons),
            None,
        );
        self.scan_at(event.x, event.y, info);
    }

    pub fn on_aux_click(&self, event: &MouseEvent) -> Disposition {
        self.inner.gesture.borrow_mut().prevent.context_menu = false;
        if event.mouse_button() == MouseButton::Middle
            && self.inner.options.borrow().prevent_middle_mouse
        {
            return Disposition::PreventDefault;
        }
        Disposition::Propagate
    }

    pub fn on_context_menu(&self) -> Disposition {
        let mut gesture = self.inner.gesture.borrow_mut();
        if gesture.prevent.context_menu {
            gesture.prevent.context_menu = false;
            return Disposition::PreventDefault;
        }
        Disposition::Propagate
    }

    /// Host selection changed. Changes racing a fresh press are ignored; later
    /// ones block the next click scan.
    pub fn on_selection_change(&self, collapsed: bool) -> Disposition {
        if !self.inner.selection.note_change(collapsed) {
            debug!("Ignoring selection change made by the scanner");
        }

        let mut gesture = self.inner.gesture.borrow_mut();
        if !gesture.click_guard.is_active() {
            gesture.prevent_next_click_scan = true;
        }
        Disposition::Propagate
    }

    /// Pressing a modifier re-scans at the last mouse position.
    pub fn on_key_down(&self, modifiers: &KeyModifiers) -> Disposition {
        if !modifiers.any() {
            return Disposition::Propagate;
        }
        let last = self.inner.gesture.borrow().last_mouse_move;
        if let Some(last) = last {
            let synthetic = MouseEvent {
                x: last.x,
                y: last.y,
                button: 0,
                buttons: 0,
                modifiers: *modifiers,
            };
            self.on_mouse_move(&synthetic);
        }
        Disposition::Propagate
    }
}
