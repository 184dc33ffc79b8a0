//! Touch handlers, for both touch events and touch-type pointer events.

use log::debug;

use crate::input::{DeviceClass, GesturePhase, KeyModifiers, PointerEvent, TouchEvent};
use crate::scan::scanner::TextScanner;
use crate::scan::types::Disposition;

impl TextScanner {
    pub fn on_touch_start(&self, event: &TouchEvent) -> Disposition {
        let Some(touch) = event.touches.first() else {
            return Disposition::Propagate;
        };
        self.primary_touch_start(touch.identifier, touch.x, touch.y, &event.modifiers)
    }

    pub fn on_touch_end(&self, event: &TouchEvent) -> Disposition {
        let Some(primary) = self.inner.gesture.borrow().touch.primary() else {
            return Disposition::Propagate;
        };
        let Some(touch) = event.find(primary) else {
            return Disposition::Propagate;
        };
        self.primary_touch_end(touch.x, touch.y, &event.modifiers, true);
        Disposition::Propagate
    }

    pub fn on_touch_cancel(&self, event: &TouchEvent) -> Disposition {
        let Some(primary) = self.inner.gesture.borrow().touch.primary() else {
            return Disposition::Propagate;
        };
        if event.find(primary).is_some() {
            self.primary_touch_end(0.0, 0.0, &event.modifiers, false);
        }
        Disposition::Propagate
    }

    pub fn on_touch_move(&self, event: &TouchEvent) -> Disposition {
        let primary = {
            let mut gesture = self.inner.gesture.borrow_mut();
            let Some(primary) = gesture.touch.primary() else {
                return Disposition::Propagate;
            };
            gesture.touch.invalidate_tap();
            primary
        };

        if !event.cancelable {
            self.primary_touch_end(0.0, 0.0, &event.modifiers, false);
            return Disposition::Propagate;
        }
        if !self.inner.gesture.borrow().prevent.scroll {
            return Disposition::Propagate;
        }
        let Some(touch) = event.find(primary) else {
            return Disposition::Propagate;
        };

        let Some(info) = self.match_input_info(
            DeviceClass::Touch,
            GesturePhase::TouchMove,
            &event.modifiers,
            0,
        ) else {
            return Disposition::Propagate;
        };
        if info.behavior().scan_on_touch_move {
            self.scan_at(touch.x, touch.y, info);
        }
        Disposition::PreventDefault
    }

    /// Pointer mode keeps a plain touch-move listener only to block scrolling.
    pub fn on_touch_move_prevent_scroll(&self, event: &TouchEvent) -> Disposition {
        let mut gesture = self.inner.gesture.borrow_mut();
        if !gesture.prevent.scroll {
            return Disposition::Propagate;
        }
        if event.cancelable {
            return Disposition::PreventDefault;
        }
        gesture.prevent.scroll = false;
        Disposition::Propagate
    }

    pub(crate) fn on_touch_pointer_down(&self, event: &PointerEvent) -> Disposition {
        self.primary_touch_start(
            i64::from(event.pointer_id),
            event.x,
            event.y,
            &event.modifiers,
        )
    }

    pub(crate) fn on_touch_pointer_move(&self, event: &PointerEvent) -> Disposition {
        let prevent_scroll = {
            let mut gesture = self.inner.gesture.borrow_mut();
            if gesture.touch.primary() != Some(i64::from(event.pointer_id)) {
                return Disposition::Propagate;
            }
            gesture.touch.invalidate_tap();
            gesture.prevent.scroll
        };
        if !prevent_scroll || !event.cancelable {
            return Disposition::Propagate;
        }

        let Some(info) = self.match_input_info(
            DeviceClass::Touch,
            GesturePhase::TouchMove,
            &event.modifiers,
            event.buttons,
        ) else {
            return Disposition::Propagate;
        };
        if info.behavior().scan_on_touch_move {
            self.scan_at(event.x, event.y, info);
        }
        Disposition::Propagate
    }

    pub(crate) fn on_touch_pointer_up(&self, event: &PointerEvent) -> Disposition {
        if self.inner.gesture.borrow().touch.primary() == Some(i64::from(event.pointer_id)) {
            self.primary_touch_end(event.x, event.y, &event.modifiers, true);
        }
        Disposition::Propagate
    }

    pub(crate) fn on_touch_pointer_leave(&self, event: &PointerEvent) -> Disposition {
        if self.inner.gesture.borrow().touch.primary() == Some(i64::from(event.pointer_id)) {
            self.primary_touch_end(event.x, event.y, &event.modifiers, false);
        }
        Disposition::Propagate
    }

    fn primary_touch_start(
        &self,
        identifier: i64,
        x: f64,
        y: f64,
        modifiers: &KeyModifiers,
    ) -> Disposition {
        {
            let window = self.inner.options.borrow().click_guard;
            let mut gesture = self.inner.gesture.borrow_mut();
            if gesture.touch.is_tracking() {
                return Disposition::Propagate;
            }
            gesture.prevent.reset();
            gesture.touch.arm_tap();
            gesture.reset_prevent_next_click_scan(window);
        }

        if self.inner.selection.host().contains_point(x, y) {
            debug!("Touch inside the host selection, not tracking it");
            return Disposition::Propagate;
        }
        self.inner.gesture.borrow_mut().touch.track(identifier);

        if self.inner.gate.is_in_flight() {
            return Disposition::Propagate;
        }

        let Some(info) =
            self.match_input_info(DeviceClass::Touch, GesturePhase::TouchStart, modifiers, 0)
        else {
            return Disposition::Propagate;
        };
        if !info.behavior().scan_on_touch_press {
            return Disposition::Propagate;
        }

        let prevent_scrolling = info.behavior().prevent_touch_scrolling;
        let previous = self.get_current_text_source();
        let scanner = self.clone();
        self.spawn_scan(async move {
            scanner.search_at(x, y, info).await;

            let current = scanner.get_current_text_source();
            let Some(current) = current else {
                return;
            };
            let unchanged = previous
                .as_ref()
                .is_some_and(|previous| current.has_same_start(previous.as_ref()));
            if !unchanged {
                let mut gesture = scanner.inner.gesture.borrow_mut();
                gesture.prevent.scroll = prevent_scrolling;
                gesture.prevent.context_menu = true;
                gesture.prevent.mouse_down = true;
            }
        });
        Disposition::Propagate
    }

    fn primary_touch_end(&self, x: f64, y: f64, modifiers: &KeyModifiers, allow_search: bool) {
        let tap_valid = {
            let mut gesture = self.inner.gesture.borrow_mut();
            gesture.prevent.scroll = false;
            gesture.prevent.click = false;
            gesture.touch.finish()
        };
        if !allow_search {
            return;
        }

        let Some(info) =
            self.match_input_info(DeviceClass::Touch, GesturePhase::TouchEnd, modifiers, 0)
        else {
            return;
        };
        let behavior = info.behavior();
        if behavior.scan_on_touch_release || (behavior.scan_on_touch_tap && tap_valid) {
            self.scan_at(x, y, info);
        }
    }
}
