//! Pointer event routing and the pen handlers.

use log::debug;

use crate::input::{DeviceClass, GesturePhase, PointerEvent};
use crate::scan::gesture::{PenState, PenTrigger, pen_scan_enabled};
use crate::scan::scanner::TextScanner;
use crate::scan::types::Disposition;

impl TextScanner {
    pub fn on_pointer_over(&self, event: &PointerEvent) -> Disposition {
        self.inner
            .gesture
            .borrow_mut()
            .pointer_types
            .insert(event.pointer_id, event.pointer_type);
        if !event.is_primary {
            return Disposition::Propagate;
        }
        match self.pointer_type(event) {
            DeviceClass::Mouse | DeviceClass::Touch => Disposition::Propagate,
            DeviceClass::Pen => self.on_pen_pointer_over(event),
        }
    }

    pub fn on_pointer_down(&self, event: &PointerEvent) -> Disposition {
        if !event.is_primary {
            return Disposition::Propagate;
        }
        match self.pointer_type(event) {
            // The mouse-down listener handles mouse presses.
            DeviceClass::Mouse => Disposition::Propagate,
            DeviceClass::Touch => self.on_touch_pointer_down(event),
            DeviceClass::Pen => self.on_pen_pointer_down(event),
        }
    }

    pub fn on_pointer_move(&self, event: &PointerEvent) -> Disposition {
        if !event.is_primary {
            return Disposition::Propagate;
        }
        match self.pointer_type(event) {
            DeviceClass::Mouse => self.on_mouse_move(&event.as_mouse()),
            DeviceClass::Touch => self.on_touch_pointer_move(event),
            DeviceClass::Pen => self.on_pen_pointer_move(event),
        }
    }

    pub fn on_pointer_up(&self, event: &PointerEvent) -> Disposition {
        if !event.is_primary {
            return Disposition::Propagate;
        }
        match self.pointer_type(event) {
            DeviceClass::Mouse => Disposition::Propagate,
            DeviceClass::Touch => self.on_touch_pointer_up(event),
            DeviceClass::Pen => self.on_pen_pointer_up(event),
        }
    }

    pub fn on_pointer_cancel(&self, event: &PointerEvent) -> Disposition {
        self.on_pointer_leave(event)
    }

    pub fn on_pointer_out(&self, event: &PointerEvent) -> Disposition {
        let disposition = self.on_pointer_leave(event);
        self.inner
            .gesture
            .borrow_mut()
            .pointer_types
            .remove(&event.pointer_id);
        disposition
    }

    fn on_pointer_leave(&self, event: &PointerEvent) -> Disposition {
        if !event.is_primary {
            return Disposition::Propagate;
        }
        match self.pointer_type(event) {
            DeviceClass::Mouse => self.on_mouse_out(),
            DeviceClass::Touch => self.on_touch_pointer_leave(event),
            DeviceClass::Pen => {
                let mut gesture = self.inner.gesture.borrow_mut();
                gesture.pen = PenState::Idle;
                gesture.prevent.reset();
                Disposition::Propagate
            }
        }
    }

    fn pointer_type(&self, event: &PointerEvent) -> DeviceClass {
        self.inner
            .gesture
            .borrow()
            .pointer_type(event.pointer_id, event.pointer_type)
    }

    fn on_pen_pointer_over(&self, event: &PointerEvent) -> Disposition {
        {
            let mut gesture = self.inner.gesture.borrow_mut();
            gesture.pen = gesture.pen.after(PenTrigger::Over);
            gesture.prevent.reset();
        }
        self.scan_from_pen(event, PenTrigger::Over);
        Disposition::Propagate
    }

    fn on_pen_pointer_down(&self, event: &PointerEvent) -> Disposition {
        {
            let mut gesture = self.inner.gesture.borrow_mut();
            gesture.pen = gesture.pen.after(PenTrigger::Down);
        }
        self.scan_from_pen(event, PenTrigger::Down);
        Disposition::Propagate
    }

    fn on_pen_pointer_move(&self, event: &PointerEvent) -> Disposition {
        {
            let gesture = self.inner.gesture.borrow();
            if gesture.pen == PenState::Pressed && (!gesture.prevent.scroll || !event.cancelable) {
                return Disposition::Propagate;
            }
        }
        self.scan_from_pen(event, PenTrigger::Move);
        Disposition::Propagate
    }

    fn on_pen_pointer_up(&self, event: &PointerEvent) -> Disposition {
        {
            let mut gesture = self.inner.gesture.borrow_mut();
            gesture.pen = gesture.pen.after(PenTrigger::Up);
            gesture.prevent.scroll = false;
        }
        self.scan_from_pen(event, PenTrigger::Up);
        Disposition::Propagate
    }

    fn scan_from_pen(&self, event: &PointerEvent, trigger: PenTrigger) {
        if self.inner.gate.is_in_flight() {
            debug!("Lookup in flight, ignoring pen {:?}", trigger);
            return;
        }

        let phase = match trigger {
            PenTrigger::Over => GesturePhase::PointerOver,
            PenTrigger::Down => GesturePhase::PointerDown,
            PenTrigger::Move => GesturePhase::PointerMove,
            PenTrigger::Up => GesturePhase::PointerUp,
        };
        let Some(info) =
            self.match_input_info(DeviceClass::Pen, phase, &event.modifiers, event.buttons)
        else {
            return;
        };

        let state = self.inner.gesture.borrow().pen;
        let behavior = info.behavior();
        if !pen_scan_enabled(trigger, state, &behavior) {
            return;
        }

        // Over and up scans leave the host's follow-up events alone.
        if !matches!(trigger, PenTrigger::Down | PenTrigger::Move) {
            self.scan_at(event.x, event.y, info);
            return;
        }

        let prevent_scrolling = behavior.prevent_pen_scrolling;
        let scanner = self.clone();
        let (x, y) = (event.x, event.y);
        self.spawn_scan(async move {
            scanner.search_at(x, y, info).await;
            if scanner.has_selection() {
                let mut gesture = scanner.inner.gesture.borrow_mut();
                gesture.prevent.scroll = prevent_scrolling;
                gesture.prevent.context_menu = true;
                gesture.prevent.mouse_down = true;
                gesture.prevent.click = true;
            }
        });
    }
}
