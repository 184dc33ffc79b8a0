use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::LocalSet;
use tokio::time::{Duration, sleep};

use super::{
    ClearReason, DictionaryEntry, Disposition, IgnorePredicate, LookupContext, LookupKind,
    LookupResult, LookupService, MatchDetails, RangeOptions, ScanDependencies, ScanError,
    ScanEvent, SearchDetail, TextScanner, TextSource, TextSourceProvider,
};
use crate::config::{InputDefinition, MAX_SCAN_EXTENT, MAX_SCAN_LENGTH, ScanningConfig};
use crate::input::{
    DeviceClass, DeviceSet, EventKind, GesturePhase, InputBehavior, InputEvent, KeyModifiers,
    MouseEvent, PointerEvent, TouchEvent,
};
use crate::replay::{DocumentRange, PlainTextDocument, TagSpan, WordListDictionary};

const MOUSE: DeviceSet = DeviceSet {
    mouse: true,
    touch: false,
    pen: false,
};
const TOUCH: DeviceSet = DeviceSet {
    mouse: false,
    touch: true,
    pen: false,
};
const PEN: DeviceSet = DeviceSet {
    mouse: false,
    touch: false,
    pen: true,
};

struct MockLookup {
    terms: WordListDictionary,
    kanji: WordListDictionary,
    latency: Duration,
    fail: Cell<bool>,
    crash: Cell<bool>,
    calls: RefCell<Vec<(String, LookupKind)>>,
    active: Cell<usize>,
    max_active: Cell<usize>,
}

impl MockLookup {
    fn new(terms: &[&str], kanji: &[&str]) -> Self {
        Self {
            terms: WordListDictionary::new(terms.iter().map(|term| entry(term))),
            kanji: WordListDictionary::new(kanji.iter().map(|term| entry(term))),
            latency: Duration::ZERO,
            fail: Cell::new(false),
            crash: Cell::new(false),
            calls: RefCell::new(Vec::new()),
            active: Cell::new(0),
            max_active: Cell::new(0),
        }
    }

    fn call_texts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }
}

#[async_trait(?Send)]
impl LookupService for MockLookup {
    async fn find(
        &self,
        text: &str,
        details: &MatchDetails,
        _context: &LookupContext,
    ) -> Result<LookupResult, ScanError> {
        self.calls
            .borrow_mut()
            .push((text.to_string(), details.kind));
        if self.crash.get() {
            panic!("lookup backend crashed on {text:?}");
        }
        self.active.set(self.active.get() + 1);
        self.max_active
            .set(self.max_active.get().max(self.active.get()));

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        self.active.set(self.active.get() - 1);

        if self.fail.get() {
            return Err(ScanError::Lookup("backend offline".to_string()));
        }
        let dictionary = match details.kind {
            LookupKind::Terms => &self.terms,
            LookupKind::Kanji => &self.kanji,
        };
        Ok(dictionary.lookup(text, details))
    }
}

struct IgnoreFirstColumn;

impl IgnorePredicate for IgnoreFirstColumn {
    fn ignore(&self, x: f64, _y: f64) -> bool {
        x < 1.0
    }
}

/// Document whose ranges cannot become the host selection.
struct ReadOnlyDocument(PlainTextDocument);

#[derive(Debug, Clone)]
struct ReadOnlyRange(DocumentRange);

impl TextSourceProvider for ReadOnlyDocument {
    fn range_from_point(
        &self,
        x: f64,
        y: f64,
        _options: &RangeOptions,
    ) -> Result<Option<Box<dyn TextSource>>, ScanError> {
        Ok(self.0.position(x, y)?.map(|index| {
            Box::new(ReadOnlyRange(self.0.range(index, index))) as Box<dyn TextSource>
        }))
    }
}

impl TextSource for ReadOnlyRange {
    fn clone_source(&self) -> Box<dyn TextSource> {
        Box::new(self.clone())
    }

    fn text(&self) -> String {
        self.0.text()
    }

    fn set_start_offset(&mut self, length: usize, layout_aware: bool) -> usize {
        self.0.set_start_offset(length, layout_aware)
    }

    fn set_end_offset(&mut self, length: usize, from_end: bool, layout_aware: bool) -> usize {
        self.0.set_end_offset(length, from_end, layout_aware)
    }

    fn select(&self) -> Result<(), ScanError> {
        Err(ScanError::Selection("document is read-only".to_string()))
    }

    fn deselect(&self) -> Result<(), ScanError> {
        Err(ScanError::Selection("document is read-only".to_string()))
    }

    fn has_same_start(&self, other: &dyn TextSource) -> bool {
        other
            .as_any()
            .downcast_ref::<ReadOnlyRange>()
            .is_some_and(|other| self.0.has_same_start(&other.0))
    }

    fn nodes_in_range(&self) -> Vec<String> {
        self.0.nodes_in_range()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn entry(term: &str) -> DictionaryEntry {
    DictionaryEntry {
        term: term.to_string(),
        reading: None,
        definitions: vec![format!("meaning of {term}")],
    }
}

fn binding(types: DeviceSet, include: &str, options: InputBehavior) -> InputDefinition {
    InputDefinition {
        include: include.to_string(),
        exclude: String::new(),
        types,
        options,
    }
}

struct Harness {
    scanner: TextScanner,
    events: UnboundedReceiver<ScanEvent>,
    document: PlainTextDocument,
    lookup: Rc<MockLookup>,
}

impl Harness {
    fn new(text: &str, configure: impl FnOnce(&mut ScanningConfig)) -> Self {
        Self::build(
            PlainTextDocument::new(text, Vec::new()),
            MockLookup::new(&["cat", "dog", "World"], &[]),
            configure,
            |deps| deps,
        )
    }

    fn build(
        document: PlainTextDocument,
        lookup: MockLookup,
        configure: impl FnOnce(&mut ScanningConfig),
        wire: impl FnOnce(ScanDependencies) -> ScanDependencies,
    ) -> Self {
        let lookup = Rc::new(lookup);
        let deps = ScanDependencies::new(
            Rc::new(document.clone()),
            lookup.clone(),
            Rc::new(document.clone()),
        );
        let (scanner, events) = TextScanner::new(wire(deps));

        let mut config = ScanningConfig::default();
        configure(&mut config);
        scanner.set_options(&config);
        scanner.set_enabled(true);

        Self {
            scanner,
            events,
            document,
            lookup,
        }
    }

    fn dispatch(&self, event: InputEvent) -> Disposition {
        self.scanner.dispatch(&event)
    }

    async fn settle(&self) {
        self.scanner.settled().await;
    }

    fn drain(&mut self) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    fn drain_success_texts(&mut self) -> Vec<String> {
        self.drain()
            .iter()
            .filter_map(|event| match event {
                ScanEvent::SearchSuccess { text_source, .. } => Some(text_source.text()),
                _ => None,
            })
            .collect()
    }
}

fn shift() -> KeyModifiers {
    KeyModifiers {
        shift: true,
        ..KeyModifiers::default()
    }
}

fn shift_move(x: f64, y: f64) -> InputEvent {
    InputEvent::MouseMove(MouseEvent {
        modifiers: shift(),
        ..MouseEvent::at(x, y)
    })
}

fn mouse_down(x: f64, y: f64, button: u8) -> InputEvent {
    InputEvent::MouseDown(MouseEvent {
        button,
        buttons: 1 << button,
        ..MouseEvent::at(x, y)
    })
}

fn click(x: f64, y: f64) -> InputEvent {
    InputEvent::Click(MouseEvent::at(x, y))
}

fn pen(x: f64, y: f64) -> PointerEvent {
    PointerEvent::new(1, DeviceClass::Pen, x, y)
}

async fn in_local<F: std::future::Future<Output = ()>>(future: F) {
    LocalSet::new().run_until(future).await;
}

#[tokio::test(start_paused = true)]
async fn test_modifier_match_scans_immediately() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});

        assert_eq!(harness.dispatch(shift_move(4.0, 0.0)), Disposition::Propagate);
        harness.settle().await;

        let events = harness.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ScanEvent::SearchSuccess {
                entries,
                kind,
                sentence,
                input_info,
                text_source,
            } => {
                assert_eq!(entries[0].term, "dog");
                assert_eq!(*kind, LookupKind::Terms);
                assert_eq!(text_source.text(), "dog");
                assert_eq!(sentence.text, "cat dog");
                assert_eq!(sentence.offset, 4);
                assert_eq!(input_info.phase, GesturePhase::MouseMove);
                assert!(!input_info.is_fallback);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(harness.document.selected_text().as_deref(), Some("dog"));
        assert!(harness.scanner.has_selection());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_unmatched_mouse_move_is_ignored() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});

        harness.dispatch(InputEvent::MouseMove(MouseEvent::at(0.0, 0.0)));
        harness.settle().await;

        assert!(harness.drain().is_empty());
        assert!(harness.lookup.calls.borrow().is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_passive_mouse_move_waits_for_delay() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.inputs = vec![binding(MOUSE, "", InputBehavior::default())];
            config.delay_ms = 100;
        });

        harness.dispatch(InputEvent::MouseMove(MouseEvent::at(0.0, 0.0)));
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(harness.lookup.calls.borrow().is_empty());

        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_new_move_cancels_pending_debounce() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.inputs = vec![binding(MOUSE, "", InputBehavior::default())];
            config.delay_ms = 100;
        });

        harness.dispatch(InputEvent::MouseMove(MouseEvent::at(0.0, 0.0)));
        tokio::task::yield_now().await;
        harness.dispatch(InputEvent::MouseMove(MouseEvent::at(4.0, 0.0)));
        harness.settle().await;

        assert_eq!(harness.lookup.call_texts(), vec!["dog".to_string()]);
        assert_eq!(harness.drain_success_texts(), vec!["dog".to_string()]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_lookup_is_dropped() {
    in_local(async {
        let mut lookup = MockLookup::new(&["cat", "dog"], &[]);
        lookup.latency = Duration::from_millis(100);
        let mut harness = Harness::build(
            PlainTextDocument::new("cat dog", Vec::new()),
            lookup,
            |_| {},
            |deps| deps,
        );

        harness.dispatch(shift_move(0.0, 0.0));
        sleep(Duration::from_millis(10)).await;
        harness.dispatch(shift_move(4.0, 0.0));
        harness.settle().await;

        assert_eq!(harness.lookup.max_active.get(), 1);
        assert_eq!(harness.lookup.call_texts(), vec!["cat".to_string()]);
        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_same_span_is_not_looked_up_again() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});

        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;
        harness.dispatch(shift_move(0.5, 0.0));
        harness.settle().await;

        assert_eq!(harness.lookup.calls.borrow().len(), 1);
        assert_eq!(harness.drain().len(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_kanji_lookup_when_terms_find_nothing() {
    in_local(async {
        let mut harness = Harness::build(
            PlainTextDocument::new("語学", Vec::new()),
            MockLookup::new(&[], &["語"]),
            |_| {},
            |deps| deps,
        );

        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;

        assert_eq!(
            *harness.lookup.calls.borrow(),
            vec![
                ("語学".to_string(), LookupKind::Terms),
                ("語".to_string(), LookupKind::Kanji),
            ]
        );
        match harness.drain().as_slice() {
            [ScanEvent::SearchSuccess {
                kind, text_source, ..
            }] => {
                assert_eq!(*kind, LookupKind::Kanji);
                assert_eq!(text_source.text(), "語");
            }
            other => panic!("unexpected events {other:?}"),
        }
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_lookup_failure_becomes_search_error() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});
        harness.lookup.fail.set(true);

        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;

        match harness.drain().as_slice() {
            [ScanEvent::SearchError {
                error, text_source, ..
            }] => {
                assert_eq!(*error, ScanError::Lookup("backend offline".to_string()));
                assert!(text_source.is_some());
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert!(!harness.scanner.has_selection());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_hit_test_failure_and_empty_point() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});

        harness.dispatch(shift_move(-1.0, 0.0));
        harness.settle().await;
        harness.dispatch(shift_move(40.0, 0.0));
        harness.settle().await;

        let events = harness.drain();
        assert!(matches!(
            &events[0],
            ScanEvent::SearchError {
                error: ScanError::HitTest(_),
                text_source: None,
                ..
            }
        ));
        assert!(matches!(&events[1], ScanEvent::SearchEmpty { .. }));
        assert!(harness.lookup.calls.borrow().is_empty());
    })
    .await;
}

fn slow_harness(text: &str) -> Harness {
    let mut lookup = MockLookup::new(&["cat", "dog"], &[]);
    lookup.latency = Duration::from_millis(100);
    Harness::build(
        PlainTextDocument::new(text, Vec::new()),
        lookup,
        |_| {},
        |deps| deps,
    )
}

#[tokio::test(start_paused = true)]
async fn test_disable_drops_lookup_in_flight() {
    in_local(async {
        let mut harness = slow_harness("cat dog");

        harness.dispatch(shift_move(0.0, 0.0));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(harness.lookup.active.get(), 1);

        harness.scanner.set_enabled(false);
        harness.settle().await;

        assert!(harness.drain().is_empty());
        assert!(!harness.scanner.has_selection());
        assert!(harness.scanner.get_current_text_source().is_none());
        assert_eq!(harness.document.selected_text(), None);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_selection_drops_lookup_in_flight() {
    in_local(async {
        let mut harness = slow_harness("cat dog");

        harness.dispatch(shift_move(0.0, 0.0));
        sleep(Duration::from_millis(10)).await;
        harness.scanner.clear_selection();
        harness.settle().await;

        assert!(harness.drain().is_empty());
        assert_eq!(harness.document.selected_text(), None);

        // Nothing is current, so the same span is looked up again.
        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);
        assert_eq!(harness.document.selected_text().as_deref(), Some("cat"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_crashed_lookup_releases_gate_and_settles() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});
        harness.lookup.crash.set(true);

        harness.dispatch(shift_move(0.0, 0.0));
        tokio::time::timeout(Duration::from_secs(5), harness.settle())
            .await
            .expect("settled() should resolve after a crashed lookup");
        assert!(harness.drain().is_empty());

        harness.lookup.crash.set(false);
        harness.dispatch(shift_move(4.0, 0.0));
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["dog".to_string()]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_oversized_scan_lengths_still_scan() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.scan_length = usize::MAX;
            config.sentence_parsing.scan_extent = usize::MAX;
        });
        let options = harness.scanner.options();
        assert_eq!(options.scan_length, MAX_SCAN_LENGTH);
        assert_eq!(options.sentence.extent, MAX_SCAN_EXTENT);

        harness.dispatch(shift_move(4.0, 0.0));
        harness.settle().await;

        match harness.drain().as_slice() {
            [ScanEvent::SearchSuccess {
                text_source,
                sentence,
                ..
            }] => {
                assert_eq!(text_source.text(), "dog");
                assert_eq!(sentence.text, "cat dog");
            }
            other => panic!("unexpected events {other:?}"),
        }
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_selection_failure_still_reports_match() {
    in_local(async {
        let document = PlainTextDocument::new("cat dog", Vec::new());
        let provider: Rc<dyn TextSourceProvider> = Rc::new(ReadOnlyDocument(document.clone()));
        let mut harness = Harness::build(
            document,
            MockLookup::new(&["cat", "dog"], &[]),
            |_| {},
            move |mut deps| {
                deps.provider = provider;
                deps
            },
        );

        harness.dispatch(shift_move(4.0, 0.0));
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["dog".to_string()]);
        assert_eq!(harness.document.selected_text(), None);

        harness.scanner.clear_selection();
        assert!(!harness.scanner.has_selection());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_touch_press_only_fires_once() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.inputs = vec![binding(
                TOUCH,
                "",
                InputBehavior {
                    scan_on_touch_press: true,
                    ..InputBehavior::default()
                },
            )];
        });

        harness.dispatch(InputEvent::TouchStart(TouchEvent::single(1, 0.0, 0.0)));
        harness.settle().await;
        harness.dispatch(InputEvent::TouchEnd(TouchEvent::single(1, 4.0, 0.0)));
        harness.settle().await;

        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);
        assert_eq!(harness.lookup.calls.borrow().len(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_touch_scan_suppresses_synthesized_mouse_events() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});

        harness.dispatch(InputEvent::TouchStart(TouchEvent::single(1, 0.0, 0.0)));
        harness.settle().await;
        harness.dispatch(InputEvent::TouchEnd(TouchEvent::single(1, 0.0, 0.0)));
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);

        assert_eq!(
            harness.dispatch(InputEvent::ContextMenu(MouseEvent::at(0.0, 0.0))),
            Disposition::PreventDefault
        );
        assert_eq!(
            harness.dispatch(mouse_down(0.0, 0.0, 0)),
            Disposition::PreventDefault
        );
        assert_eq!(harness.dispatch(click(0.0, 0.0)), Disposition::PreventDefault);
        assert_eq!(harness.dispatch(click(0.0, 0.0)), Disposition::Propagate);
        assert!(harness.drain().is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_touch_tap_scans_on_release_unless_moved() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.inputs = vec![binding(
                TOUCH,
                "",
                InputBehavior {
                    scan_on_touch_tap: true,
                    ..InputBehavior::default()
                },
            )];
        });

        harness.dispatch(InputEvent::TouchStart(TouchEvent::single(1, 0.0, 0.0)));
        harness.settle().await;
        assert!(harness.lookup.calls.borrow().is_empty());
        harness.dispatch(InputEvent::TouchEnd(TouchEvent::single(1, 0.0, 0.0)));
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);

        harness.dispatch(InputEvent::TouchStart(TouchEvent::single(2, 4.0, 0.0)));
        assert_eq!(
            harness.dispatch(InputEvent::TouchMove(TouchEvent::single(2, 5.0, 0.0))),
            Disposition::Propagate
        );
        harness.dispatch(InputEvent::TouchEnd(TouchEvent::single(2, 5.0, 0.0)));
        harness.settle().await;

        assert!(harness.drain().is_empty());
        assert_eq!(harness.lookup.calls.borrow().len(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_touch_move_scans_while_scroll_prevented() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.inputs = vec![binding(
                TOUCH,
                "",
                InputBehavior {
                    scan_on_touch_press: true,
                    scan_on_touch_move: true,
                    prevent_touch_scrolling: true,
                    ..InputBehavior::default()
                },
            )];
        });

        harness.dispatch(InputEvent::TouchStart(TouchEvent::single(1, 0.0, 0.0)));
        harness.settle().await;
        assert_eq!(
            harness.dispatch(InputEvent::TouchMove(TouchEvent::single(1, 4.0, 0.0))),
            Disposition::PreventDefault
        );
        harness.settle().await;
        assert_eq!(
            harness.drain_success_texts(),
            vec!["cat".to_string(), "dog".to_string()]
        );

        let mut scrolling = TouchEvent::single(1, 5.0, 0.0);
        scrolling.cancelable = false;
        assert_eq!(
            harness.dispatch(InputEvent::TouchMove(scrolling)),
            Disposition::Propagate
        );
        harness.dispatch(InputEvent::TouchEnd(TouchEvent::single(1, 0.0, 0.0)));
        harness.settle().await;
        assert_eq!(harness.lookup.calls.borrow().len(), 2);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_pen_hover_only_fires_on_hover_and_move() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.pointer_events_enabled = true;
            config.inputs = vec![binding(
                PEN,
                "",
                InputBehavior {
                    scan_on_pen_hover: true,
                    ..InputBehavior::default()
                },
            )];
        });

        harness.dispatch(InputEvent::PointerOver(pen(0.0, 0.0)));
        harness.settle().await;
        harness.dispatch(InputEvent::PointerMove(pen(4.0, 0.0)));
        harness.settle().await;
        harness.dispatch(InputEvent::PointerDown(pen(0.0, 0.0).with_buttons(1)));
        harness.settle().await;
        harness.dispatch(InputEvent::PointerUp(pen(0.0, 0.0)));
        harness.settle().await;

        assert_eq!(
            harness.drain_success_texts(),
            vec!["cat".to_string(), "dog".to_string()]
        );
        assert_eq!(harness.lookup.calls.borrow().len(), 2);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_pen_press_suppresses_follow_up_events_until_out() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.pointer_events_enabled = true;
            config.inputs = vec![binding(
                PEN,
                "",
                InputBehavior {
                    scan_on_pen_press: true,
                    prevent_pen_scrolling: true,
                    ..InputBehavior::default()
                },
            )];
        });

        harness.dispatch(InputEvent::PointerOver(pen(0.0, 0.0)));
        harness.settle().await;
        assert!(harness.lookup.calls.borrow().is_empty());

        harness.dispatch(InputEvent::PointerDown(pen(0.0, 0.0).with_buttons(1)));
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);

        assert_eq!(
            harness.dispatch(InputEvent::TouchMove(TouchEvent::single(9, 1.0, 0.0))),
            Disposition::PreventDefault
        );
        assert_eq!(
            harness.dispatch(InputEvent::ContextMenu(MouseEvent::at(0.0, 0.0))),
            Disposition::PreventDefault
        );
        assert_eq!(
            harness.dispatch(mouse_down(0.0, 0.0, 0)),
            Disposition::PreventDefault
        );

        harness.dispatch(InputEvent::PointerOut(pen(0.0, 0.0)));
        assert_eq!(harness.dispatch(click(0.0, 0.0)), Disposition::Propagate);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_pen_move_scan_suppresses_follow_up_events() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.pointer_events_enabled = true;
            config.inputs = vec![binding(
                PEN,
                "",
                InputBehavior {
                    scan_on_pen_hover: true,
                    prevent_pen_scrolling: true,
                    ..InputBehavior::default()
                },
            )];
        });

        harness.dispatch(InputEvent::PointerOver(pen(0.0, 0.0)));
        harness.settle().await;
        assert_eq!(
            harness.dispatch(InputEvent::ContextMenu(MouseEvent::at(0.0, 0.0))),
            Disposition::Propagate
        );

        harness.dispatch(InputEvent::PointerMove(pen(4.0, 0.0)));
        harness.settle().await;
        assert_eq!(
            harness.drain_success_texts(),
            vec!["cat".to_string(), "dog".to_string()]
        );

        assert_eq!(
            harness.dispatch(InputEvent::TouchMove(TouchEvent::single(9, 5.0, 0.0))),
            Disposition::PreventDefault
        );
        assert_eq!(
            harness.dispatch(InputEvent::ContextMenu(MouseEvent::at(4.0, 0.0))),
            Disposition::PreventDefault
        );
        assert_eq!(
            harness.dispatch(mouse_down(4.0, 0.0, 0)),
            Disposition::PreventDefault
        );
        assert!(harness.drain().is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_mouse_press_in_pointer_mode_handled_once() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.pointer_events_enabled = true;
        });

        let press = PointerEvent::new(1, DeviceClass::Mouse, 0.0, 0.0).with_buttons(1);
        assert_eq!(
            harness.dispatch(InputEvent::PointerDown(press)),
            Disposition::Propagate
        );
        assert_eq!(
            harness.dispatch(mouse_down(0.0, 0.0, 0)),
            Disposition::Propagate
        );

        match harness.drain().as_slice() {
            [ScanEvent::Clear {
                reason: ClearReason::MouseDown,
            }] => {}
            other => panic!("unexpected events {other:?}"),
        }
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_pointer_type_recorded_on_over_wins() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.pointer_events_enabled = true;
            config.inputs = vec![binding(
                PEN,
                "",
                InputBehavior {
                    scan_on_pen_hover: true,
                    ..InputBehavior::default()
                },
            )];
        });

        harness.dispatch(InputEvent::PointerOver(PointerEvent::new(
            5,
            DeviceClass::Pen,
            0.0,
            0.0,
        )));
        harness.settle().await;
        harness.dispatch(InputEvent::PointerMove(PointerEvent::new(
            5,
            DeviceClass::Mouse,
            4.0,
            0.0,
        )));
        harness.settle().await;

        assert_eq!(
            harness.drain_success_texts(),
            vec!["cat".to_string(), "dog".to_string()]
        );
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_click_scan_skipped_after_selection_change() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |config| {
            config.search_on_click = true;
        });

        harness.dispatch(mouse_down(0.0, 0.0, 0));
        harness.dispatch(InputEvent::SelectionChange { collapsed: true });
        harness.dispatch(click(0.0, 0.0));
        harness.settle().await;

        harness.dispatch(mouse_down(4.0, 0.0, 0));
        tokio::time::advance(Duration::from_millis(60)).await;
        harness.dispatch(InputEvent::SelectionChange { collapsed: false });
        harness.dispatch(click(4.0, 0.0));
        harness.settle().await;

        let events = harness.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            ScanEvent::Clear {
                reason: ClearReason::MouseDown
            }
        ));
        match &events[1] {
            ScanEvent::SearchSuccess {
                text_source,
                input_info,
                ..
            } => {
                assert_eq!(text_source.text(), "cat");
                assert_eq!(input_info.phase, GesturePhase::Click);
                assert!(input_info.config.is_none());
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(events[2], ScanEvent::Clear { .. }));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_modifier_key_rescans_last_mouse_position() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});

        harness.dispatch(InputEvent::MouseMove(MouseEvent::at(4.0, 0.0)));
        harness.settle().await;
        assert!(harness.lookup.calls.borrow().is_empty());

        harness.dispatch(InputEvent::KeyDown { modifiers: shift() });
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["dog".to_string()]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_middle_mouse_prevention() {
    in_local(async {
        let harness = Harness::new("cat dog", |config| {
            config.prevent_middle_mouse = true;
        });
        assert_eq!(
            harness.dispatch(mouse_down(0.0, 0.0, 1)),
            Disposition::PreventDefault
        );
        let mut aux = MouseEvent::at(0.0, 0.0);
        aux.button = 1;
        assert_eq!(
            harness.dispatch(InputEvent::AuxClick(aux)),
            Disposition::PreventDefault
        );

        let plain = Harness::new("cat dog", |_| {});
        assert_eq!(plain.dispatch(mouse_down(0.0, 0.0, 1)), Disposition::Propagate);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_disable_tears_down_state() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});
        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;
        assert!(harness.scanner.has_selection());
        assert_eq!(harness.document.selected_text().as_deref(), Some("cat"));

        harness.scanner.set_enabled(false);
        harness.scanner.set_enabled(false);
        assert!(!harness.scanner.has_selection());
        assert_eq!(harness.document.selected_text(), None);
        assert!(harness.scanner.listened_events().is_empty());

        harness.dispatch(shift_move(4.0, 0.0));
        harness.settle().await;
        assert_eq!(harness.lookup.calls.borrow().len(), 1);
        assert_eq!(harness.drain().len(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_selection_restores_user_selection_once() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});
        harness.document.range(4, 7).select().unwrap();

        let source = Box::new(harness.document.range(0, 0));
        harness
            .scanner
            .search(
                source,
                Some(SearchDetail {
                    restore_selection: true,
                }),
            )
            .await;
        assert_eq!(harness.document.selected_text().as_deref(), Some("cat"));

        harness.scanner.clear_selection();
        assert_eq!(harness.document.selected_text().as_deref(), Some("dog"));
        harness.scanner.clear_selection();
        assert_eq!(harness.document.selected_text().as_deref(), Some("dog"));

        match harness.drain().as_slice() {
            [ScanEvent::SearchSuccess { input_info, .. }] => {
                assert_eq!(input_info.phase, GesturePhase::Script);
                assert_eq!(input_info.device, None);
            }
            other => panic!("unexpected events {other:?}"),
        }
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_selection_is_not_overwritten() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});
        harness.document.range(4, 7).select().unwrap();
        harness.dispatch(InputEvent::SelectionChange { collapsed: false });

        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;

        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);
        assert_eq!(harness.document.selected_text().as_deref(), Some("dog"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_search_last_repeats_current_match() {
    in_local(async {
        let mut harness = Harness::new("cat dog", |_| {});
        assert!(!harness.scanner.search_last().await);

        harness.dispatch(shift_move(4.0, 0.0));
        harness.settle().await;
        assert!(harness.scanner.search_last().await);

        assert_eq!(
            harness.drain_success_texts(),
            vec!["dog".to_string(), "dog".to_string()]
        );
        assert!(harness.scanner.get_current_text_source().is_some());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_excluded_tags_shorten_scan_text() {
    in_local(async {
        let document = PlainTextDocument::new(
            "catdog",
            vec![TagSpan {
                tag: "rt".to_string(),
                start: 3,
                end: 6,
            }],
        );
        let mut harness = Harness::build(
            document,
            MockLookup::new(&["cat", "catdog"], &[]),
            |config| config.exclude_tags = vec!["rt".to_string()],
            |deps| deps,
        );

        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;

        assert_eq!(harness.lookup.call_texts(), vec!["cat".to_string()]);
        assert_eq!(harness.drain_success_texts(), vec!["cat".to_string()]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_ignore_predicate_vetoes_point() {
    in_local(async {
        let mut harness = Harness::build(
            PlainTextDocument::new("cat dog", Vec::new()),
            MockLookup::new(&["cat", "dog"], &[]),
            |_| {},
            |deps| deps.with_ignore(Rc::new(IgnoreFirstColumn)),
        );

        harness.dispatch(shift_move(0.0, 0.0));
        harness.settle().await;
        assert!(harness.drain().is_empty());

        harness.dispatch(shift_move(4.0, 0.0));
        harness.settle().await;
        assert_eq!(harness.drain_success_texts(), vec!["dog".to_string()]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_sentence_attached_to_success() {
    in_local(async {
        let mut harness = Harness::new("Hello. World. Foo.", |_| {});

        harness.dispatch(shift_move(7.0, 0.0));
        harness.settle().await;

        match harness.drain().as_slice() {
            [ScanEvent::SearchSuccess { sentence, .. }] => {
                assert_eq!(sentence.text, "World.");
                assert_eq!(sentence.offset, 0);
            }
            other => panic!("unexpected events {other:?}"),
        }
    })
    .await;
}

#[test]
fn test_options_change_replans_listeners() {
    let harness = Harness::new("cat dog", |_| {});
    assert!(harness.scanner.listened_events().contains(&EventKind::MouseMove));

    let mut config = ScanningConfig::default();
    config.pointer_events_enabled = true;
    harness.scanner.set_options(&config);

    let listened = harness.scanner.listened_events();
    assert!(listened.contains(&EventKind::PointerDown));
    assert!(!listened.contains(&EventKind::MouseMove));
}
