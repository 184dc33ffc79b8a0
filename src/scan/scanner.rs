//! The scan orchestrator.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use log::{debug, error, info, warn};
use tokio::sync::{Notify, mpsc};

use crate::config::ScanningConfig;
use crate::input::{
    ActiveModifierSet, DeviceClass, EventKind, GesturePhase, InputEvent, KeyModifiers, classify,
    match_input,
};
use crate::scan::{
    gate::LookupGate,
    gesture::GestureState,
    listeners::{Handler, ListenerPlan, ListenerStrategy},
    options::ScanOptions,
    selection::SelectionCoordinator,
    source::{RangeOptions, ScanDependencies, TextSource},
    types::{
        DictionaryEntry, Disposition, InputInfo, LookupContext, LookupKind, MatchDetails,
        MatchType, ScanError, ScanEvent, SearchDetail,
    },
};
use crate::sentence::{Sentence, SentenceRules, TextWindow, extract_sentence};

pub(crate) struct Inner {
    pub(crate) deps: ScanDependencies,
    events: mpsc::UnboundedSender<ScanEvent>,
    pub(crate) options: RefCell<ScanOptions>,
    enabled: Cell<bool>,
    listeners: RefCell<ListenerPlan>,
    pub(crate) gate: LookupGate,
    pub(crate) selection: SelectionCoordinator,
    pub(crate) gesture: RefCell<GestureState>,
    text_source: RefCell<Option<Box<dyn TextSource>>>,
    text_source_selected: Cell<bool>,
    input_info: RefCell<Option<InputInfo>>,
    /// Bumped by teardown; lookups started under an older value are dropped
    generation: Cell<u64>,
    tasks: Cell<usize>,
    idle: Notify,
}

/// Holds one slot of the task count, released even if the task panics.
struct TaskSlot {
    inner: Rc<Inner>,
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        let remaining = self.inner.tasks.get().saturating_sub(1);
        self.inner.tasks.set(remaining);
        if remaining == 0 {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Turns host input events into lookup requests and outcome events.
///
/// A cheap handle: clones share the same scanner. All handlers are
/// synchronous and return whether the host should suppress the event's
/// default action; lookups run as local tasks, so handlers must be called
/// from inside a [`tokio::task::LocalSet`].
#[derive(Clone)]
pub struct TextScanner {
    pub(crate) inner: Rc<Inner>,
}

/// Values read from the options for one search.
struct SearchParams {
    search_terms: bool,
    search_kanji: bool,
    scan_length: usize,
    layout_aware: bool,
    match_type: MatchType,
    select_text: bool,
    include_tags: Vec<String>,
    exclude_tags: Vec<String>,
    sentence: SentenceRules,
}

struct Found {
    entries: Vec<DictionaryEntry>,
    kind: LookupKind,
    consumed_length: usize,
}

impl TextScanner {
    /// Creates a disabled scanner with default options, and the receiver for
    /// its outcome events.
    pub fn new(deps: ScanDependencies) -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let options = ScanOptions::default();
        let selection = SelectionCoordinator::new(deps.selection.clone(), options.selection_bracket);

        let inner = Inner {
            deps,
            events,
            options: RefCell::new(options),
            enabled: Cell::new(false),
            listeners: RefCell::new(ListenerPlan::default()),
            gate: LookupGate::new(),
            selection,
            gesture: RefCell::new(GestureState::default()),
            text_source: RefCell::new(None),
            text_source_selected: Cell::new(false),
            input_info: RefCell::new(None),
            generation: Cell::new(0),
            tasks: Cell::new(0),
            idle: Notify::new(),
        };

        (
            Self {
                inner: Rc::new(inner),
            },
            receiver,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Starts or stops scanning.
    ///
    /// Disabling drops the listener plan, resets all gesture state, cancels the
    /// pending debounce and clears the current selection. Idempotent.
    pub fn set_enabled(&self, enabled: bool) {
        if !enabled {
            let was_enabled = self.inner.enabled.replace(false);
            self.inner.listeners.replace(ListenerPlan::default());
            self.inner.gesture.borrow_mut().reset();
            self.inner.gate.clear();
            self.clear_selection();
            if was_enabled {
                info!("Scanning disabled");
            }
            return;
        }

        if self.inner.enabled.replace(true) {
            return;
        }
        self.inner.selection.set_user_has_not_selected_manually(true);
        self.rebuild_listeners();
        info!(
            "Scanning enabled with {} listener(s)",
            self.inner.listeners.borrow().registrations().len()
        );
    }

    /// Replaces all options with those resolved from `raw`.
    pub fn set_options(&self, raw: &ScanningConfig) {
        let resolved = ScanOptions::resolve(raw, &self.inner.options.borrow());
        let relisten = self.inner.options.borrow().listeners_differ(&resolved);

        self.inner.selection.set_bracket(resolved.selection_bracket);
        debug!(
            "Options updated: {} input binding(s), delay {:?}",
            resolved.inputs.len(),
            resolved.delay
        );
        self.inner.options.replace(resolved);

        if relisten && self.is_enabled() {
            self.rebuild_listeners();
        }
    }

    pub fn options(&self) -> ScanOptions {
        self.inner.options.borrow().clone()
    }

    fn rebuild_listeners(&self) {
        let strategy = {
            let options = self.inner.options.borrow();
            ListenerStrategy::select(
                options.search_on_click_only,
                options.pointer_events_enabled,
                options.touch_input_enabled,
            )
        };
        debug!("Listening with {:?} strategy", strategy);
        self.inner.listeners.replace(ListenerPlan::build(strategy));
    }

    /// Host event kinds the scanner currently listens to.
    pub fn listened_events(&self) -> Vec<EventKind> {
        self.inner
            .listeners
            .borrow()
            .registrations()
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Routes a host event to its handler through the listener plan.
    pub fn dispatch(&self, event: &InputEvent) -> Disposition {
        let handler = self.inner.listeners.borrow().handler_for(event.kind());
        let Some(handler) = handler else {
            return Disposition::Propagate;
        };

        match (handler, event) {
            (Handler::MouseDown, InputEvent::MouseDown(e)) => self.on_mouse_down(e),
            (Handler::MouseMove, InputEvent::MouseMove(e)) => self.on_mouse_move(e),
            (Handler::MouseOut, InputEvent::MouseOut(_)) => self.on_mouse_out(),
            (Handler::Click, InputEvent::Click(e)) => self.on_click(e),
            (Handler::AuxClick, InputEvent::AuxClick(e)) => self.on_aux_click(e),
            (Handler::ContextMenu, InputEvent::ContextMenu(_)) => self.on_context_menu(),
            (Handler::TouchStart, InputEvent::TouchStart(e)) => self.on_touch_start(e),
            (Handler::TouchEnd, InputEvent::TouchEnd(e)) => self.on_touch_end(e),
            (Handler::TouchCancel, InputEvent::TouchCancel(e)) => self.on_touch_cancel(e),
            (Handler::TouchMove, InputEvent::TouchMove(e)) => self.on_touch_move(e),
            (Handler::TouchMovePreventScroll, InputEvent::TouchMove(e)) => {
                self.on_touch_move_prevent_scroll(e)
            }
            (Handler::PointerOver, InputEvent::PointerOver(e)) => self.on_pointer_over(e),
            (Handler::PointerDown, InputEvent::PointerDown(e)) => self.on_pointer_down(e),
            (Handler::PointerMove, InputEvent::PointerMove(e)) => self.on_pointer_move(e),
            (Handler::PointerUp, InputEvent::PointerUp(e)) => self.on_pointer_up(e),
            (Handler::PointerCancel, InputEvent::PointerCancel(e)) => self.on_pointer_cancel(e),
            (Handler::PointerOut, InputEvent::PointerOut(e)) => self.on_pointer_out(e),
            (Handler::SelectionChange, InputEvent::SelectionChange { collapsed }) => {
                self.on_selection_change(*collapsed)
            }
            (Handler::KeyDown, InputEvent::KeyDown { modifiers }) => self.on_key_down(modifiers),
            (handler, event) => {
                warn!("Handler {:?} cannot take {:?}", handler, event.kind());
                Disposition::Propagate
            }
        }
    }

    // -------------------------------------------------------------------------
    // Public search surface
    // -------------------------------------------------------------------------

    /// Searches `source` directly, bypassing input matching.
    ///
    /// Dropped (with no event) while another lookup is in flight.
    pub async fn search(&self, source: Box<dyn TextSource>, detail: Option<SearchDetail>) {
        let Some(_flight) = self.inner.gate.try_begin() else {
            debug!("Lookup in flight, dropping programmatic search");
            return;
        };
        let info = InputInfo::unmatched(
            None,
            GesturePhase::Script,
            KeyModifiers::default(),
            ActiveModifierSet::new(),
            detail,
        );
        self.search_source(source, info).await;
    }

    /// Repeats the last successful search. Returns `false` when there is
    /// nothing to repeat or a lookup is already in flight.
    pub async fn search_last(&self) -> bool {
        let source = self.get_current_text_source();
        let info = self.inner.input_info.borrow().clone();
        let (Some(source), Some(info)) = (source, info) else {
            return false;
        };
        let Some(_flight) = self.inner.gate.try_begin() else {
            debug!("Lookup in flight, dropping repeated search");
            return false;
        };
        self.search_source(source, info).await;
        true
    }

    pub fn has_selection(&self) -> bool {
        self.inner.text_source.borrow().is_some()
    }

    /// Forgets the current match, deselecting it and restoring any captured
    /// host selection. Idempotent.
    ///
    /// A lookup still in flight is abandoned: its result is dropped when it
    /// arrives.
    pub fn clear_selection(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        let current = self.inner.text_source.borrow_mut().take();
        let was_selected = self.inner.text_source_selected.replace(false);

        match current {
            Some(source) if was_selected => {
                self.inner.selection.begin_programmatic();
                if let Err(err) = source.deselect() {
                    warn!("Failed to deselect scanned text: {err}");
                }
                self.inner.selection.restore_captured();
            }
            _ if self.inner.selection.has_captured() => {
                debug!("Dropping captured selection, nothing was selected");
                self.inner.selection.discard_captured();
            }
            _ => {}
        }
        self.inner.input_info.replace(None);
    }

    /// Copy of the current match.
    pub fn get_current_text_source(&self) -> Option<Box<dyn TextSource>> {
        self.inner
            .text_source
            .borrow()
            .as_ref()
            .map(|source| source.clone_source())
    }

    pub fn set_current_text_source(&self, source: Option<Box<dyn TextSource>>) {
        self.inner.text_source.replace(source);
        self.inner.text_source_selected.set(false);
    }

    /// Resolves once every lookup task spawned so far has finished.
    pub async fn settled(&self) {
        while self.inner.tasks.get() > 0 {
            let idle = self.inner.idle.notified();
            if self.inner.tasks.get() == 0 {
                break;
            }
            idle.await;
        }
    }

    // -------------------------------------------------------------------------
    // Shared plumbing for the device handlers
    // -------------------------------------------------------------------------

    pub(crate) fn spawn_scan<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.inner.tasks.set(self.inner.tasks.get() + 1);
        let slot = TaskSlot {
            inner: self.inner.clone(),
        };
        tokio::task::spawn_local(async move {
            let _slot = slot;
            future.await;
        });
    }

    /// Matches the event against the configured bindings.
    pub(crate) fn match_input_info(
        &self,
        device: DeviceClass,
        phase: GesturePhase,
        keys: &KeyModifiers,
        buttons: u16,
    ) -> Option<InputInfo> {
        let modifiers = classify(keys, buttons);
        let options = self.inner.options.borrow();
        let matched = match_input(device, &modifiers, &options.inputs)?;
        Some(InputInfo {
            config: options.inputs.get(matched.index).cloned(),
            device: Some(device),
            phase,
            is_fallback: matched.is_fallback,
            modifiers,
            modifier_keys: *keys,
            detail: None,
        })
    }

    /// Spawns a search at a point.
    pub(crate) fn scan_at(&self, x: f64, y: f64, info: InputInfo) {
        let scanner = self.clone();
        self.spawn_scan(async move { scanner.search_at(x, y, info).await });
    }

    pub(crate) fn current_has_same_start(&self, other: Option<&dyn TextSource>) -> bool {
        match (self.inner.text_source.borrow().as_ref(), other) {
            (Some(current), Some(other)) => current.has_same_start(other),
            _ => false,
        }
    }

    pub(crate) async fn search_at(&self, x: f64, y: f64, info: InputInfo) {
        let Some(_flight) = self.inner.gate.try_begin() else {
            debug!("Lookup in flight, dropping {:?} at ({x}, {y})", info.phase);
            return;
        };
        self.inner.gate.clear();

        if let Some(ignore) = &self.inner.deps.ignore {
            if ignore.ignore(x, y) {
                debug!("Host ignores ({x}, {y})");
                return;
            }
        }

        let range_options = {
            let options = self.inner.options.borrow();
            RangeOptions {
                deep_content_scan: options.deep_content_scan,
                normalize_zoom: options.normalize_css_zoom
                    && self.inner.deps.capabilities.css_zoom_supported,
                scan_alt_text: options.scan_alt_text,
            }
        };

        let source = match self
            .inner
            .deps
            .provider
            .range_from_point(x, y, &range_options)
        {
            Ok(Some(source)) => source,
            Ok(None) => {
                self.emit(ScanEvent::SearchEmpty { input_info: info });
                return;
            }
            Err(err) => {
                error!("Hit test at ({x}, {y}) failed: {err}");
                self.emit(ScanEvent::SearchError {
                    error: err,
                    text_source: None,
                    input_info: info,
                });
                return;
            }
        };

        if self.current_has_same_start(Some(source.as_ref())) {
            debug!("Same span as the current match, skipping lookup");
            return;
        }

        self.search_source(source, info).await;
    }

    fn search_params(&self, info: &InputInfo) -> SearchParams {
        let options = self.inner.options.borrow();
        let (terms, kanji) = match &info.config {
            Some(config) => (config.behavior.search_terms, config.behavior.search_kanji),
            None => (true, true),
        };
        SearchParams {
            search_terms: options.search_terms && terms,
            search_kanji: options.search_kanji && kanji,
            scan_length: options.scan_length,
            layout_aware: options.layout_aware_scan,
            match_type: if options.match_type_prefix {
                MatchType::Prefix
            } else {
                MatchType::Exact
            },
            select_text: options.select_text,
            include_tags: options.include_tags.clone(),
            exclude_tags: options.exclude_tags.clone(),
            sentence: options.sentence.clone(),
        }
    }

    /// Looks up `source` and emits the outcome. The caller holds the flight
    /// guard.
    async fn search_source(&self, source: Box<dyn TextSource>, info: InputInfo) {
        let params = self.search_params(&info);

        let restore_requested = info
            .detail
            .as_ref()
            .is_some_and(|detail| detail.restore_selection);
        if restore_requested && self.inner.input_info.borrow().is_none() {
            self.inner.selection.remember();
        }

        let generation = self.inner.generation.get();
        let context = info.lookup_context();
        let outcome = self.find_entries(source.as_ref(), &params, &context).await;
        if self.inner.generation.get() != generation {
            debug!("Scanner torn down during lookup, dropping result");
            return;
        }
        let found = match outcome {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.emit(ScanEvent::SearchEmpty { input_info: info });
                return;
            }
            Err(err) => {
                error!("Lookup failed: {err}");
                self.emit(ScanEvent::SearchError {
                    error: err,
                    text_source: Some(source.clone_source()),
                    input_info: info,
                });
                return;
            }
        };

        let mut matched = source;
        matched.set_end_offset(found.consumed_length, false, params.layout_aware);
        let sentence = sentence_around(matched.as_ref(), &params.sentence, params.layout_aware);

        let selected = params.select_text && self.inner.selection.user_has_not_selected_manually();
        if selected {
            self.inner.selection.begin_programmatic();
            if let Err(err) = matched.select() {
                warn!("Failed to select scanned text: {err}");
            }
        }

        let snapshot = matched.clone_source();
        self.inner.text_source.replace(Some(matched));
        self.inner.text_source_selected.set(selected);
        self.inner.input_info.replace(Some(info.clone()));

        debug!(
            "Found {} {:?} entr(ies) for {:?}",
            found.entries.len(),
            found.kind,
            snapshot.text()
        );
        self.emit(ScanEvent::SearchSuccess {
            entries: found.entries,
            kind: found.kind,
            sentence,
            input_info: info,
            text_source: snapshot,
        });
    }

    /// Terms lookup first, then a single-character kanji lookup.
    async fn find_entries(
        &self,
        source: &dyn TextSource,
        params: &SearchParams,
        context: &LookupContext,
    ) -> Result<Option<Found>, ScanError> {
        let lookup = self.inner.deps.lookup.clone();

        if params.search_terms {
            let mut scan = source.clone_source();
            scan.set_end_offset(params.scan_length, false, params.layout_aware);
            constrain_to_tags(scan.as_mut(), params);

            let text = scan.text();
            if !text.is_empty() {
                let details = MatchDetails {
                    kind: LookupKind::Terms,
                    match_type: params.match_type,
                };
                let result = lookup.find(&text, &details, context).await?;
                if !result.entries.is_empty() {
                    return Ok(Some(Found {
                        entries: result.entries,
                        kind: LookupKind::Terms,
                        consumed_length: result.consumed_length,
                    }));
                }
            }
        }

        if params.search_kanji {
            let mut scan = source.clone_source();
            scan.set_end_offset(1, false, params.layout_aware);

            let text = scan.text();
            if !text.is_empty() {
                let details = MatchDetails {
                    kind: LookupKind::Kanji,
                    match_type: MatchType::Exact,
                };
                let result = lookup.find(&text, &details, context).await?;
                if !result.entries.is_empty() {
                    return Ok(Some(Found {
                        entries: result.entries,
                        kind: LookupKind::Kanji,
                        consumed_length: 1,
                    }));
                }
            }
        }

        Ok(None)
    }

    pub(crate) fn emit(&self, event: ScanEvent) {
        if self.inner.events.send(event).is_err() {
            debug!("Scan event receiver dropped");
        }
    }
}

/// Shrinks `source` from its end until it only touches allowed nodes.
fn constrain_to_tags(source: &mut dyn TextSource, params: &SearchParams) {
    if params.include_tags.is_empty() && params.exclude_tags.is_empty() {
        return;
    }

    let mut length = source.text().chars().count();
    while length > 0 {
        let allowed = source.nodes_in_range().iter().all(|tag| {
            (params.include_tags.is_empty() || params.include_tags.contains(tag))
                && !params.exclude_tags.contains(tag)
        });
        if allowed {
            break;
        }
        length -= 1;
        source.set_end_offset(length, false, params.layout_aware);
    }
}

/// Widens a copy of `source` by the sentence extent and extracts the sentence.
fn sentence_around(source: &dyn TextSource, rules: &SentenceRules, layout_aware: bool) -> Sentence {
    let mut window = source.clone_source();
    let start_length = window.set_start_offset(rules.extent, layout_aware);
    let end_length = window.set_end_offset(
        rules.extent.saturating_mul(2).saturating_sub(start_length),
        true,
        layout_aware,
    );

    let text = window.text();
    let anchor_end = text.chars().count().saturating_sub(end_length);
    extract_sentence(&TextWindow::new(&text, start_length, anchor_end), rules)
}
