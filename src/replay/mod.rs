//! Scripted replay of host input through a [`TextScanner`].
//!
//! A script supplies a plain-text document, a word list and a sequence of
//! host events and control actions. Every outcome event is written as one
//! JSON line, together with a `prevent-default` line for each event whose
//! default action the scanner asked to suppress.

pub mod dictionary;
pub mod document;
pub mod script;

pub use dictionary::WordListDictionary;
pub use document::{DocumentRange, PlainTextDocument, TagSpan};
pub use script::{Control, DocumentSpec, Script, Step};

use std::io::Write;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::LocalSet;
use tokio::time::{Duration, sleep};

use crate::config::Config;
use crate::scan::{ScanDependencies, ScanEvent, SearchDetail, TextScanner};

/// Counts gathered while replaying a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: usize,
    pub events: usize,
    pub prevented: usize,
}

/// Replays `script` against `config` and writes outcome lines to `out`.
///
/// Scanning starts enabled. The script's own `[scanning]` table, when
/// present, replaces the one from `config`.
pub async fn run<W: Write>(script: &Script, config: &Config, out: &mut W) -> Result<RunSummary> {
    LocalSet::new()
        .run_until(replay(script, config, out))
        .await
}

async fn replay<W: Write>(script: &Script, config: &Config, out: &mut W) -> Result<RunSummary> {
    let document = PlainTextDocument::new(&script.document.text, script.document.tags.clone());
    let dictionary = WordListDictionary::new(script.dictionary.iter().cloned())
        .with_latency(Duration::from_millis(script.lookup_delay_ms));
    info!(
        "Replaying {} step(s) over {} dictionary entr(ies)",
        script.steps.len(),
        dictionary.len()
    );

    let deps = ScanDependencies::new(
        Rc::new(document.clone()),
        Rc::new(dictionary),
        Rc::new(document.clone()),
    );
    let (scanner, mut events) = TextScanner::new(deps);
    scanner.set_options(script.scanning.as_ref().unwrap_or(&config.scanning));
    scanner.set_enabled(true);

    let mut summary = RunSummary::default();
    for (index, step) in script.steps.iter().enumerate() {
        debug!("Step {index}: {step:?}");
        match step {
            Step::Input(event) => {
                if scanner.dispatch(event).is_prevented() {
                    summary.prevented += 1;
                    let line = json!({
                        "event": "prevent-default",
                        "step": index,
                        "input": event.kind(),
                    });
                    writeln!(out, "{line}")?;
                }
            }
            Step::Control(control) => apply(&scanner, &document, control).await,
        }
        summary.events += drain(&mut events, out)?;
        summary.steps += 1;
    }

    scanner.settled().await;
    summary.events += drain(&mut events, out)?;
    out.flush().context("Failed to flush replay output")?;

    info!(
        "Replay finished: {} event(s), {} prevented",
        summary.events, summary.prevented
    );
    Ok(summary)
}

async fn apply(scanner: &TextScanner, document: &PlainTextDocument, control: &Control) {
    match control {
        Control::Wait { ms } => sleep(Duration::from_millis(*ms)).await,
        Control::Enable => scanner.set_enabled(true),
        Control::Disable => scanner.set_enabled(false),
        Control::Settle => scanner.settled().await,
        Control::SearchLast => {
            if !scanner.search_last().await {
                debug!("Nothing to search again");
            }
        }
        Control::ClearSelection => scanner.clear_selection(),
        Control::Search {
            x,
            y,
            restore_selection,
        } => match document.position(*x, *y) {
            Ok(Some(index)) => {
                let detail = SearchDetail {
                    restore_selection: *restore_selection,
                };
                scanner
                    .search(Box::new(document.range(index, index)), Some(detail))
                    .await;
            }
            Ok(None) => debug!("No text at ({x}, {y}), skipping search"),
            Err(err) => warn!("Skipping search: {err}"),
        },
    }
}

fn drain<W: Write>(events: &mut UnboundedReceiver<ScanEvent>, out: &mut W) -> Result<usize> {
    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        let line = serde_json::to_string(&event).context("Failed to encode scan event")?;
        writeln!(out, "{line}")?;
        count += 1;
    }
    Ok(count)
}
