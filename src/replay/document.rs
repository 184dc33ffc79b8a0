//! A plain-text document acting as hit-test provider and selection host.
//!
//! Coordinates map onto a character grid: `x` is the column and `y` the line.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::scan::{
    RangeHandle, RangeOptions, ScanError, SelectionHost, TextSource, TextSourceProvider,
};

/// A tagged character range, standing in for an element of rendered content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagSpan {
    pub tag: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug)]
struct DocumentText {
    chars: Vec<char>,
    line_starts: Vec<usize>,
    tags: Vec<TagSpan>,
    selection: RefCell<Vec<(usize, usize)>>,
}

impl DocumentText {
    fn len(&self) -> usize {
        self.chars.len()
    }

    fn line_len(&self, line: usize) -> usize {
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.chars.len());
        end - start
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start.min(self.len())..end.min(self.len())]
            .iter()
            .collect()
    }
}

/// In-memory document.
#[derive(Debug, Clone)]
pub struct PlainTextDocument {
    text: Rc<DocumentText>,
}

impl PlainTextDocument {
    pub fn new(text: &str, tags: Vec<TagSpan>) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        line_starts.extend(
            chars
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == '\n')
                .map(|(index, _)| index + 1),
        );

        Self {
            text: Rc::new(DocumentText {
                chars,
                line_starts,
                tags,
                selection: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Character index under (`x`, `y`), or `None` past the end of a line.
    pub fn position(&self, x: f64, y: f64) -> Result<Option<usize>, ScanError> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return Err(ScanError::HitTest(format!("point ({x}, {y}) is off the page")));
        }
        let (column, line) = (x.floor() as usize, y.floor() as usize);
        if line >= self.text.line_starts.len() || column >= self.text.line_len(line) {
            return Ok(None);
        }
        Ok(Some(self.text.line_starts[line] + column))
    }

    /// Range over `start..end` character indices.
    pub fn range(&self, start: usize, end: usize) -> DocumentRange {
        let end = end.min(self.text.len());
        DocumentRange {
            text: self.text.clone(),
            start: start.min(end),
            end,
        }
    }

    /// Text of the first selected range.
    pub fn selected_text(&self) -> Option<String> {
        let selection = self.text.selection.borrow();
        selection
            .first()
            .map(|(start, end)| self.text.slice(*start, *end))
    }
}

fn encode(start: usize, end: usize) -> RangeHandle {
    RangeHandle(((start as u64) << 32) | (end as u64 & 0xffff_ffff))
}

fn decode(handle: RangeHandle) -> (usize, usize) {
    ((handle.0 >> 32) as usize, (handle.0 & 0xffff_ffff) as usize)
}

impl TextSourceProvider for PlainTextDocument {
    fn range_from_point(
        &self,
        x: f64,
        y: f64,
        _options: &RangeOptions,
    ) -> Result<Option<Box<dyn TextSource>>, ScanError> {
        Ok(self
            .position(x, y)?
            .map(|index| Box::new(self.range(index, index)) as Box<dyn TextSource>))
    }
}

impl SelectionHost for PlainTextDocument {
    fn ranges(&self) -> Vec<RangeHandle> {
        self.text
            .selection
            .borrow()
            .iter()
            .map(|(start, end)| encode(*start, *end))
            .collect()
    }

    fn set_ranges(&self, ranges: &[RangeHandle]) {
        self.text
            .selection
            .borrow_mut()
            .extend(ranges.iter().copied().map(decode));
    }

    fn remove_all(&self) {
        self.text.selection.borrow_mut().clear();
    }

    fn contains_point(&self, x: f64, y: f64) -> bool {
        let Ok(Some(index)) = self.position(x, y) else {
            return false;
        };
        self.text
            .selection
            .borrow()
            .iter()
            .any(|(start, end)| (*start..*end).contains(&index))
    }
}

/// A span of a [`PlainTextDocument`].
#[derive(Debug, Clone)]
pub struct DocumentRange {
    text: Rc<DocumentText>,
    start: usize,
    end: usize,
}

impl DocumentRange {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

impl TextSource for DocumentRange {
    fn clone_source(&self) -> Box<dyn TextSource> {
        Box::new(self.clone())
    }

    fn text(&self) -> String {
        self.text.slice(self.start, self.end)
    }

    fn set_start_offset(&mut self, length: usize, _layout_aware: bool) -> usize {
        let start = self.start.saturating_sub(length);
        let moved = self.start - start;
        self.start = start;
        moved
    }

    fn set_end_offset(&mut self, length: usize, from_end: bool, _layout_aware: bool) -> usize {
        let limit = self.text.len();
        if from_end {
            let end = (self.end + length).min(limit);
            let moved = end - self.end;
            self.end = end;
            moved
        } else {
            self.end = (self.start + length).min(limit);
            self.end - self.start
        }
    }

    fn select(&self) -> Result<(), ScanError> {
        let mut selection = self.text.selection.borrow_mut();
        selection.clear();
        selection.push((self.start, self.end));
        Ok(())
    }

    fn deselect(&self) -> Result<(), ScanError> {
        self.text.selection.borrow_mut().clear();
        Ok(())
    }

    fn has_same_start(&self, other: &dyn TextSource) -> bool {
        other
            .as_any()
            .downcast_ref::<DocumentRange>()
            .is_some_and(|other| Rc::ptr_eq(&self.text, &other.text) && other.start == self.start)
    }

    fn nodes_in_range(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for span in &self.text.tags {
            let touches = if self.start == self.end {
                (span.start..span.end).contains(&self.start)
            } else {
                span.start < self.end && span.end > self.start
            };
            if touches && !tags.contains(&span.tag) {
                tags.push(span.tag.clone());
            }
        }
        tags
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
