//! Editor host surface
//!
//! The orchestrator never touches a document directly. It asks an
//! [`EditorHost`] for the current selections, reads and replaces their text,
//! and reports through the host's notifications.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::ops::Range;
use thiserror::Error;

/// Opaque handle to one selection in the host's document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    index: usize,
}

impl Selection {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[async_trait]
pub trait EditorHost: Send {
    /// Selections in document-selection order, or `None` when no document is open
    fn active_selections(&self) -> Option<Vec<Selection>>;

    fn text(&self, selection: &Selection) -> String;

    async fn replace_text(&mut self, selection: &Selection, text: &str) -> Result<()>;

    fn notify_info(&mut self, message: &str);

    fn notify_error(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info(String),
    Error(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("selection {start}..{end} is reversed")]
    Reversed { start: usize, end: usize },

    #[error("selection {start}..{end} is outside the document ({len} bytes)")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("selection boundary {0} is not on a character boundary")]
    NotCharBoundary(usize),

    #[error("selections {first:?} and {second:?} overlap")]
    Overlap {
        first: Range<usize>,
        second: Range<usize>,
    },

    #[error("lines {first}..{last} do not exist in a document with {lines} lines")]
    InvalidLines {
        first: usize,
        last: usize,
        lines: usize,
    },
}

#[derive(Debug)]
struct Document {
    text: String,
    ranges: Vec<Range<usize>>,
}

/// In-memory document with byte-range selections.
///
/// Replacing a selection shifts every selection after it by the change in
/// length, so each handle keeps addressing the same logical text.
#[derive(Debug)]
pub struct BufferHost {
    document: Option<Document>,
    notifications: Vec<Notification>,
    edits: usize,
}

impl BufferHost {
    /// Open `text` with a single selection covering all of it
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let whole = 0..text.len();
        Self::open(text, vec![whole])
    }

    /// Open `text` with the given selections, kept in caller order
    pub fn with_ranges(
        text: impl Into<String>,
        ranges: Vec<Range<usize>>,
    ) -> Result<Self, SelectionError> {
        let text = text.into();
        validate_ranges(&text, &ranges)?;
        Ok(Self::open(text, ranges))
    }

    /// A host with no open document
    pub fn detached() -> Self {
        Self {
            document: None,
            notifications: Vec::new(),
            edits: 0,
        }
    }

    fn open(text: String, ranges: Vec<Range<usize>>) -> Self {
        Self {
            document: Some(Document { text, ranges }),
            notifications: Vec::new(),
            edits: 0,
        }
    }

    pub fn document_text(&self) -> Option<&str> {
        self.document.as_ref().map(|doc| doc.text.as_str())
    }

    pub fn into_text(self) -> Option<String> {
        self.document.map(|doc| doc.text)
    }

    pub fn range(&self, selection: &Selection) -> Option<Range<usize>> {
        self.document
            .as_ref()
            .and_then(|doc| doc.ranges.get(selection.index).cloned())
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Number of replacements applied so far
    pub fn edit_count(&self) -> usize {
        self.edits
    }
}

#[async_trait]
impl EditorHost for BufferHost {
    fn active_selections(&self) -> Option<Vec<Selection>> {
        self.document.as_ref().map(|doc| {
            (0..doc.ranges.len())
                .map(|index| Selection { index })
                .collect()
        })
    }

    fn text(&self, selection: &Selection) -> String {
        match (&self.document, self.range(selection)) {
            (Some(doc), Some(range)) => doc.text[range].to_string(),
            _ => String::new(),
        }
    }

    async fn replace_text(&mut self, selection: &Selection, text: &str) -> Result<()> {
        let doc = self
            .document
            .as_mut()
            .ok_or_else(|| anyhow!("no document is open"))?;
        let range = doc
            .ranges
            .get(selection.index)
            .cloned()
            .ok_or_else(|| anyhow!("unknown selection {}", selection.index))?;

        doc.text.replace_range(range.clone(), text);
        let new_end = range.start + text.len();

        for (index, other) in doc.ranges.iter_mut().enumerate() {
            if index != selection.index && other.start >= range.end {
                other.start = new_end + (other.start - range.end);
                other.end = new_end + (other.end - range.end);
            }
        }
        doc.ranges[selection.index] = range.start..new_end;

        self.edits += 1;
        tracing::trace!(
            "Replaced selection {} ({:?}) with {} bytes",
            selection.index,
            range,
            text.len()
        );
        Ok(())
    }

    fn notify_info(&mut self, message: &str) {
        tracing::debug!("info notification: {}", message);
        self.notifications.push(Notification::Info(message.to_string()));
    }

    fn notify_error(&mut self, message: &str) {
        tracing::debug!("error notification: {}", message);
        self.notifications
            .push(Notification::Error(message.to_string()));
    }
}

fn validate_ranges(text: &str, ranges: &[Range<usize>]) -> Result<(), SelectionError> {
    for range in ranges {
        if range.start > range.end {
            return Err(SelectionError::Reversed {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > text.len() {
            return Err(SelectionError::OutOfBounds {
                start: range.start,
                end: range.end,
                len: text.len(),
            });
        }
        for boundary in [range.start, range.end] {
            if !text.is_char_boundary(boundary) {
                return Err(SelectionError::NotCharBoundary(boundary));
            }
        }
    }

    let mut sorted: Vec<_> = ranges.to_vec();
    sorted.sort_by_key(|range| (range.start, range.end));
    for pair in sorted.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(SelectionError::Overlap {
                first: pair[0].clone(),
                second: pair[1].clone(),
            });
        }
    }

    Ok(())
}

/// Byte span of every line, terminator included
fn line_spans(text: &str) -> Vec<Range<usize>> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|line| {
            let span = offset..offset + line.len();
            offset = span.end;
            span
        })
        .collect()
}

/// Bytes of lines `first..=last` (1-based), including the last line's terminator
pub fn line_range(text: &str, first: usize, last: usize) -> Result<Range<usize>, SelectionError> {
    let spans = line_spans(text);
    if first == 0 || first > last || last > spans.len() {
        return Err(SelectionError::InvalidLines {
            first,
            last,
            lines: spans.len(),
        });
    }
    Ok(spans[first - 1].start..spans[last - 1].end)
}

/// One range per line, without its `\n` or `\r\n` terminator
pub fn each_line(text: &str) -> Vec<Range<usize>> {
    line_spans(text)
        .into_iter()
        .map(|span| {
            let line = &text[span.clone()];
            let content = line
                .strip_suffix('\n')
                .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
                .unwrap_or(line);
            span.start..span.start + content.len()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_whole_document_selection() {
        let mut host = BufferHost::new("abc");
        let selections = host.active_selections().unwrap();
        assert_eq!(selections.len(), 1);
        assert_eq!(host.text(&selections[0]), "abc");

        host.replace_text(&selections[0], "cba").await.unwrap();
        assert_eq!(host.document_text(), Some("cba"));
        assert_eq!(host.edit_count(), 1);
    }

    #[tokio::test]
    async fn test_later_ranges_shift_after_replacement() {
        let mut host = BufferHost::with_ranges("one two three", vec![0..3, 4..7, 8..13]).unwrap();
        let selections = host.active_selections().unwrap();

        host.replace_text(&selections[0], "ONE!!").await.unwrap();
        assert_eq!(host.text(&selections[1]), "two");
        assert_eq!(host.text(&selections[2]), "three");

        host.replace_text(&selections[1], "2").await.unwrap();
        assert_eq!(host.text(&selections[2]), "three");
        assert_eq!(host.document_text(), Some("ONE!! 2 three"));
        assert_eq!(host.range(&selections[0]), Some(0..5));
    }

    #[tokio::test]
    async fn test_out_of_order_selections_keep_earlier_text() {
        let mut host = BufferHost::with_ranges("aa bb", vec![3..5, 0..2]).unwrap();
        let selections = host.active_selections().unwrap();

        host.replace_text(&selections[0], "BBBB").await.unwrap();
        assert_eq!(host.text(&selections[1]), "aa");

        host.replace_text(&selections[1], "A").await.unwrap();
        assert_eq!(host.document_text(), Some("A BBBB"));
        assert_eq!(host.text(&selections[0]), "BBBB");
    }

    #[tokio::test]
    async fn test_empty_selection_insertion() {
        let mut host = BufferHost::with_ranges("ab", vec![1..1, 1..2]).unwrap();
        let selections = host.active_selections().unwrap();
        assert_eq!(host.text(&selections[0]), "");

        host.replace_text(&selections[0], "--").await.unwrap();
        assert_eq!(host.text(&selections[1]), "b");
        assert_eq!(host.document_text(), Some("a--b"));
    }

    #[test]
    fn test_range_validation() {
        assert_eq!(
            BufferHost::with_ranges("abc", vec![2..1]).unwrap_err(),
            SelectionError::Reversed { start: 2, end: 1 }
        );
        assert!(matches!(
            BufferHost::with_ranges("abc", vec![0..4]).unwrap_err(),
            SelectionError::OutOfBounds { len: 3, .. }
        ));
        assert_eq!(
            BufferHost::with_ranges("é", vec![0..1]).unwrap_err(),
            SelectionError::NotCharBoundary(1)
        );
        assert!(matches!(
            BufferHost::with_ranges("abcdef", vec![0..3, 2..4]).unwrap_err(),
            SelectionError::Overlap { .. }
        ));
        assert!(BufferHost::with_ranges("abcdef", vec![3..6, 0..3]).is_ok());
    }

    #[tokio::test]
    async fn test_detached_host_has_no_selections() {
        let mut host = BufferHost::detached();
        assert!(host.active_selections().is_none());
        assert!(host.document_text().is_none());
        assert!(host
            .replace_text(&Selection { index: 0 }, "x")
            .await
            .is_err());
    }

    #[test]
    fn test_notifications_are_recorded() {
        let mut host = BufferHost::new("");
        host.notify_info("hello");
        host.notify_error("boom");
        assert_eq!(
            host.notifications(),
            &[
                Notification::Info("hello".to_string()),
                Notification::Error("boom".to_string())
            ]
        );
    }

    #[test]
    fn test_line_range() {
        let text = "first\nsecond\nthird";
        assert_eq!(&text[line_range(text, 2, 2).unwrap()], "second\n");
        assert_eq!(&text[line_range(text, 2, 3).unwrap()], "second\nthird");
        assert_eq!(&text[line_range(text, 1, 1).unwrap()], "first\n");
        assert!(matches!(
            line_range(text, 0, 1),
            Err(SelectionError::InvalidLines { lines: 3, .. })
        ));
        assert!(line_range(text, 3, 4).is_err());
        assert!(line_range(text, 3, 2).is_err());
    }

    #[test]
    fn test_each_line_strips_terminators() {
        let text = "a\r\nbc\n\nd";
        let lines: Vec<_> = each_line(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(lines, vec!["a", "bc", "", "d"]);
        assert!(each_line("").is_empty());
    }
}
