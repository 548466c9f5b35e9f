//! In-memory document model
//!
//! A [`Body`] is an ordered list of top-level elements (paragraphs,
//! headings, list items and tables) that always ends with an empty
//! paragraph, the sentinel. New content is inserted in front of the
//! sentinel unless an anchor says otherwise.

use crate::assembly::{DocumentSink, Row};
use std::fmt;
use thiserror::Error;

/// Highest heading level the document format supports
pub const MAX_HEADING_LEVEL: usize = 6;

/// Stable identifier of a top-level element
///
/// Ids survive insertions and removals around the element, unlike indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// List item glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Bullet,
    Number,
}

/// Content of a top-level element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// A paragraph, optionally styled as a heading
    Paragraph {
        /// Paragraph text
        text: String,
        /// Heading level (1..=6) if the paragraph is a heading
        heading: Option<usize>,
    },

    /// A single list item
    ListItem {
        /// Item text
        text: String,
        /// Glyph drawn in front of the item
        glyph: Glyph,
    },

    /// A table of plain-text cells, all rows the same width
    Table {
        /// Rows of cells
        rows: Vec<Row>,
    },
}

impl ElementKind {
    /// Plain paragraph with the given text
    pub fn paragraph(text: impl Into<String>) -> Self {
        ElementKind::Paragraph {
            text: text.into(),
            heading: None,
        }
    }

    /// Heading paragraph with the given level
    pub fn heading(level: usize, text: impl Into<String>) -> Self {
        ElementKind::Paragraph {
            text: text.into(),
            heading: Some(level),
        }
    }

    /// Bullet list item
    pub fn bullet(text: impl Into<String>) -> Self {
        ElementKind::ListItem {
            text: text.into(),
            glyph: Glyph::Bullet,
        }
    }

    /// Text of a paragraph or list item; `None` for tables
    pub fn text(&self) -> Option<&str> {
        match self {
            ElementKind::Paragraph { text, .. } | ElementKind::ListItem { text, .. } => Some(text),
            ElementKind::Table { .. } => None,
        }
    }
}

/// A top-level element with its stable id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
}

/// Errors raised while inserting into a [`Body`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Heading level outside 1..=MAX_HEADING_LEVEL
    #[error("Heading level {level} is out of range (supported: 1-{max})")]
    HeadingLevelOutOfRange {
        /// Requested level
        level: usize,
        /// Highest supported level
        max: usize,
    },

    /// Insertion index past the end of the body
    #[error("Insertion index {index} is out of bounds for a body of {len} elements")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Anchor does not name an element of this body
    #[error("Element {0} does not exist in the document")]
    UnknownElement(ElementId),

    /// Table insertion with no rows or no columns
    #[error("Cannot insert a table without rows or columns")]
    EmptyTable,
}

/// Ordered top-level content of a document
#[derive(Debug, Clone)]
pub struct Body {
    elements: Vec<Element>,
    next_id: u64,
}

impl Body {
    /// Create a body holding only the sentinel paragraph
    pub fn new() -> Self {
        let mut body = Self {
            elements: Vec::new(),
            next_id: 0,
        };
        let sentinel = body.allocate(ElementKind::paragraph(""));
        body.elements.push(sentinel);
        body
    }

    /// Number of top-level elements, sentinel included
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the body holds nothing but the sentinel
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    /// All elements in document order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Element with the given id
    pub fn find(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    /// Current index of the element with the given id
    pub fn position(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|element| element.id == id)
    }

    /// Insert an element at `index`, shifting later elements down
    pub fn insert(&mut self, index: usize, kind: ElementKind) -> Result<ElementId, SinkError> {
        if index > self.elements.len() {
            return Err(SinkError::IndexOutOfBounds {
                index,
                len: self.elements.len(),
            });
        }
        let element = self.allocate(kind);
        let id = element.id;
        self.elements.insert(index, element);
        Ok(id)
    }

    /// Insert an element in front of the sentinel
    pub fn append(&mut self, kind: ElementKind) -> ElementId {
        let element = self.allocate(kind);
        let id = element.id;
        let index = self.sentinel_index();
        self.elements.insert(index, element);
        id
    }

    /// Count of table elements
    pub fn table_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|element| matches!(element.kind, ElementKind::Table { .. }))
            .count()
    }

    /// Total whitespace-separated words across all text and cells
    pub fn word_count(&self) -> usize {
        self.elements
            .iter()
            .map(|element| match &element.kind {
                ElementKind::Paragraph { text, .. } | ElementKind::ListItem { text, .. } => {
                    text.split_whitespace().count()
                }
                ElementKind::Table { rows } => rows
                    .iter()
                    .flatten()
                    .map(|cell| cell.split_whitespace().count())
                    .sum(),
            })
            .sum()
    }

    fn allocate(&mut self, kind: ElementKind) -> Element {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        Element { id, kind }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

/// Pad or truncate every row to the width of the first row
fn reconcile_rows(rows: &[Row]) -> Result<Vec<Row>, SinkError> {
    let width = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(SinkError::EmptyTable),
    };

    let ragged = rows.iter().filter(|row| row.len() != width).count();
    if ragged > 0 {
        log::debug!("Reconciling {} ragged table rows to {} columns", ragged, width);
    }

    Ok(rows
        .iter()
        .map(|row| {
            let mut cells: Row = row.iter().take(width).cloned().collect();
            cells.resize(width, String::new());
            cells
        })
        .collect())
}

impl DocumentSink for Body {
    type Anchor = ElementId;
    type Error = SinkError;

    fn index_of(&self, anchor: &ElementId) -> Result<usize, SinkError> {
        self.position(*anchor)
            .ok_or(SinkError::UnknownElement(*anchor))
    }

    fn sentinel_index(&self) -> usize {
        self.elements.len().saturating_sub(1)
    }

    fn insert_heading_at(&mut self, index: usize, level: usize, text: &str) -> Result<(), SinkError> {
        if !(1..=MAX_HEADING_LEVEL).contains(&level) {
            return Err(SinkError::HeadingLevelOutOfRange {
                level,
                max: MAX_HEADING_LEVEL,
            });
        }
        self.insert(index, ElementKind::heading(level, text))?;
        Ok(())
    }

    fn insert_list_item_at(&mut self, index: usize, text: &str) -> Result<(), SinkError> {
        self.insert(index, ElementKind::bullet(text))?;
        Ok(())
    }

    fn insert_paragraph_at(&mut self, index: usize, text: &str) -> Result<(), SinkError> {
        self.insert(index, ElementKind::paragraph(text))?;
        Ok(())
    }

    fn insert_table_at(&mut self, index: usize, rows: &[Row]) -> Result<(), SinkError> {
        let rows = reconcile_rows(rows)?;
        self.insert(index, ElementKind::Table { rows })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_new_body_has_sentinel() {
        let body = Body::new();
        assert_eq!(body.len(), 1);
        assert!(body.is_empty());
        assert_eq!(body.sentinel_index(), 0);
        assert_eq!(body.elements()[0].kind, ElementKind::paragraph(""));
    }

    #[test]
    fn test_append_goes_before_sentinel() {
        let mut body = Body::new();
        let sentinel = body.elements()[0].id;
        body.append(ElementKind::paragraph("one"));
        body.append(ElementKind::paragraph("two"));
        assert_eq!(body.len(), 3);
        assert_eq!(body.position(sentinel), Some(2));
        assert_eq!(body.get(1).and_then(|e| e.kind.text()), Some("two"));
    }

    #[test]
    fn test_ids_are_stable_across_inserts() {
        let mut body = Body::new();
        let first = body.append(ElementKind::paragraph("first"));
        body.insert(0, ElementKind::paragraph("zero")).unwrap();
        assert_eq!(body.index_of(&first), Ok(1));
    }

    #[test]
    fn test_heading_level_range() {
        let mut body = Body::new();
        assert!(body.insert_heading_at(0, 6, "ok").is_ok());
        assert_eq!(
            body.insert_heading_at(0, 7, "too deep"),
            Err(SinkError::HeadingLevelOutOfRange { level: 7, max: 6 })
        );
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let mut body = Body::new();
        assert_eq!(
            body.insert_paragraph_at(5, "x"),
            Err(SinkError::IndexOutOfBounds { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_table_rows_reconciled_to_first_row() {
        let mut body = Body::new();
        body.insert_table_at(0, &[row(&["a", "b"]), row(&["1"]), row(&["x", "y", "z"])])
            .unwrap();
        assert_eq!(
            body.elements()[0].kind,
            ElementKind::Table {
                rows: vec![row(&["a", "b"]), row(&["1", ""]), row(&["x", "y"])]
            }
        );
        assert_eq!(body.table_count(), 1);
    }

    #[test]
    fn test_empty_table_rejected() {
        let mut body = Body::new();
        assert_eq!(body.insert_table_at(0, &[]), Err(SinkError::EmptyTable));
        assert_eq!(
            body.insert_table_at(0, &[Row::new()]),
            Err(SinkError::EmptyTable)
        );
    }

    #[test]
    fn test_unknown_anchor() {
        let body = Body::new();
        assert_eq!(
            body.index_of(&ElementId(42)),
            Err(SinkError::UnknownElement(ElementId(42)))
        );
    }

    #[test]
    fn test_word_count() {
        let mut body = Body::new();
        body.append(ElementKind::heading(1, "Two words"));
        body.append(ElementKind::Table {
            rows: vec![row(&["a b", "c"])],
        });
        assert_eq!(body.word_count(), 5);
    }
}
