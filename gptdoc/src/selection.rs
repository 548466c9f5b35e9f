//! Text selection over a [`Body`]
//!
//! A selection is a list of ranges, each covering a whole element, a whole
//! table cell, or a character span inside one of them. The selected text and
//! the structural parent of the selection are captured eagerly so the body
//! can be mutated afterwards.

use crate::document_model::{Body, ElementId, ElementKind};
use std::str::FromStr;
use thiserror::Error;

/// Source of the user's current selection
pub trait SelectionProvider {
    /// Reference to the block the selection belongs to
    type Anchor;

    /// Concatenated text of the selection; `None` when nothing textual is selected
    fn selected_text(&self) -> Option<String>;

    /// Block that generated content should follow
    fn parent_anchor(&self) -> Option<Self::Anchor>;
}

/// Errors that can occur when resolving a selection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No element at index {0}")]
    NoElementAtIndex(usize),

    #[error("Element {0} does not exist in the document")]
    UnknownElement(ElementId),

    #[error("Element {0} is not a table")]
    NotATable(ElementId),

    #[error("Table {table} has no cell at row {row}, column {column}")]
    CellOutOfRange {
        table: ElementId,
        row: usize,
        column: usize,
    },

    #[error("Invalid selection '{0}' (expected INDEX, INDEX:START-END or INDEX@ROW,COL)")]
    InvalidSpec(String),
}

/// What a selection range points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    /// A top-level element
    Element(ElementId),
    /// One cell of a table element
    TableCell {
        table: ElementId,
        row: usize,
        column: usize,
    },
}

/// One selected range
///
/// Offsets count characters. `None` on both ends selects the whole target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRange {
    pub target: ElementRef,
    pub start: Option<usize>,
    pub end_inclusive: Option<usize>,
}

impl SelectedRange {
    /// Range covering the whole target
    pub fn whole(target: ElementRef) -> Self {
        Self {
            target,
            start: None,
            end_inclusive: None,
        }
    }

    fn is_partial(&self) -> bool {
        self.start.is_some() || self.end_inclusive.is_some()
    }

    /// Cut the selected characters out of `text`
    fn slice(&self, text: &str) -> String {
        let start = self.start.unwrap_or(0);
        let chars = text.chars().skip(start);
        match self.end_inclusive {
            Some(end) if end >= start => chars.take(end - start + 1).collect(),
            Some(_) => String::new(),
            None => chars.collect(),
        }
    }
}

/// Selection captured from a [`Body`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySelection {
    text: String,
    parent: Option<ElementId>,
}

impl BodySelection {
    /// Resolve `ranges` against `body`
    ///
    /// Whole paragraphs contribute their text followed by a newline; list
    /// items, table cells and partial ranges contribute only their text.
    /// Whole tables contribute no text. The parent is the element holding
    /// the last range, with table cells resolving to their table.
    pub fn capture(body: &Body, ranges: &[SelectedRange]) -> Result<Self, SelectionError> {
        let mut text = String::new();

        for range in ranges {
            match range.target {
                ElementRef::Element(id) => {
                    let element = body.find(id).ok_or(SelectionError::UnknownElement(id))?;
                    match &element.kind {
                        ElementKind::Paragraph { text: content, .. } => {
                            text.push_str(&range.slice(content));
                            if !range.is_partial() {
                                text.push('\n');
                            }
                        }
                        ElementKind::ListItem { text: content, .. } => {
                            text.push_str(&range.slice(content));
                        }
                        ElementKind::Table { .. } => {}
                    }
                }
                ElementRef::TableCell { table, row, column } => {
                    let cell = table_cell(body, table, row, column)?;
                    text.push_str(&range.slice(cell));
                }
            }
        }

        let parent = ranges.last().map(|range| match range.target {
            ElementRef::Element(id) | ElementRef::TableCell { table: id, .. } => id,
        });

        log::debug!(
            "Captured selection of {} ranges ({} chars)",
            ranges.len(),
            text.chars().count()
        );

        Ok(Self { text, parent })
    }
}

fn table_cell(
    body: &Body,
    table: ElementId,
    row: usize,
    column: usize,
) -> Result<&str, SelectionError> {
    let element = body
        .find(table)
        .ok_or(SelectionError::UnknownElement(table))?;
    let ElementKind::Table { rows } = &element.kind else {
        return Err(SelectionError::NotATable(table));
    };
    rows.get(row)
        .and_then(|cells| cells.get(column))
        .map(String::as_str)
        .ok_or(SelectionError::CellOutOfRange { table, row, column })
}

impl SelectionProvider for BodySelection {
    type Anchor = ElementId;

    fn selected_text(&self) -> Option<String> {
        if self.text.is_empty() {
            None
        } else {
            Some(self.text.clone())
        }
    }

    fn parent_anchor(&self) -> Option<ElementId> {
        self.parent
    }
}

/// Command-line form of a selection range
///
/// `INDEX` selects a whole top-level element, `INDEX@ROW,COL` a table cell,
/// and either may be followed by `:START-END` (either bound optional) to
/// select a character span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpec {
    pub index: usize,
    pub cell: Option<(usize, usize)>,
    pub start: Option<usize>,
    pub end_inclusive: Option<usize>,
}

impl SelectionSpec {
    /// Turn the index-based spec into an id-based range for `body`
    pub fn resolve(&self, body: &Body) -> Result<SelectedRange, SelectionError> {
        let element = body
            .get(self.index)
            .ok_or(SelectionError::NoElementAtIndex(self.index))?;
        let target = match self.cell {
            Some((row, column)) => ElementRef::TableCell {
                table: element.id,
                row,
                column,
            },
            None => ElementRef::Element(element.id),
        };
        Ok(SelectedRange {
            target,
            start: self.start,
            end_inclusive: self.end_inclusive,
        })
    }
}

impl FromStr for SelectionSpec {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SelectionError::InvalidSpec(s.to_string());
        let number = |part: &str| part.trim().parse::<usize>().map_err(|_| invalid());
        let bound = |part: &str| {
            if part.trim().is_empty() {
                Ok(None)
            } else {
                number(part).map(Some)
            }
        };

        let (target, span) = match s.split_once(':') {
            Some((target, span)) => (target, Some(span)),
            None => (s, None),
        };

        let (index, cell) = match target.split_once('@') {
            Some((index, cell)) => {
                let (row, column) = cell.split_once(',').ok_or_else(invalid)?;
                (number(index)?, Some((number(row)?, number(column)?)))
            }
            None => (number(target)?, None),
        };

        let (start, end_inclusive) = match span {
            Some(span) => {
                let (start, end) = span.split_once('-').ok_or_else(invalid)?;
                (bound(start)?, bound(end)?)
            }
            None => (None, None),
        };

        Ok(Self {
            index,
            cell,
            start,
            end_inclusive,
        })
    }
}
