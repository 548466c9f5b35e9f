//! Block-level output of the assembly engine
//!
//! Blocks are transient: the engine builds one, hands it to a
//! [`DocumentSink`](super::DocumentSink) and keeps nothing afterwards.

/// One table row: cell strings in column order
///
/// Rows inside a table are not required to have equal length.
pub type Row = Vec<String>;

/// One structural unit materialized into the target document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A heading
    Heading {
        /// Heading level (1 = h1, 2 = h2, etc.)
        level: usize,
        /// Heading text, already trimmed
        text: String,
    },

    /// A bullet list item
    ListItem {
        /// Item text, marker removed and trimmed
        text: String,
    },

    /// A plain paragraph (may be empty)
    Paragraph {
        /// The source line verbatim
        text: String,
    },

    /// A table built from consecutive pipe-delimited lines
    Table {
        /// Buffered rows in input order, separator rows excluded
        rows: Vec<Row>,
    },
}

impl Block {
    /// Human-readable name of the block kind, used in log output
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "Heading",
            Block::ListItem { .. } => "ListItem",
            Block::Paragraph { .. } => "Paragraph",
            Block::Table { .. } => "Table",
        }
    }
}
