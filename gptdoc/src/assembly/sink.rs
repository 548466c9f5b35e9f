//! Document sink contract
//!
//! The sink owns the persistent document. It validates heading levels
//! against what its format supports and reconciles ragged table rows; the
//! engine passes everything through unmodified.

use super::blocks::{Block, Row};

/// Destination for assembled blocks
pub trait DocumentSink {
    /// Reference to an existing block that insertion can start after
    type Anchor;

    /// Failure raised by any sink operation
    type Error;

    /// Current index of the anchored block
    fn index_of(&self, anchor: &Self::Anchor) -> Result<usize, Self::Error>;

    /// Index of the trailing sentinel block that new content goes in front of
    fn sentinel_index(&self) -> usize;

    /// Insert a heading at `index`
    fn insert_heading_at(&mut self, index: usize, level: usize, text: &str)
        -> Result<(), Self::Error>;

    /// Insert a bullet list item at `index`
    fn insert_list_item_at(&mut self, index: usize, text: &str) -> Result<(), Self::Error>;

    /// Insert a paragraph at `index`
    fn insert_paragraph_at(&mut self, index: usize, text: &str) -> Result<(), Self::Error>;

    /// Insert a table at `index`
    fn insert_table_at(&mut self, index: usize, rows: &[Row]) -> Result<(), Self::Error>;
}

/// Dispatch one block to the matching sink operation
pub fn insert_block_at<S: DocumentSink + ?Sized>(
    sink: &mut S,
    index: usize,
    block: &Block,
) -> Result<(), S::Error> {
    match block {
        Block::Heading { level, text } => sink.insert_heading_at(index, *level, text),
        Block::ListItem { text } => sink.insert_list_item_at(index, text),
        Block::Paragraph { text } => sink.insert_paragraph_at(index, text),
        Block::Table { rows } => sink.insert_table_at(index, rows),
    }
}

/// Sink that only records what it was asked to insert
///
/// Anchors are plain indices. Used for dry runs, where the blocks are
/// printed instead of materialized.
#[derive(Debug, Clone, Default)]
pub struct BlockLog {
    sentinel: usize,
    entries: Vec<(usize, Block)>,
}

impl BlockLog {
    /// Create an empty log whose sentinel sits at `sentinel`
    pub fn with_sentinel(sentinel: usize) -> Self {
        Self {
            sentinel,
            entries: Vec::new(),
        }
    }

    /// Recorded `(index, block)` pairs in insertion order
    pub fn entries(&self) -> &[(usize, Block)] {
        &self.entries
    }

    /// Consume the log, keeping only the blocks
    pub fn into_blocks(self) -> Vec<Block> {
        self.entries.into_iter().map(|(_, block)| block).collect()
    }
}

impl DocumentSink for BlockLog {
    type Anchor = usize;
    type Error = std::convert::Infallible;

    fn index_of(&self, anchor: &usize) -> Result<usize, Self::Error> {
        Ok(*anchor)
    }

    fn sentinel_index(&self) -> usize {
        self.sentinel
    }

    fn insert_heading_at(&mut self, index: usize, level: usize, text: &str) -> Result<(), Self::Error> {
        self.entries.push((
            index,
            Block::Heading {
                level,
                text: text.to_string(),
            },
        ));
        Ok(())
    }

    fn insert_list_item_at(&mut self, index: usize, text: &str) -> Result<(), Self::Error> {
        self.entries.push((
            index,
            Block::ListItem {
                text: text.to_string(),
            },
        ));
        Ok(())
    }

    fn insert_paragraph_at(&mut self, index: usize, text: &str) -> Result<(), Self::Error> {
        self.entries.push((
            index,
            Block::Paragraph {
                text: text.to_string(),
            },
        ));
        Ok(())
    }

    fn insert_table_at(&mut self, index: usize, rows: &[Row]) -> Result<(), Self::Error> {
        self.entries.push((
            index,
            Block::Table {
                rows: rows.to_vec(),
            },
        ));
        Ok(())
    }
}
