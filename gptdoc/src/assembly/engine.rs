//! Document assembly engine
//!
//! Drives the classifier and the table accumulator over a complete text
//! body in a single pass, inserting every emitted block into a
//! [`DocumentSink`] at a strictly increasing cursor.

use super::blocks::Block;
use super::classifier::{classify_line, classify_line_in_table, HeadingRule, LineKind};
use super::cursor::Cursor;
use super::sink::{insert_block_at, DocumentSink};
use super::table::TableAccumulator;

/// What happens to the non-table line that closes a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableTerminator {
    /// The closing line is consumed by the flush and never emitted
    #[default]
    Drop,
    /// The closing line is emitted as its own block after the table
    Reemit,
}

/// Behaviour switches for the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub heading_rule: HeadingRule,
    pub table_terminator: TableTerminator,
}

impl AssemblyOptions {
    /// Leading-`#` heading levels and no dropped lines after tables
    pub fn corrected() -> Self {
        Self {
            heading_rule: HeadingRule::LeadingRun,
            table_terminator: TableTerminator::Reemit,
        }
    }
}

/// Summary of one engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Index of the first inserted block
    pub start: usize,
    /// Index the next block would have been inserted at
    pub end: usize,
}

impl AssemblyReport {
    /// Number of blocks inserted
    pub fn blocks_inserted(&self) -> usize {
        self.end - self.start
    }
}

/// Single-pass Markdown-line to block converter
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyEngine {
    options: AssemblyOptions,
}

impl AssemblyEngine {
    /// Create an engine with the given options
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> AssemblyOptions {
        self.options
    }

    /// Convert `text` into blocks and insert them into `sink`
    ///
    /// Insertion starts right after `anchor`, or in front of the sink's
    /// sentinel when no anchor is given. The first sink failure aborts the
    /// run; blocks inserted before it stay in the document.
    ///
    /// # Parameters
    /// * `text` - Newline-delimited body to convert
    /// * `anchor` - Optional block to insert after
    /// * `sink` - Target document
    ///
    /// # Returns
    /// * `Ok(AssemblyReport)` - Cursor range used for insertion
    /// * `Err(S::Error)` - First failure raised by the sink
    pub fn run<S: DocumentSink + ?Sized>(
        &self,
        text: &str,
        anchor: Option<&S::Anchor>,
        sink: &mut S,
    ) -> Result<AssemblyReport, S::Error> {
        let mut cursor = match anchor {
            Some(anchor) => Cursor::after_anchor(sink.index_of(anchor)?),
            None => Cursor::at(sink.sentinel_index()),
        };
        let mut tables = TableAccumulator::new();

        log::debug!(
            "Assembling {} bytes starting at index {}",
            text.len(),
            cursor.position()
        );

        for line in text.split('\n') {
            let kind = if tables.is_accumulating() {
                classify_line_in_table(line, self.options.heading_rule)
            } else {
                classify_line(line, self.options.heading_rule)
            };
            match kind {
                LineKind::TableRow { cells, separator } => tables.push_row(cells, separator),
                kind => {
                    if tables.is_accumulating() {
                        flush_table(&mut tables, sink, &mut cursor)?;
                        if self.options.table_terminator == TableTerminator::Drop {
                            log::debug!("Dropping table-terminating line {:?}", line);
                            continue;
                        }
                    }
                    if let Some(block) = into_block(kind) {
                        emit(sink, &mut cursor, &block)?;
                    }
                }
            }
        }

        if tables.is_accumulating() {
            flush_table(&mut tables, sink, &mut cursor)?;
        }

        log::info!(
            "Inserted {} blocks at indices {}..{}",
            cursor.advanced(),
            cursor.start(),
            cursor.position()
        );

        Ok(AssemblyReport {
            start: cursor.start(),
            end: cursor.position(),
        })
    }
}

/// Convert `text` with the default options
pub fn assemble<S: DocumentSink + ?Sized>(
    text: &str,
    anchor: Option<&S::Anchor>,
    sink: &mut S,
) -> Result<AssemblyReport, S::Error> {
    AssemblyEngine::default().run(text, anchor, sink)
}

fn into_block(kind: LineKind) -> Option<Block> {
    match kind {
        LineKind::Heading { level, text } => Some(Block::Heading { level, text }),
        LineKind::ListItem { text } => Some(Block::ListItem { text }),
        LineKind::PlainText { text } => Some(Block::Paragraph { text }),
        LineKind::TableRow { .. } => None,
    }
}

fn flush_table<S: DocumentSink + ?Sized>(
    tables: &mut TableAccumulator,
    sink: &mut S,
    cursor: &mut Cursor,
) -> Result<(), S::Error> {
    match tables.flush() {
        Some(table) => emit(sink, cursor, &table),
        None => Ok(()),
    }
}

fn emit<S: DocumentSink + ?Sized>(
    sink: &mut S,
    cursor: &mut Cursor,
    block: &Block,
) -> Result<(), S::Error> {
    log::trace!("{} at {}", block.kind_name(), cursor.position());
    insert_block_at(sink, cursor.position(), block)?;
    cursor.advance();
    Ok(())
}
