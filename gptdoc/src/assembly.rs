//! Document assembly engine
//!
//! Turns a flat Markdown-like text body into structured blocks and inserts
//! them into a document at a given position.
//!
//! ```text
//! text -> lines -> classify_line -> TableAccumulator -> AssemblyEngine -> DocumentSink
//! ```

mod blocks;
mod classifier;
mod cursor;
mod engine;
mod sink;
mod table;

pub use blocks::{Block, Row};
pub use classifier::{classify_line, classify_line_in_table, split_cells, HeadingRule, LineKind};
pub use cursor::Cursor;
pub use engine::{assemble, AssemblyEngine, AssemblyOptions, AssemblyReport, TableTerminator};
pub use sink::{insert_block_at, BlockLog, DocumentSink};
pub use table::{ParserState, TableAccumulator};
