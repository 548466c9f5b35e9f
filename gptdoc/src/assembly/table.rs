//! Table accumulation state machine
//!
//! Consecutive table rows are buffered until a non-table line (or the end
//! of input) closes the table. Separator rows are recognized but never
//! buffered.

use super::blocks::{Block, Row};

/// Whether the accumulator is currently inside a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Idle,
    Accumulating,
}

/// Buffers table rows between the first table line and the flush
#[derive(Debug, Default)]
pub struct TableAccumulator {
    state: ParserState,
    pending_rows: Vec<Row>,
}

impl TableAccumulator {
    /// Create an idle accumulator with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Rows buffered so far
    pub fn pending_rows(&self) -> &[Row] {
        &self.pending_rows
    }

    /// Whether a table is open
    pub fn is_accumulating(&self) -> bool {
        self.state == ParserState::Accumulating
    }

    /// Feed one table row
    ///
    /// Any table row (separator or not) opens the table; only non-separator
    /// rows are buffered.
    pub fn push_row(&mut self, cells: Row, separator: bool) {
        self.state = ParserState::Accumulating;
        if !separator {
            self.pending_rows.push(cells);
        }
    }

    /// Close the table and return to `Idle`
    ///
    /// Returns `Some(Block::Table)` when the buffer is non-empty and its first
    /// row has at least one column; otherwise nothing is produced. Either way
    /// the buffer is emptied.
    pub fn flush(&mut self) -> Option<Block> {
        self.state = ParserState::Idle;
        let rows = std::mem::take(&mut self.pending_rows);

        match rows.first() {
            Some(first) if !first.is_empty() => Some(Block::Table { rows }),
            _ => {
                if !rows.is_empty() {
                    log::debug!("Discarding table of {} rows with no columns", rows.len());
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_starts_idle() {
        let acc = TableAccumulator::new();
        assert_eq!(acc.state(), ParserState::Idle);
        assert!(acc.pending_rows().is_empty());
    }

    #[test]
    fn test_rows_accumulate_in_order() {
        let mut acc = TableAccumulator::new();
        acc.push_row(row(&["A", "B"]), false);
        acc.push_row(row(&["1", "2"]), false);
        assert_eq!(acc.state(), ParserState::Accumulating);

        let block = acc.flush();
        assert_eq!(
            block,
            Some(Block::Table {
                rows: vec![row(&["A", "B"]), row(&["1", "2"])]
            })
        );
        assert_eq!(acc.state(), ParserState::Idle);
        assert!(acc.pending_rows().is_empty());
    }

    #[test]
    fn test_separator_rows_are_not_buffered() {
        let mut acc = TableAccumulator::new();
        acc.push_row(row(&["Name", "Age"]), false);
        acc.push_row(row(&["---", "---"]), true);
        assert_eq!(acc.pending_rows(), &[row(&["Name", "Age"])]);
    }

    #[test]
    fn test_separator_alone_opens_empty_table() {
        let mut acc = TableAccumulator::new();
        acc.push_row(row(&["---"]), true);
        assert!(acc.is_accumulating());
        assert!(acc.pending_rows().is_empty());
        assert_eq!(acc.flush(), None);
        assert_eq!(acc.state(), ParserState::Idle);
    }

    #[test]
    fn test_zero_column_first_row_flushes_nothing() {
        let mut acc = TableAccumulator::new();
        acc.push_row(Row::new(), false);
        acc.push_row(row(&["x"]), false);
        assert_eq!(acc.flush(), None);
        assert!(acc.pending_rows().is_empty());
    }

    #[test]
    fn test_ragged_rows_pass_through() {
        let mut acc = TableAccumulator::new();
        acc.push_row(row(&["a", "b", "c"]), false);
        acc.push_row(row(&["1"]), false);
        let Some(Block::Table { rows }) = acc.flush() else {
            panic!("expected a table");
        };
        assert_eq!(rows[1], row(&["1"]));
    }
}
