//! Line classification
//!
//! Each input line is categorized on its own, without looking at its
//! neighbours. Rules are tried in priority order: heading, list item,
//! table row, plain text. Inside an open table a pipe line with a `-` in
//! any cell is a separator row first, so `---|---` does not read as a
//! list item.

use super::blocks::Row;

/// How the level of a `#` line is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeadingRule {
    /// Level is the 1-based character position of the last `#` in the line,
    /// and the heading text is whatever follows that character.
    ///
    /// `"# intro # notes"` therefore produces level 9 with text `"notes"`.
    #[default]
    LastHashPosition,

    /// Level is the length of the leading run of `#` characters, and the
    /// heading text is whatever follows that run.
    LeadingRun,
}

/// Classification of a single line, with its extracted payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// A `#` line
    Heading { level: usize, text: String },
    /// A `*`, `+` or `-` line
    ListItem { text: String },
    /// A line containing `|`
    TableRow {
        /// Cells with leading/trailing pipe artifacts removed
        cells: Row,
        /// Whether any cell contains `-` (alignment marker row)
        separator: bool,
    },
    /// Anything else, verbatim
    PlainText { text: String },
}

/// Classify one line (without its trailing newline)
pub fn classify_line(line: &str, rule: HeadingRule) -> LineKind {
    if line.starts_with('#') {
        let (level, text) = match rule {
            HeadingRule::LastHashPosition => last_hash_heading(line),
            HeadingRule::LeadingRun => leading_run_heading(line),
        };
        return LineKind::Heading {
            level,
            text: text.trim().to_string(),
        };
    }

    if line.starts_with(['*', '+', '-']) {
        // All three markers are ASCII, so byte 1 is a char boundary
        return LineKind::ListItem {
            text: line[1..].trim().to_string(),
        };
    }

    if line.contains('|') {
        let cells = split_cells(line);
        let separator = cells.iter().any(|cell| cell.contains('-'));
        return LineKind::TableRow { cells, separator };
    }

    LineKind::PlainText {
        text: line.to_string(),
    }
}

/// Classify one line while a table is being accumulated
///
/// Separator rows are recognized before the list-item rule; everything
/// else classifies as in [`classify_line`].
pub fn classify_line_in_table(line: &str, rule: HeadingRule) -> LineKind {
    if !line.starts_with('#') && line.contains('|') {
        let cells = split_cells(line);
        if cells.iter().any(|cell| cell.contains('-')) {
            return LineKind::TableRow {
                cells,
                separator: true,
            };
        }
    }
    classify_line(line, rule)
}

/// Level and remainder using the position of the last `#`
fn last_hash_heading(line: &str) -> (usize, &str) {
    // Caller guarantees the line starts with '#', so rfind always succeeds
    let byte_index = line.rfind('#').unwrap_or(0);
    let level = line[..byte_index].chars().count() + 1;
    (level, &line[byte_index + 1..])
}

/// Level and remainder using the leading run of `#`
fn leading_run_heading(line: &str) -> (usize, &str) {
    let rest = line.trim_start_matches('#');
    (line.len() - rest.len(), rest)
}

/// Split a pipe-delimited line into trimmed cells
///
/// An empty first cell and an empty last cell are dropped; empty cells in
/// between are kept.
pub fn split_cells(line: &str) -> Row {
    let mut cells: Row = line.split('|').map(|cell| cell.trim().to_string()).collect();

    if cells.first().is_some_and(String::is_empty) {
        cells.remove(0);
    }
    if cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }

    cells
}
