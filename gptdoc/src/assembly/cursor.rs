//! Insertion cursor

/// Strictly increasing insertion index into the target block sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    start: usize,
    position: usize,
}

impl Cursor {
    /// Cursor positioned immediately after the anchor at `anchor_index`
    pub fn after_anchor(anchor_index: usize) -> Self {
        Self::at(anchor_index + 1)
    }

    /// Cursor positioned at `index` (used for the sentinel position)
    pub fn at(index: usize) -> Self {
        Self {
            start: index,
            position: index,
        }
    }

    /// Index the next block will be inserted at
    pub fn position(&self) -> usize {
        self.position
    }

    /// Index the cursor started at
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of blocks emitted so far
    pub fn advanced(&self) -> usize {
        self.position - self.start
    }

    /// Move past one emitted block
    pub fn advance(&mut self) {
        self.position += 1;
    }
}
