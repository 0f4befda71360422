use codecanvas_core::{Block, BlockId, BlockKind};

/// Keyboard cursor over the block list, optionally filtered by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    current_index: Option<usize>,
    current_kind: Option<BlockKind>,
}

impl SelectionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_kind(&self) -> Option<BlockKind> {
        self.current_kind
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    fn filtered<'a>(&self, blocks: &'a [Block]) -> Vec<&'a Block> {
        blocks
            .iter()
            .filter(|b| self.current_kind.is_none_or(|kind| b.kind == kind))
            .collect()
    }

    /// Repeating the active filter advances; a new filter restarts at its first block.
    pub fn cycle(&mut self, kind: Option<BlockKind>, blocks: &[Block]) -> Option<BlockId> {
        if self.current_index.is_some() && self.current_kind == kind {
            return self.step(blocks, 1);
        }
        self.current_kind = kind;
        let filtered = self.filtered(blocks);
        if filtered.is_empty() {
            self.current_index = None;
            return None;
        }
        self.current_index = Some(0);
        Some(filtered[0].id.clone())
    }

    pub fn next(&mut self, blocks: &[Block]) -> Option<BlockId> {
        self.step(blocks, 1)
    }

    pub fn previous(&mut self, blocks: &[Block]) -> Option<BlockId> {
        self.step(blocks, -1)
    }

    fn step(&mut self, blocks: &[Block], delta: isize) -> Option<BlockId> {
        let filtered = self.filtered(blocks);
        if filtered.is_empty() {
            self.current_index = None;
            return None;
        }
        let len = filtered.len() as isize;
        let next = match self.current_index {
            Some(idx) => (idx as isize + delta).rem_euclid(len),
            None if delta >= 0 => 0,
            None => len - 1,
        } as usize;
        self.current_index = Some(next);
        Some(filtered[next].id.clone())
    }

    /// Block under the cursor, if the index still points inside the filtered list.
    pub fn current(&self, blocks: &[Block]) -> Option<BlockId> {
        let idx = self.current_index?;
        self.filtered(blocks).get(idx).map(|b| b.id.clone())
    }
}
