use codecanvas_core::{Block, BlockId, CoreError};
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

/// Position of a block inside a [`BlockGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockIndex(pub usize);

/// Blocks of one buffer with constant-time lookup by id.
#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: Vec<Block>,
    node_map: HashMap<BlockId, BlockIndex>,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lookup, rejecting the first repeated id.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, CoreError> {
        let mut node_map = HashMap::with_capacity(blocks.len());
        for (idx, block) in blocks.iter().enumerate() {
            if node_map.insert(block.id.clone(), BlockIndex(idx)).is_some() {
                return Err(CoreError::DuplicateBlockId(block.id.clone()));
            }
        }
        Ok(Self { blocks, node_map })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn index_of(&self, id: &BlockId) -> Option<BlockIndex> {
        self.node_map.get(id).copied()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.index_of(id).map(|idx| &self.blocks[idx.0])
    }

    pub fn get_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        let idx = self.index_of(id)?;
        Some(&mut self.blocks[idx.0])
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable view for in-place edits. Ids must not be changed through it.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn top_level(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.kind.is_top_level())
    }

    /// Members of a class in stored order.
    pub fn members_of<'a>(&'a self, class_id: &'a BlockId) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks
            .iter()
            .filter(move |b| b.kind.is_class_member() && b.parent_class.as_ref() == Some(class_id))
    }

    pub fn parent_of(&self, id: &BlockId) -> Option<&Block> {
        let parent = self.get(id)?.parent_class.as_ref()?;
        self.get(parent)
    }
}

impl Index<BlockIndex> for BlockGraph {
    type Output = Block;

    fn index(&self, index: BlockIndex) -> &Self::Output {
        &self.blocks[index.0]
    }
}

impl IndexMut<BlockIndex> for BlockGraph {
    fn index_mut(&mut self, index: BlockIndex) -> &mut Self::Output {
        &mut self.blocks[index.0]
    }
}
