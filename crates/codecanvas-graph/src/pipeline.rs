use crate::DeriveError;
use crate::config::LayoutConfig;
use crate::layout::{ColumnLayouter, Layouter};
use codecanvas_core::{Block, BlockDescriptor, BlockId, BlockKind, SourceParser};
use std::collections::{HashMap, HashSet};

/// How geometry of blocks that survive re-derivation is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryMerge {
    /// Recompute `x`, `y` and `width` from scratch.
    #[default]
    Fresh,
    /// Keep the previous `x` and `width` of surviving ids; `y` is restacked.
    PreserveSurviving,
}

/// Inputs that carry state from the previous derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeriveOptions<'a> {
    pub previous: &'a [Block],
    pub merge: GeometryMerge,
    /// Block whose panel is being opened by this derivation.
    pub opening: Option<&'a BlockId>,
}

/// Parse `source` and turn the descriptors into positioned blocks.
///
/// Output order is top-level blocks by line, then methods, then class-level
/// statements. `is_visible` and panel flags of surviving ids are always carried
/// over from `options.previous`.
pub fn derive_blocks<P>(
    parser: &P,
    source: &str,
    file_name: &str,
    config: &LayoutConfig,
    options: DeriveOptions<'_>,
) -> Result<Vec<Block>, DeriveError>
where
    P: SourceParser + ?Sized,
{
    let descriptors = parser.parse(source, file_name)?;
    let blocks = arrange(descriptors, config, options)?;
    tracing::debug!(
        "Derived {} blocks for {} ({:?})",
        blocks.len(),
        file_name,
        options.merge
    );
    Ok(blocks)
}

/// Lay out descriptors that were already parsed, e.g. on a worker thread.
pub fn arrange(
    descriptors: Vec<BlockDescriptor>,
    config: &LayoutConfig,
    options: DeriveOptions<'_>,
) -> Result<Vec<Block>, DeriveError> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        if !seen.insert(&descriptor.id) {
            tracing::error!("Parser produced duplicate block id {}", descriptor.id);
            return Err(DeriveError::DuplicateBlockId(descriptor.id.clone()));
        }
    }

    let previous: HashMap<&BlockId, &Block> =
        options.previous.iter().map(|b| (&b.id, b)).collect();

    let mut blocks: Vec<Block> = descriptors
        .into_iter()
        .map(|descriptor| {
            let mut block = Block::from_descriptor(descriptor);
            if let Some(old) = previous.get(&block.id) {
                block.is_visible = old.is_visible;
                block.panels = old.panels;
            }
            block
        })
        .collect();

    let layouter = ColumnLayouter::new(config.clone()).with_opening(options.opening.cloned());
    let placements = layouter.execute(&blocks);
    for (block, placement) in blocks.iter_mut().zip(placements) {
        block.x = placement.position.x;
        block.y = placement.position.y;
        block.width = placement.size.width;
        block.height = placement.size.height;
        if options.merge == GeometryMerge::PreserveSurviving
            && let Some(old) = previous.get(&block.id)
        {
            block.x = old.x;
            block.width = old.width;
        }
    }

    blocks.sort_by(|a, b| {
        column_rank(a.kind)
            .cmp(&column_rank(b.kind))
            .then(a.y.total_cmp(&b.y))
    });

    Ok(blocks)
}

fn column_rank(kind: BlockKind) -> u8 {
    match kind {
        BlockKind::Class | BlockKind::Code | BlockKind::StandaloneFunction => 0,
        BlockKind::ClassFunction => 1,
        BlockKind::ClassStandalone => 2,
    }
}
