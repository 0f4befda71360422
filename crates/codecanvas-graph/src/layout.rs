use crate::config::LayoutConfig;
use codecanvas_core::{Block, BlockId, BlockKind, PanelState, Size, Vec2};
use rayon::prelude::*;

/// Position and size assigned to one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub size: Size,
}

pub trait Layouter {
    /// Returns one placement per block, in the same order as `blocks`.
    fn execute(&self, blocks: &[Block]) -> Vec<Placement>;
}

/// `max(min_width, longest_line * char_width + padding)`, counting characters.
pub fn estimate_width(code: &str, config: &LayoutConfig) -> f32 {
    let longest = code
        .split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    (longest as f32 * config.char_width + config.padding).max(config.min_width)
}

/// Height of the code area alone, before panels.
pub fn base_height(code: &str, config: &LayoutConfig) -> f32 {
    let lines = code.split('\n').count();
    (lines as f32 * config.line_height + config.header_height).max(config.min_height)
        + config.height_margin
}

pub fn panel_height(panels: &PanelState, config: &LayoutConfig) -> f32 {
    let heights = &config.panels;
    let mut extra = 0.0;
    if panels.is_details_open {
        extra += heights.details;
    }
    if panels.is_documentation_open {
        extra += heights.documentation;
    }
    if panels.is_testing_open {
        extra += heights.testing;
    }
    if panels.is_execution_open {
        extra += heights.execution;
    }
    if panels.is_syntax_errors_open {
        extra += panels.syntax_error_count as f32 * heights.syntax_error_row
            + heights.syntax_error_base;
    }
    extra
}

pub fn estimate_height(code: &str, panels: &PanelState, config: &LayoutConfig) -> f32 {
    base_height(code, config) + panel_height(panels, config)
}

/// Two fixed columns: top-level blocks by line order, class members beside them.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayouter {
    pub config: LayoutConfig,
    /// Block whose panel is being opened in this pass; its height is floored.
    pub opening: Option<BlockId>,
}

impl ColumnLayouter {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            opening: None,
        }
    }

    pub fn with_opening(mut self, id: Option<BlockId>) -> Self {
        self.opening = id;
        self
    }

    fn block_size(&self, block: &Block) -> Size {
        let width = estimate_width(&block.code, &self.config);
        let mut height = estimate_height(&block.code, &block.panels, &self.config);
        if self.opening.as_ref() == Some(&block.id) && block.panels.any_open() {
            height = height.max(self.config.panel_floor);
        }
        Size::new(width, height)
    }

    fn precompute_sizes(&self, blocks: &[Block]) -> Vec<Size> {
        // Indexed collect keeps input order regardless of scheduling.
        blocks.par_iter().map(|b| self.block_size(b)).collect()
    }

    fn stack(
        &self,
        order: &[usize],
        x: f32,
        start_y: f32,
        sizes: &[Size],
        placements: &mut [Placement],
    ) -> f32 {
        let mut y = start_y;
        for &idx in order {
            placements[idx] = Placement {
                position: Vec2::new(x, y),
                size: sizes[idx],
            };
            y += sizes[idx].height + self.config.uniform_spacing;
        }
        y
    }
}

impl Layouter for ColumnLayouter {
    fn execute(&self, blocks: &[Block]) -> Vec<Placement> {
        let sizes = self.precompute_sizes(blocks);
        let mut placements = vec![
            Placement {
                position: Vec2::default(),
                size: Size::default(),
            };
            blocks.len()
        ];

        let mut top_level: Vec<usize> = (0..blocks.len())
            .filter(|&i| blocks[i].kind.is_top_level())
            .collect();
        top_level.sort_by_key(|&i| blocks[i].line_number);
        let methods: Vec<usize> = (0..blocks.len())
            .filter(|&i| blocks[i].kind == BlockKind::ClassFunction)
            .collect();
        let statements: Vec<usize> = (0..blocks.len())
            .filter(|&i| blocks[i].kind == BlockKind::ClassStandalone)
            .collect();

        let cfg = &self.config;
        self.stack(
            &top_level,
            cfg.top_level_x(),
            cfg.start_y,
            &sizes,
            &mut placements,
        );
        let below_methods =
            self.stack(&methods, cfg.member_x(), cfg.start_y, &sizes, &mut placements);
        self.stack(
            &statements,
            cfg.member_x(),
            below_methods,
            &sizes,
            &mut placements,
        );

        placements
    }
}
