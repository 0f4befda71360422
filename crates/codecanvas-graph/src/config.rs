use codecanvas_core::Size;
use serde::{Deserialize, Serialize};

/// Geometric constants used by sizing, stacking and connection anchoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub char_width: f32,
    pub padding: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub line_height: f32,
    pub header_height: f32,
    pub height_margin: f32,
    pub uniform_spacing: f32,
    pub column_width: f32,
    pub ide_width: f32,
    pub ide_gap: f32,
    pub start_y: f32,
    /// Columns between the top-level stack and the member stack.
    pub member_columns: f32,
    pub panels: PanelHeights,
    /// Minimum height of a block whose panel is being opened.
    pub panel_floor: f32,
    /// Vertical offset of the first code line inside the editor.
    pub editor_line_offset: f32,
    /// Vertical offset of a connection's end anchor below the block's top.
    pub anchor_offset: f32,
    pub fallback_anchor_inset: f32,
    pub fallback_anchor_drop: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            padding: 40.0,
            min_width: 200.0,
            min_height: 120.0,
            line_height: 20.0,
            header_height: 60.0,
            height_margin: 20.0,
            uniform_spacing: 40.0,
            column_width: 350.0,
            ide_width: 600.0,
            ide_gap: 250.0,
            start_y: 100.0,
            member_columns: 3.0,
            panels: PanelHeights::default(),
            panel_floor: 520.0,
            editor_line_offset: 40.0,
            anchor_offset: 25.0,
            fallback_anchor_inset: 20.0,
            fallback_anchor_drop: 50.0,
        }
    }
}

impl LayoutConfig {
    /// Column holding classes, functions and module-level code.
    pub fn top_level_x(&self) -> f32 {
        self.ide_width + self.ide_gap
    }

    /// Column holding methods and class-level statements.
    pub fn member_x(&self) -> f32 {
        self.top_level_x() + self.member_columns * self.column_width
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelHeights {
    pub details: f32,
    pub documentation: f32,
    pub testing: f32,
    pub execution: f32,
    pub syntax_error_row: f32,
    pub syntax_error_base: f32,
}

impl Default for PanelHeights {
    fn default() -> Self {
        Self {
            details: 400.0,
            documentation: 400.0,
            testing: 450.0,
            execution: 300.0,
            syntax_error_row: 24.0,
            syntax_error_base: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub viewport: Size,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Manual zoom range while auto-zoom is on.
    pub auto_min_zoom: f32,
    pub auto_max_zoom: f32,
    pub zoom_step: f32,
    pub default_zoom: f32,
    pub pan_step: f32,
    pub initial_canvas: Size,
    /// Share of the viewport a fitted graph may occupy.
    pub fit_margin: f32,
    /// Height assumed per block when fitting the whole graph.
    pub fit_block_height: f32,
    /// Share of the viewport a focused block may occupy.
    pub focus_fill: f32,
    pub max_focus_zoom: f32,
    /// Height used for focus when a block has not been measured yet.
    pub standard_block_height: f32,
    pub fallback_block_width: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(1920.0, 1080.0),
            min_zoom: 0.2,
            max_zoom: 2.0,
            auto_min_zoom: 0.5,
            auto_max_zoom: 3.0,
            zoom_step: 0.1,
            default_zoom: 0.5,
            pan_step: 100.0,
            initial_canvas: Size::new(3000.0, 2000.0),
            fit_margin: 0.9,
            fit_block_height: 100.0,
            focus_fill: 0.7,
            max_focus_zoom: 0.7,
            standard_block_height: 150.0,
            fallback_block_width: 600.0,
        }
    }
}
