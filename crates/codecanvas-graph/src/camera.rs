use crate::config::ViewportConfig;
use codecanvas_core::{Block, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned box around a set of blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Box around `blocks`, counting each block as `block_height` tall.
pub fn bounding_box<'a>(
    blocks: impl IntoIterator<Item = &'a Block>,
    block_height: f32,
) -> Option<Bounds> {
    blocks.into_iter().fold(None, |acc, b| {
        let min = Vec2::new(b.x, b.y);
        let max = Vec2::new(b.x + b.width, b.y + block_height);
        Some(match acc {
            None => Bounds { min, max },
            Some(bounds) => Bounds {
                min: Vec2::new(bounds.min.x.min(min.x), bounds.min.y.min(min.y)),
                max: Vec2::new(bounds.max.x.max(max.x), bounds.max.y.max(max.y)),
            },
        })
    })
}

/// Zoom and canvas size that fit everything into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub zoom: f32,
    pub canvas_size: Size,
}

pub fn fit_to_bounds(bounds: &Bounds, viewport: Size, config: &ViewportConfig) -> FitResult {
    let content = Size::new(bounds.width(), bounds.height());
    // Division by a zero extent yields infinity, which the `min` discards.
    let zoom = (viewport.width / content.width)
        .min(viewport.height / content.height)
        .min(1.0)
        * config.fit_margin;
    FitResult {
        zoom,
        canvas_size: Size::new(
            (content.width / zoom).max(viewport.width / zoom),
            (content.height / zoom).max(viewport.height / zoom),
        ),
    }
}

/// Zoom and scroll that center one block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusResult {
    pub zoom: f32,
    pub scroll: Vec2,
}

pub fn focus_block(block: &Block, viewport: Size, config: &ViewportConfig) -> FocusResult {
    let width = if block.width > 0.0 {
        block.width
    } else {
        config.fallback_block_width
    };
    let height = if block.height > 0.0 {
        block.height
    } else {
        config.standard_block_height
    };
    let zoom = (viewport.width * config.focus_fill / width)
        .min(viewport.height * config.focus_fill / height)
        .min(config.max_focus_zoom);
    let center = Vec2::new(block.x + width / 2.0, block.y + height / 2.0);
    FocusResult {
        zoom,
        scroll: Vec2::new(
            (center.x * zoom - viewport.width / 2.0).max(0.0),
            (center.y * zoom - viewport.height / 2.0).max(0.0),
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Viewport state: zoom, scroll offset, logical canvas size and auto-zoom mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub zoom: f32,
    pub scroll: Vec2,
    pub canvas_size: Size,
    pub viewport: Size,
    pub auto_zoom: bool,
    pub auto_zoom_locked: bool,
    #[serde(skip)]
    config: ViewportConfig,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Camera {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            zoom: config.default_zoom,
            scroll: Vec2::default(),
            canvas_size: config.initial_canvas,
            viewport: config.viewport,
            auto_zoom: false,
            auto_zoom_locked: false,
            config,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Refit to `blocks` when auto-zoom is on. Returns the applied fit.
    pub fn auto_fit<'a>(
        &mut self,
        blocks: impl IntoIterator<Item = &'a Block>,
    ) -> Option<FitResult> {
        if !self.auto_zoom {
            return None;
        }
        self.fit(blocks)
    }

    /// Fit unconditionally; does nothing for an empty block set.
    pub fn fit<'a>(&mut self, blocks: impl IntoIterator<Item = &'a Block>) -> Option<FitResult> {
        let bounds = bounding_box(blocks, self.config.fit_block_height)?;
        let fit = fit_to_bounds(&bounds, self.viewport, &self.config);
        self.zoom = fit.zoom;
        self.canvas_size = fit.canvas_size;
        Some(fit)
    }

    pub fn focus(&mut self, block: &Block) -> FocusResult {
        let focus = focus_block(block, self.viewport, &self.config);
        self.zoom = focus.zoom;
        self.scroll = focus.scroll;
        focus
    }

    fn zoom_bounds(&self) -> (f32, f32) {
        if self.auto_zoom {
            (self.config.auto_min_zoom, self.config.auto_max_zoom)
        } else {
            (self.config.min_zoom, self.config.max_zoom)
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let (min, max) = self.zoom_bounds();
        self.zoom = zoom.clamp(min, max);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.config.zoom_step);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = self.config.default_zoom;
    }

    pub fn pan(&mut self, direction: PanDirection) {
        let step = self.config.pan_step;
        let (dx, dy) = match direction {
            PanDirection::Left => (-step, 0.0),
            PanDirection::Right => (step, 0.0),
            PanDirection::Up => (0.0, -step),
            PanDirection::Down => (0.0, step),
        };
        self.scroll = Vec2::new((self.scroll.x + dx).max(0.0), (self.scroll.y + dy).max(0.0));
    }

    /// Flip auto-zoom; ignored while locked. Returns the resulting mode.
    pub fn toggle_auto_zoom(&mut self) -> bool {
        if !self.auto_zoom_locked {
            self.auto_zoom = !self.auto_zoom;
        }
        self.auto_zoom
    }

    /// Locking forces auto-zoom off.
    pub fn toggle_auto_zoom_lock(&mut self) -> bool {
        self.auto_zoom_locked = !self.auto_zoom_locked;
        if self.auto_zoom_locked {
            self.auto_zoom = false;
        }
        self.auto_zoom_locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::block;
    use codecanvas_core::BlockKind;

    fn at(x: f32, y: f32, width: f32, height: f32) -> Block {
        let mut b = block("m.f", BlockKind::StandaloneFunction, 1);
        b.x = x;
        b.y = y;
        b.width = width;
        b.height = height;
        b
    }

    #[test]
    fn test_bounding_box_uses_fixed_height() {
        let blocks = [at(850.0, 100.0, 200.0, 500.0), at(1900.0, 400.0, 300.0, 140.0)];
        let bounds = bounding_box(&blocks, 100.0).unwrap();
        assert_eq!(bounds.min, Vec2::new(850.0, 100.0));
        assert_eq!(bounds.max, Vec2::new(2200.0, 500.0));
        let none: [Block; 0] = [];
        assert!(bounding_box(&none, 100.0).is_none());
    }

    #[test]
    fn test_fit_scales_down_large_content() {
        let bounds = Bounds {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(4000.0, 1000.0),
        };
        let fit = fit_to_bounds(&bounds, Size::new(2000.0, 1000.0), &ViewportConfig::default());
        assert!((fit.zoom - 0.45).abs() < 1e-6);
        assert!(fit.canvas_size.width >= 2000.0);
        assert!(fit.canvas_size.height >= 1000.0);
    }

    #[test]
    fn test_fit_never_zooms_past_one() {
        let bounds = Bounds {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(100.0, 100.0),
        };
        let fit = fit_to_bounds(&bounds, Size::new(2000.0, 1000.0), &ViewportConfig::default());
        assert!((fit.zoom - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_focus_centers_block() {
        let cfg = ViewportConfig::default();
        let viewport = Size::new(1000.0, 800.0);
        let focus = focus_block(&at(2000.0, 1000.0, 400.0, 0.0), viewport, &cfg);
        // Unmeasured height falls back to the standard block height.
        assert!((focus.zoom - 0.7).abs() < 1e-6);
        let center_x = (2000.0 + 200.0) * focus.zoom - focus.scroll.x;
        let center_y = (1000.0 + 75.0) * focus.zoom - focus.scroll.y;
        assert!((center_x - 500.0).abs() < 1e-3);
        assert!((center_y - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_focus_scroll_is_clamped() {
        let focus = focus_block(
            &at(0.0, 0.0, 200.0, 150.0),
            Size::new(1000.0, 800.0),
            &ViewportConfig::default(),
        );
        assert_eq!(focus.scroll, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_manual_zoom_and_pan() {
        let mut camera = Camera::default();
        assert_eq!(camera.zoom, 0.5);
        for _ in 0..30 {
            camera.zoom_in();
        }
        assert_eq!(camera.zoom, 2.0);
        for _ in 0..30 {
            camera.zoom_out();
        }
        assert_eq!(camera.zoom, 0.2);
        camera.reset_zoom();
        assert_eq!(camera.zoom, 0.5);

        camera.pan(PanDirection::Left);
        assert_eq!(camera.scroll, Vec2::new(0.0, 0.0));
        camera.pan(PanDirection::Down);
        camera.pan(PanDirection::Right);
        assert_eq!(camera.scroll, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_lock_forces_auto_zoom_off() {
        let mut camera = Camera::default();
        assert!(camera.toggle_auto_zoom());
        assert!(camera.toggle_auto_zoom_lock());
        assert!(!camera.auto_zoom);
        assert!(!camera.toggle_auto_zoom());

        let blocks = [at(0.0, 0.0, 200.0, 140.0)];
        assert!(camera.auto_fit(&blocks).is_none());
        camera.toggle_auto_zoom_lock();
        camera.toggle_auto_zoom();
        assert!(camera.auto_fit(&blocks).is_some());
    }
}
