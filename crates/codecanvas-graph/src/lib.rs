//! Turns parser descriptors into a positioned block graph and keeps the
//! derived connection, visibility, camera and selection state consistent.

pub mod camera;
pub mod config;
pub mod connections;
pub mod graph;
pub mod layout;
pub mod pipeline;
pub mod selection;
pub mod visibility;

pub use camera::{Bounds, Camera, FitResult, FocusResult, PanDirection};
pub use config::{LayoutConfig, PanelHeights, ViewportConfig};
pub use connections::derive_connections;
pub use graph::{BlockGraph, BlockIndex};
pub use layout::{ColumnLayouter, Layouter, Placement};
pub use pipeline::{DeriveOptions, GeometryMerge, arrange, derive_blocks};
pub use selection::SelectionCursor;
pub use visibility::{VisibilityChange, VisibilityState};

use codecanvas_core::{BlockId, ParseError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(BlockId),
}
