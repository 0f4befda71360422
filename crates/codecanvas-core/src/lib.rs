use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod error;
pub mod kind;
pub mod panel;

pub use error::{ParseError, SyntaxIssue};
pub use kind::{BlockKind, ConnectionKind};
pub use panel::{PanelKind, PanelState};

/// Sentinel id standing for the primary text editor in connections and drags.
pub const EDITOR_ID: &str = "editor";

/// Dotted hierarchical path of a block, e.g. `file.py.ClassName.method`.
///
/// Hierarchy is encoded in the string only; relations between blocks are plain
/// fields (`parent_class`) resolved through a lookup map, never pointers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn editor() -> Self {
        Self(EDITOR_ID.to_string())
    }

    pub fn is_editor(&self) -> bool {
        self.0 == EDITOR_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of a nested construct: `{self}.{name}`.
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    /// Last dotted segment, used as a connector label.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Deterministic connection id derived from its endpoints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Editor containment edges reuse the target block's id.
    pub fn editor_to(end: &BlockId) -> Self {
        Self(end.0.clone())
    }

    pub fn between(start: &BlockId, end: &BlockId) -> Self {
        Self(format!("{}-{}", start.0, end.0))
    }

    pub fn with_discriminator(start: &BlockId, end: &BlockId, discriminator: &str) -> Self {
        Self(format!("{}-{}#{}", start.0, end.0, discriminator))
    }

    /// Prefix shared by every edge from `block` to one of its own members.
    pub fn member_prefix(block: &str) -> String {
        format!("{block}-{block}.")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Geometry-free record produced by a parser for one source construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<BlockId>,
    pub code: String,
    /// 1-based line of the construct's first line in the buffer.
    pub line_number: usize,
    pub author: String,
    pub location: String,
    pub file_type: String,
}

/// One positioned visual unit on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<BlockId>,
    pub line_number: usize,
    pub code: String,
    pub author: String,
    pub location: String,
    pub file_type: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub is_visible: bool,
    #[serde(flatten)]
    pub panels: PanelState,
}

impl Block {
    /// Lift a descriptor with zeroed geometry; layout fills the rest.
    pub fn from_descriptor(descriptor: BlockDescriptor) -> Self {
        Self {
            id: descriptor.id,
            kind: descriptor.kind,
            name: descriptor.name,
            parent_class: descriptor.parent_class,
            line_number: descriptor.line_number,
            code: descriptor.code,
            author: descriptor.author,
            location: descriptor.location,
            file_type: descriptor.file_type,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            is_visible: true,
            panels: PanelState::default(),
        }
    }

    /// Geometry-free view of this block, as a parser would report it.
    pub fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            id: self.id.clone(),
            kind: self.kind,
            name: self.name.clone(),
            parent_class: self.parent_class.clone(),
            code: self.code.clone(),
            line_number: self.line_number,
            author: self.author.clone(),
            location: self.location.clone(),
            file_type: self.file_type.clone(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_testing_open(&self) -> bool {
        self.panels.is_testing_open
    }

    pub fn code_lines(&self) -> impl Iterator<Item = &str> {
        self.code.split('\n')
    }
}

/// Directed, typed edge between two blocks or between the editor and a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub start: BlockId,
    pub end: BlockId,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub start_point: Vec2,
    pub end_point: Vec2,
    pub from_connector: String,
    pub to_connector: String,
    pub is_visible: bool,
}

/// External structural parser contract.
///
/// Must be stable: the same input yields the same id set, otherwise overrides
/// keyed by id cannot survive re-derivation.
pub trait SourceParser {
    fn parse(&self, source: &str, file_name: &str) -> Result<Vec<BlockDescriptor>, ParseError>;
}

impl<F> SourceParser for F
where
    F: Fn(&str, &str) -> Result<Vec<BlockDescriptor>, ParseError>,
{
    fn parse(&self, source: &str, file_name: &str) -> Result<Vec<BlockDescriptor>, ParseError> {
        self(source, file_name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid block kind: {0}")]
    InvalidBlockKind(String),
    #[error("Invalid connection kind: {0}")]
    InvalidConnectionKind(String),
    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(BlockId),
}
