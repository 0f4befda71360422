use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed tag set for the visual units a source file is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Class,
    ClassFunction,
    ClassStandalone,
    Code,
    StandaloneFunction,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Class,
        BlockKind::ClassFunction,
        BlockKind::ClassStandalone,
        BlockKind::Code,
        BlockKind::StandaloneFunction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Class => "class",
            BlockKind::ClassFunction => "class_function",
            BlockKind::ClassStandalone => "class_standalone",
            BlockKind::Code => "code",
            BlockKind::StandaloneFunction => "standalone_function",
        }
    }

    /// Blocks stacked in the first column and connected straight to the editor.
    pub fn is_top_level(self) -> bool {
        matches!(
            self,
            BlockKind::Class | BlockKind::Code | BlockKind::StandaloneFunction
        )
    }

    /// Blocks owned by a class and placed in the member column.
    pub fn is_class_member(self) -> bool {
        matches!(self, BlockKind::ClassFunction | BlockKind::ClassStandalone)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| CoreError::InvalidBlockKind(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    #[serde(rename = "idecontainsclass")]
    EditorContainsClass,
    #[serde(rename = "idecontainsstandalonecode")]
    EditorContainsStandaloneCode,
    #[serde(rename = "class_contains_functions")]
    ClassContainsFunctions,
    #[serde(rename = "class_contains_standalone")]
    ClassContainsStandalone,
    #[serde(rename = "inherits")]
    Inherits,
    #[serde(rename = "composes")]
    Composes,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 6] = [
        ConnectionKind::EditorContainsClass,
        ConnectionKind::EditorContainsStandaloneCode,
        ConnectionKind::ClassContainsFunctions,
        ConnectionKind::ClassContainsStandalone,
        ConnectionKind::Inherits,
        ConnectionKind::Composes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionKind::EditorContainsClass => "idecontainsclass",
            ConnectionKind::EditorContainsStandaloneCode => "idecontainsstandalonecode",
            ConnectionKind::ClassContainsFunctions => "class_contains_functions",
            ConnectionKind::ClassContainsStandalone => "class_contains_standalone",
            ConnectionKind::Inherits => "inherits",
            ConnectionKind::Composes => "composes",
        }
    }

    pub fn is_containment(self) -> bool {
        !matches!(self, ConnectionKind::Inherits | ConnectionKind::Composes)
    }

    /// Containment kind linking the editor to a top-level block.
    pub fn for_editor_child(kind: BlockKind) -> Self {
        if kind == BlockKind::Class {
            ConnectionKind::EditorContainsClass
        } else {
            ConnectionKind::EditorContainsStandaloneCode
        }
    }

    /// Containment kind linking a class to one of its members.
    pub fn for_class_member(kind: BlockKind) -> Option<Self> {
        match kind {
            BlockKind::ClassFunction => Some(ConnectionKind::ClassContainsFunctions),
            BlockKind::ClassStandalone => Some(ConnectionKind::ClassContainsStandalone),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionKind {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ConnectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| CoreError::InvalidConnectionKind(value.to_string()))
    }
}
