use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single syntax problem reported by a parser.
///
/// Line and column numbers are **1-based**, matching the `line_number` of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Failure returned by a [`crate::SourceParser`] for malformed source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error in {file} at {issue}")]
    Syntax { file: String, issue: SyntaxIssue },
    #[error("parser unavailable: {0}")]
    Unavailable(String),
}

impl ParseError {
    pub fn syntax(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            file: file.to_string(),
            issue: SyntaxIssue {
                line,
                column,
                message: message.into(),
            },
        }
    }
}
