use codecanvas_core::{ParseError, SourceParser};
use std::path::Path;
use tree_sitter::{Language, Parser, Tree};

pub mod python;
pub mod syntax;

pub use python::PythonBlockParser;
pub use syntax::check_syntax;

pub(crate) const DEFAULT_AUTHOR: &str = "File author";
pub(crate) const DEFAULT_LOCATION: &str = "Uploaded file";

pub(crate) fn parse_tree(language: &Language, source: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| ParseError::Unavailable(format!("Language error: {:?}", e)))?;

    parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Unavailable("Failed to parse source".to_string()))
}

/// Pick a structural parser from the file extension.
pub fn parser_for_file(file_name: &str) -> Option<Box<dyn SourceParser + Send + Sync>> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    match ext {
        "py" | "pyw" => Some(Box::new(PythonBlockParser::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_file_by_extension() {
        assert!(parser_for_file("main.py").is_some());
        assert!(parser_for_file("dir/tool.pyw").is_some());
        assert!(parser_for_file("main.rs").is_none());
        assert!(parser_for_file("Makefile").is_none());
    }
}
