use crate::parse_tree;
use crate::python::PythonBlockParser;
use codecanvas_core::SyntaxIssue;
use tree_sitter::Node;

const SNIPPET_LIMIT: usize = 24;

/// List every syntax problem in Python `source`, in document order.
///
/// An empty list means the structural parser will accept the source.
pub fn check_syntax(source: &str) -> Vec<SyntaxIssue> {
    match parse_tree(&PythonBlockParser::language(), source) {
        Ok(tree) => collect_issues(tree.root_node(), source),
        Err(err) => {
            tracing::warn!("Syntax check unavailable: {}", err);
            Vec::new()
        }
    }
}

pub(crate) fn collect_issues(root: Node<'_>, source: &str) -> Vec<SyntaxIssue> {
    let mut issues = Vec::new();
    if !root.has_error() {
        return issues;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            issues.push(issue_at(node, format!("missing {}", node.kind())));
            continue;
        }
        if node.is_error() {
            let snippet = node
                .utf8_text(source.as_bytes())
                .unwrap_or("")
                .lines()
                .next()
                .unwrap_or("")
                .trim();
            let message = if snippet.is_empty() {
                "unexpected syntax".to_string()
            } else {
                let short: String = snippet.chars().take(SNIPPET_LIMIT).collect();
                format!("unexpected `{short}`")
            };
            issues.push(issue_at(node, message));
            continue;
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        // Reverse so the stack pops children in document order.
        stack.extend(children.into_iter().rev());
    }

    issues
}

fn issue_at(node: Node<'_>, message: String) -> SyntaxIssue {
    let pos = node.start_position();
    SyntaxIssue {
        line: pos.row as u32 + 1,
        column: pos.column as u32 + 1,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_source_has_no_issues() {
        assert!(check_syntax("def f():\n    return 1\n").is_empty());
    }

    #[test]
    fn test_broken_source_reports_one_based_position() {
        let issues = check_syntax("x = 1\ndef broken(:\n    pass\n");
        assert!(!issues.is_empty());
        assert!(issues.iter().all(|issue| issue.line >= 1 && issue.column >= 1));
        assert!(issues.iter().any(|issue| issue.line == 2));
    }
}
