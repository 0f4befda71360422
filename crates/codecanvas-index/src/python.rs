//! Splits Python source into class, method, function and statement-run blocks.

use crate::syntax::collect_issues;
use crate::{DEFAULT_AUTHOR, DEFAULT_LOCATION, parse_tree};
use codecanvas_core::{BlockDescriptor, BlockId, BlockKind, ParseError, SourceParser};
use tree_sitter::{Language, Node};

const FILE_TYPE: &str = "Python";

/// Row span of one statement, inclusive on both ends.
#[derive(Debug, Clone, Copy)]
struct RowSpan {
    start: usize,
    end: usize,
}

impl RowSpan {
    fn of(node: Node<'_>) -> Self {
        let start = node.start_position().row;
        let end_pos = node.end_position();
        // A node ending at column 0 stops before that row's text.
        let end = if end_pos.column == 0 && end_pos.row > start {
            end_pos.row - 1
        } else {
            end_pos.row
        };
        Self { start, end }
    }
}

/// Consecutive statements that are neither classes nor functions.
///
/// The run's code is every row from the first statement to the last one,
/// blank lines and comments in between included, so it stays a contiguous
/// slice of the buffer.
#[derive(Default)]
struct StatementRun {
    span: Option<RowSpan>,
}

impl StatementRun {
    fn push(&mut self, node: Node<'_>) {
        let next = RowSpan::of(node);
        self.span = Some(match self.span {
            Some(span) => RowSpan {
                start: span.start,
                end: span.end.max(next.end),
            },
            None => next,
        });
    }

    fn take(&mut self, lines: &[&str]) -> Option<(usize, String)> {
        let span = self.span.take()?;
        Some((span.start + 1, slice_lines(lines, span)))
    }
}

enum Definition<'tree> {
    Class { outer: Node<'tree>, def: Node<'tree> },
    Function { outer: Node<'tree>, def: Node<'tree> },
}

fn classify(node: Node<'_>) -> Option<Definition<'_>> {
    let def = if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition")?
    } else {
        node
    };
    match def.kind() {
        "class_definition" => Some(Definition::Class { outer: node, def }),
        "function_definition" => Some(Definition::Function { outer: node, def }),
        _ => None,
    }
}

fn slice_lines(lines: &[&str], span: RowSpan) -> String {
    let end = span.end.min(lines.len().saturating_sub(1));
    if span.start > end {
        return String::new();
    }
    lines[span.start..=end].join("\n")
}

fn node_name(def: Node<'_>, source: &str) -> Option<String> {
    def.child_by_field_name("name")
        .and_then(|name| name.utf8_text(source.as_bytes()).ok())
        .map(str::to_string)
}

/// tree-sitter backed implementation of the structural parser contract.
#[derive(Debug, Clone, Default)]
pub struct PythonBlockParser;

impl PythonBlockParser {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn language() -> Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn descriptor(
        id: BlockId,
        kind: BlockKind,
        name: String,
        parent_class: Option<BlockId>,
        code: String,
        line_number: usize,
    ) -> BlockDescriptor {
        BlockDescriptor {
            id,
            kind,
            name,
            parent_class,
            code,
            line_number,
            author: DEFAULT_AUTHOR.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            file_type: FILE_TYPE.to_string(),
        }
    }

    fn emit_class(
        out: &mut Vec<BlockDescriptor>,
        outer: Node<'_>,
        def: Node<'_>,
        source: &str,
        lines: &[&str],
        file_name: &str,
    ) {
        let Some(name) = node_name(def, source) else {
            tracing::debug!("Skipping class without a name at row {}", def.start_position().row);
            return;
        };
        let class_id = BlockId::new(format!("{file_name}.{name}"));
        let span = RowSpan::of(outer);
        out.push(Self::descriptor(
            class_id.clone(),
            BlockKind::Class,
            name.clone(),
            None,
            slice_lines(lines, span),
            span.start + 1,
        ));

        let Some(body) = def.child_by_field_name("body") else {
            return;
        };

        let mut run = StatementRun::default();
        let mut standalone_count = 0usize;
        let mut flush = |run: &mut StatementRun, out: &mut Vec<BlockDescriptor>| {
            if let Some((line_number, code)) = run.take(lines) {
                standalone_count += 1;
                out.push(Self::descriptor(
                    class_id.child(&format!("standalone_{standalone_count}")),
                    BlockKind::ClassStandalone,
                    format!("{name} Standalone Block {standalone_count}"),
                    Some(class_id.clone()),
                    code,
                    line_number,
                ));
            }
        };

        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() == "comment" {
                continue;
            }
            match classify(member) {
                Some(Definition::Function { outer, def }) => {
                    flush(&mut run, out);
                    let Some(fn_name) = node_name(def, source) else {
                        continue;
                    };
                    let span = RowSpan::of(outer);
                    out.push(Self::descriptor(
                        class_id.child(&fn_name),
                        BlockKind::ClassFunction,
                        fn_name,
                        Some(class_id.clone()),
                        slice_lines(lines, span),
                        span.start + 1,
                    ));
                }
                _ => run.push(member),
            }
        }
        flush(&mut run, out);
    }
}

impl SourceParser for PythonBlockParser {
    fn parse(&self, source: &str, file_name: &str) -> Result<Vec<BlockDescriptor>, ParseError> {
        let tree = parse_tree(&Self::language(), source)?;
        let root = tree.root_node();
        if root.has_error() {
            let issue = collect_issues(root, source).into_iter().next();
            return Err(match issue {
                Some(issue) => ParseError::Syntax {
                    file: file_name.to_string(),
                    issue,
                },
                None => ParseError::syntax(file_name, 1, 1, "invalid syntax"),
            });
        }

        let lines: Vec<&str> = source.split('\n').collect();
        let mut out = Vec::new();
        let mut run = StatementRun::default();
        let mut block_count = 0usize;

        let mut flush = |run: &mut StatementRun, out: &mut Vec<BlockDescriptor>| {
            if let Some((line_number, code)) = run.take(&lines) {
                block_count += 1;
                let name = format!("Block_{block_count}");
                out.push(Self::descriptor(
                    BlockId::new(format!("{file_name}.{name}")),
                    BlockKind::Code,
                    name,
                    None,
                    code,
                    line_number,
                ));
            }
        };

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            match classify(child) {
                Some(Definition::Class { outer, def }) => {
                    flush(&mut run, &mut out);
                    Self::emit_class(&mut out, outer, def, source, &lines, file_name);
                }
                Some(Definition::Function { outer, def }) => {
                    flush(&mut run, &mut out);
                    let Some(name) = node_name(def, source) else {
                        continue;
                    };
                    let span = RowSpan::of(outer);
                    out.push(Self::descriptor(
                        BlockId::new(format!("{file_name}.{name}")),
                        BlockKind::StandaloneFunction,
                        name,
                        None,
                        slice_lines(&lines, span),
                        span.start + 1,
                    ));
                }
                None => run.push(child),
            }
        }
        flush(&mut run, &mut out);

        out.sort_by_key(|descriptor| descriptor.line_number);
        tracing::debug!(
            "Parsed {} descriptors from {} ({} lines)",
            out.len(),
            file_name,
            lines.len()
        );
        Ok(out)
    }
}
