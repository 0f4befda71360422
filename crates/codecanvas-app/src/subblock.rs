//! Indentation-based re-splitting of an edited block into nested sub-blocks.
//!
//! Best effort only: indentation is the raw count of leading whitespace
//! characters, so a tab counts as one column.

const STANDALONE_PREFIX: &str = "standalone_";

/// Code of one sub-block and its 0-based start row inside the parent code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBlockSpan {
    pub code: String,
    pub line: usize,
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn def_name(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix("def ")?;
    let name = rest.split('(').next().unwrap_or(rest).trim();
    (!name.is_empty()).then_some(name)
}

/// Names of sub-blocks nested below the first `class `/`def ` signature.
///
/// A deeper `def` yields the function name; any other deeper non-blank line
/// yields `standalone_{row}`. Lines before the signature are ignored.
pub fn find_sub_blocks(code: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut reference: Option<usize> = None;

    for (row, line) in code.split('\n').enumerate() {
        let trimmed = line.trim();
        let indent = indentation(line);
        let Some(base) = reference else {
            if trimmed.starts_with("class ") || trimmed.starts_with("def ") {
                reference = Some(indent);
            }
            continue;
        };
        if indent <= base || trimmed.is_empty() {
            continue;
        }
        let name = match def_name(trimmed) {
            Some(name) => name.to_string(),
            None => format!("{STANDALONE_PREFIX}{row}"),
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Contiguous code of `name` inside `code`, from its start row until a
/// non-blank line at or below the start indentation.
///
/// Blank lines inside the span are kept; trailing blank lines are not.
pub fn extract_sub_block(code: &str, name: &str) -> Option<SubBlockSpan> {
    let lines: Vec<&str> = code.split('\n').collect();
    let start = match name.strip_prefix(STANDALONE_PREFIX) {
        Some(row) => row.parse::<usize>().ok().filter(|&row| row < lines.len())?,
        None => lines.iter().position(|line| {
            def_name(line.trim()) == Some(name)
        })?,
    };

    let base = indentation(lines[start]);
    let mut end = start;
    for (row, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indentation(line) <= base {
            break;
        }
        end = row;
    }

    Some(SubBlockSpan {
        code: lines[start..=end].join("\n"),
        line: start,
    })
}

/// Start row of an anonymous `standalone_{row}` sub-block.
pub fn anonymous_row(name: &str) -> Option<usize> {
    name.strip_prefix(STANDALONE_PREFIX)?.parse().ok()
}

fn starts_definition(trimmed: &str) -> bool {
    trimmed.starts_with("def ")
        || trimmed.starts_with("async def ")
        || trimmed.starts_with("class ")
        || trimmed.starts_with('@')
}

/// Statement run starting at `row`: sibling lines at the same indentation
/// and everything nested under them, up to the next definition or a
/// shallower line.
///
/// Trailing blank and comment lines are dropped.
pub fn extract_statement_run(code: &str, row: usize) -> Option<SubBlockSpan> {
    let lines: Vec<&str> = code.split('\n').collect();
    let first = lines.get(row)?;
    if first.trim().is_empty() || starts_definition(first.trim()) {
        return None;
    }
    let base = indentation(first);
    let mut end = row;
    for (idx, line) in lines.iter().enumerate().skip(row + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = indentation(line);
        if indent < base || (indent == base && starts_definition(trimmed)) {
            break;
        }
        if !trimmed.starts_with('#') {
            end = idx;
        }
    }
    Some(SubBlockSpan {
        code: lines[row..=end].join("\n"),
        line: row,
    })
}
