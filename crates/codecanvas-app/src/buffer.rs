use codecanvas_core::Block;

pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Rebuild a buffer from the top-level blocks in line order.
///
/// Members are not joined separately; their code lives inside the parent
/// class's code.
pub fn join_blocks<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> String {
    let mut top_level: Vec<&Block> = blocks
        .into_iter()
        .filter(|b| b.kind.is_top_level())
        .collect();
    top_level.sort_by_key(|b| b.line_number);
    top_level
        .iter()
        .map(|b| b.code.as_str())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Replace `old_len` rows of `container` starting at `member_line` (both
/// 1-based buffer lines) with `replacement`.
///
/// Returns `None` when the member does not start inside the container.
pub fn splice_lines(
    container: &str,
    container_line: usize,
    member_line: usize,
    old_len: usize,
    replacement: &str,
) -> Option<String> {
    let offset = member_line.checked_sub(container_line)?;
    let lines: Vec<&str> = container.split('\n').collect();
    if offset >= lines.len() {
        return None;
    }
    let end = (offset + old_len).min(lines.len());
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend_from_slice(&lines[..offset]);
    out.extend(replacement.split('\n'));
    out.extend_from_slice(&lines[end..]);
    Some(out.join("\n"))
}
