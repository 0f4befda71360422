use crate::config::LayoutConfig;
use codecanvas_core::{
    Block, BlockId, BlockKind, Connection, ConnectionId, ConnectionKind, EDITOR_ID, Vec2,
};
use std::collections::HashMap;

/// Recompute every connection from current block geometry.
///
/// Only `is_visible` is taken from `previous`, matched by connection id.
pub fn derive_connections(
    blocks: &[Block],
    editor_position: Vec2,
    previous: &[Connection],
    config: &LayoutConfig,
) -> Vec<Connection> {
    let mut connections = Vec::new();

    for block in blocks.iter().filter(|b| b.kind.is_top_level()) {
        let start_point = editor_position
            + Vec2::new(
                config.ide_width,
                (block.line_number.saturating_sub(1)) as f32 * config.line_height
                    + config.editor_line_offset,
            );
        connections.push(Connection {
            id: ConnectionId::editor_to(&block.id),
            start: BlockId::editor(),
            end: block.id.clone(),
            kind: ConnectionKind::for_editor_child(block.kind),
            start_point,
            end_point: end_anchor(block, config),
            from_connector: EDITOR_ID.to_string(),
            to_connector: block.id.leaf().to_string(),
            is_visible: true,
        });
    }

    for class in blocks.iter().filter(|b| b.kind == BlockKind::Class) {
        // Methods before class-level statements, like the member column.
        for member_kind in [BlockKind::ClassFunction, BlockKind::ClassStandalone] {
            for member in blocks
                .iter()
                .filter(|b| b.kind == member_kind && b.parent_class.as_ref() == Some(&class.id))
            {
                let Some(kind) = ConnectionKind::for_class_member(member.kind) else {
                    continue;
                };
                connections.push(Connection {
                    id: ConnectionId::between(&class.id, &member.id),
                    start: class.id.clone(),
                    end: member.id.clone(),
                    kind,
                    start_point: member_anchor(class, member, config),
                    end_point: end_anchor(member, config),
                    from_connector: class.id.leaf().to_string(),
                    to_connector: member.id.leaf().to_string(),
                    is_visible: true,
                });
            }
        }
    }

    connections.extend(relation_connections(blocks, config));

    let previous: HashMap<&ConnectionId, bool> =
        previous.iter().map(|c| (&c.id, c.is_visible)).collect();
    for connection in &mut connections {
        if let Some(&visible) = previous.get(&connection.id) {
            connection.is_visible = visible;
        }
    }
    connections
}

fn end_anchor(block: &Block, config: &LayoutConfig) -> Vec2 {
    Vec2::new(block.x, block.y + config.anchor_offset)
}

fn fallback_anchor(block: &Block, config: &LayoutConfig) -> Vec2 {
    Vec2::new(
        block.x + block.width - config.fallback_anchor_inset,
        block.y + config.fallback_anchor_drop,
    )
}

/// Row of a member's first line inside its class's code, if present.
///
/// Rows are compared whole after trimming, so `x = 1` never anchors on
/// `xx = 1`.
pub fn member_line_in_class(class: &Block, member: &Block) -> Option<usize> {
    let signature = format!("def {}(", member.name);
    let first_line = member.code.split('\n').next().unwrap_or("").trim();
    class.code.split('\n').position(|line| {
        let line = line.trim();
        let line = line.strip_prefix("async ").unwrap_or(line);
        line.starts_with(&signature) || (!first_line.is_empty() && line == first_line)
    })
}

fn member_anchor(class: &Block, member: &Block, config: &LayoutConfig) -> Vec2 {
    match member_line_in_class(class, member) {
        Some(row) => Vec2::new(
            class.x + class.width,
            class.y + (row + 1) as f32 * config.line_height + config.editor_line_offset,
        ),
        None => {
            tracing::debug!(
                "No anchor line for {} inside {}, using right edge",
                member.id,
                class.id
            );
            fallback_anchor(class, config)
        }
    }
}

/// Base class names from a `class Name(A, b.B, metaclass=M):` signature.
pub fn base_class_names(class_code: &str) -> Vec<String> {
    let Some(signature) = class_code
        .split('\n')
        .map(str::trim_start)
        .find(|line| line.starts_with("class "))
    else {
        return Vec::new();
    };
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let Some(close) = signature[open..].find(')') else {
        return Vec::new();
    };
    signature[open + 1..open + close]
        .split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty() && !arg.contains('='))
        .map(|arg| arg.rsplit('.').next().unwrap_or(arg).to_string())
        .collect()
}

fn instantiates(code: &str, class_name: &str) -> bool {
    let needle = format!("{class_name}(");
    code.match_indices(&needle).any(|(idx, _)| {
        code[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_' || c == '.'))
    })
}

/// `inherits` and `composes` edges between classes of the same file.
fn relation_connections(blocks: &[Block], config: &LayoutConfig) -> Vec<Connection> {
    let classes: Vec<&Block> = blocks.iter().filter(|b| b.kind == BlockKind::Class).collect();
    let mut connections = Vec::new();

    for &child in &classes {
        let bases = base_class_names(&child.code);
        let body = child.code.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        for &other in &classes {
            if other.id == child.id {
                continue;
            }
            let kind = if bases.iter().any(|b| *b == other.name) {
                ConnectionKind::Inherits
            } else if instantiates(body, &other.name) {
                ConnectionKind::Composes
            } else {
                continue;
            };
            connections.push(Connection {
                id: ConnectionId::with_discriminator(&child.id, &other.id, kind.as_str()),
                start: child.id.clone(),
                end: other.id.clone(),
                kind,
                start_point: fallback_anchor(child, config),
                end_point: end_anchor(other, config),
                from_connector: child.id.leaf().to_string(),
                to_connector: other.id.leaf().to_string(),
                is_visible: true,
            });
        }
    }
    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{block, member};

    fn placed(mut b: Block, x: f32, y: f32, width: f32) -> Block {
        b.x = x;
        b.y = y;
        b.width = width;
        b
    }

    fn class_with_method() -> Vec<Block> {
        let mut class = block("m.C", BlockKind::Class, 3);
        class.name = "C".into();
        class.code = "class C:\n    size = 1\n    def grow(self):\n        pass".into();
        let mut method = member("m.C.grow", BlockKind::ClassFunction, 5, "m.C");
        method.name = "grow".into();
        method.code = "    def grow(self):\n        pass".into();
        let mut statement = member("m.C.standalone_1", BlockKind::ClassStandalone, 4, "m.C");
        statement.code = "    size = 1".into();
        vec![
            placed(class, 850.0, 100.0, 300.0),
            placed(method, 1900.0, 100.0, 200.0),
            placed(statement, 1900.0, 300.0, 200.0),
        ]
    }

    #[test]
    fn test_editor_connection_geometry() {
        let blocks = class_with_method();
        let connections =
            derive_connections(&blocks, Vec2::new(20.0, 20.0), &[], &LayoutConfig::default());

        let editor = &connections[0];
        assert_eq!(editor.id.as_str(), "m.C");
        assert!(editor.start.is_editor());
        assert_eq!(editor.kind, ConnectionKind::EditorContainsClass);
        assert_eq!(editor.start_point, Vec2::new(620.0, 20.0 + 2.0 * 20.0 + 40.0));
        assert_eq!(editor.end_point, Vec2::new(850.0, 125.0));
    }

    #[test]
    fn test_member_anchors_follow_definition_line() {
        let blocks = class_with_method();
        let connections =
            derive_connections(&blocks, Vec2::default(), &[], &LayoutConfig::default());

        let method = connections
            .iter()
            .find(|c| c.end.as_str() == "m.C.grow")
            .unwrap();
        assert_eq!(method.id.as_str(), "m.C-m.C.grow");
        assert_eq!(method.kind, ConnectionKind::ClassContainsFunctions);
        assert_eq!(method.start_point, Vec2::new(1150.0, 100.0 + 3.0 * 20.0 + 40.0));

        let statement = connections
            .iter()
            .find(|c| c.end.as_str() == "m.C.standalone_1")
            .unwrap();
        assert_eq!(statement.kind, ConnectionKind::ClassContainsStandalone);
        assert_eq!(statement.start_point, Vec2::new(1150.0, 100.0 + 2.0 * 20.0 + 40.0));
    }

    #[test]
    fn test_member_anchor_matches_whole_lines() {
        let mut class = block("m.C", BlockKind::Class, 1);
        class.code = "class C:\n    xx = 1\n    x = 1\n    def grow_more(self):\n        pass\n    async def grow(self):\n        pass".into();
        let mut statement = member("m.C.standalone_2", BlockKind::ClassStandalone, 3, "m.C");
        statement.code = "    x = 1".into();
        assert_eq!(member_line_in_class(&class, &statement), Some(2));

        let mut method = member("m.C.grow", BlockKind::ClassFunction, 6, "m.C");
        method.name = "grow".into();
        method.code = "    async def grow(self):\n        pass".into();
        assert_eq!(member_line_in_class(&class, &method), Some(5));

        statement.code = "    = 1".into();
        assert_eq!(member_line_in_class(&class, &statement), None);
    }

    #[test]
    fn test_missing_anchor_falls_back_to_right_edge() {
        let mut blocks = class_with_method();
        blocks[1].name = "renamed".into();
        blocks[1].code = "    def renamed(self):\n        pass".into();
        let connections =
            derive_connections(&blocks, Vec2::default(), &[], &LayoutConfig::default());
        let method = connections
            .iter()
            .find(|c| c.end.as_str() == "m.C.grow")
            .unwrap();
        assert_eq!(method.start_point, Vec2::new(850.0 + 300.0 - 20.0, 150.0));
        assert_eq!(method.end_point, Vec2::new(1900.0, 125.0));
    }

    #[test]
    fn test_visibility_is_merged_by_id() {
        let blocks = class_with_method();
        let cfg = LayoutConfig::default();
        let mut previous = derive_connections(&blocks, Vec2::default(), &[], &cfg);
        for connection in &mut previous {
            if connection.id.as_str() == "m.C-m.C.grow" {
                connection.is_visible = false;
            }
        }
        let next = derive_connections(&blocks, Vec2::new(5.0, 5.0), &previous, &cfg);
        let hidden: Vec<_> = next
            .iter()
            .filter(|c| !c.is_visible)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(hidden, vec!["m.C-m.C.grow"]);
    }

    #[test]
    fn test_inheritance_and_composition_edges() {
        let mut base = block("m.Base", BlockKind::Class, 1);
        base.name = "Base".into();
        base.code = "class Base:\n    pass".into();
        let mut child = block("m.Child", BlockKind::Class, 4);
        child.name = "Child".into();
        child.code = "class Child(mod.Base):\n    def make(self):\n        return Helper()".into();
        let mut helper = block("m.Helper", BlockKind::Class, 8);
        helper.name = "Helper".into();
        helper.code = "class Helper:\n    pass".into();

        let connections = derive_connections(
            &[base, child, helper],
            Vec2::default(),
            &[],
            &LayoutConfig::default(),
        );
        let relations: Vec<_> = connections
            .iter()
            .filter(|c| !c.kind.is_containment())
            .map(|c| (c.id.as_str(), c.kind))
            .collect();
        assert_eq!(
            relations,
            vec![
                ("m.Child-m.Base#inherits", ConnectionKind::Inherits),
                ("m.Child-m.Helper#composes", ConnectionKind::Composes),
            ]
        );
    }

    #[test]
    fn test_base_class_names() {
        assert_eq!(
            base_class_names("class A(B, pkg.C, metaclass=M):\n    pass"),
            vec!["B".to_string(), "C".to_string()]
        );
        assert!(base_class_names("class A:\n    pass").is_empty());
    }
}
