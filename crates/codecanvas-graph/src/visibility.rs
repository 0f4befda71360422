use codecanvas_core::{Block, BlockId, Connection, ConnectionId, ConnectionKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Visibility overrides that outlive every re-derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityState {
    pub hidden_sub_blocks: BTreeSet<BlockId>,
    pub hidden_sub_connections: BTreeSet<ConnectionId>,
    /// Last toggle applied to a class through its editor edge.
    pub class_visibility: BTreeMap<BlockId, bool>,
}

/// Ids touched by one toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityChange {
    pub blocks: Vec<BlockId>,
    pub connections: Vec<ConnectionId>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show or hide a connection and cascade to what it contains.
    ///
    /// For an editor-to-class edge, every edge leaving the class is collected
    /// into `hidden_sub_connections` (or released from it). Containment edges
    /// also flip the target block and any block whose parent is the target.
    pub fn toggle_connection_visibility(
        &mut self,
        blocks: &mut [Block],
        connections: &mut [Connection],
        connection_id: &ConnectionId,
        make_visible: bool,
        kind: ConnectionKind,
    ) -> VisibilityChange {
        let mut change = VisibilityChange::default();
        let target = connections
            .iter()
            .find(|c| &c.id == connection_id)
            .map(|c| (c.end.clone(), c.kind));

        if kind == ConnectionKind::EditorContainsClass {
            let class_id = target
                .as_ref()
                .map(|(end, _)| end.clone())
                .unwrap_or_else(|| BlockId::new(connection_id.as_str()));
            let prefix = ConnectionId::member_prefix(class_id.as_str());

            for connection in connections.iter_mut() {
                if connection.id.as_str().starts_with(&prefix) || connection.start == class_id {
                    connection.is_visible = make_visible;
                    change.connections.push(connection.id.clone());
                }
            }
            for id in &change.connections {
                if make_visible {
                    self.hidden_sub_connections.remove(id);
                } else {
                    self.hidden_sub_connections.insert(id.clone());
                }
            }
            self.class_visibility.insert(class_id, make_visible);
        }

        let Some((end, target_kind)) = target else {
            tracing::debug!("Toggled unknown connection {}", connection_id);
            return change;
        };

        if let Some(connection) = connections.iter_mut().find(|c| &c.id == connection_id) {
            connection.is_visible = make_visible;
            if !change.connections.contains(connection_id) {
                change.connections.push(connection_id.clone());
            }
        }

        if target_kind.is_containment() {
            for block in blocks
                .iter_mut()
                .filter(|b| b.id == end || b.parent_class.as_ref() == Some(&end))
            {
                block.is_visible = make_visible;
                change.blocks.push(block.id.clone());
            }
        }
        change
    }

    /// Set one block's own flag. Returns false when the id is unknown.
    pub fn set_block_visibility(blocks: &mut [Block], id: &BlockId, is_visible: bool) -> bool {
        match blocks.iter_mut().find(|b| &b.id == id) {
            Some(block) => {
                block.is_visible = is_visible;
                true
            }
            None => false,
        }
    }

    pub fn set_sub_block_hidden(&mut self, id: BlockId, hidden: bool) {
        if hidden {
            self.hidden_sub_blocks.insert(id);
        } else {
            self.hidden_sub_blocks.remove(&id);
        }
    }

    pub fn is_block_visible(&self, block: &Block) -> bool {
        if !block.is_visible || self.hidden_sub_blocks.contains(&block.id) {
            return false;
        }
        if block.kind.is_top_level() {
            return true;
        }
        block
            .parent_class
            .as_ref()
            .is_none_or(|parent| self.class_visibility.get(parent) != Some(&false))
    }

    pub fn visible_blocks<'a>(&self, blocks: &'a [Block]) -> Vec<&'a Block> {
        blocks.iter().filter(|b| self.is_block_visible(b)).collect()
    }

    /// Connections not swallowed by a hidden container; `is_visible` is kept as is.
    pub fn visible_connections<'a>(&self, connections: &'a [Connection]) -> Vec<&'a Connection> {
        connections
            .iter()
            .filter(|c| !self.hidden_sub_connections.contains(&c.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::connections::derive_connections;
    use crate::tests::{block, member};
    use codecanvas_core::{BlockKind, Vec2};

    fn scene() -> (Vec<Block>, Vec<Connection>) {
        let mut class = block("m.C", BlockKind::Class, 1);
        class.code = "class C:\n    def a(self):\n        pass".into();
        let blocks = vec![
            class,
            member("m.C.a", BlockKind::ClassFunction, 2, "m.C"),
            member("m.C.standalone_1", BlockKind::ClassStandalone, 4, "m.C"),
            block("m.main", BlockKind::StandaloneFunction, 6),
        ];
        let connections =
            derive_connections(&blocks, Vec2::default(), &[], &LayoutConfig::default());
        (blocks, connections)
    }

    fn visible_ids(state: &VisibilityState, blocks: &[Block]) -> Vec<String> {
        state
            .visible_blocks(blocks)
            .iter()
            .map(|b| b.id.to_string())
            .collect()
    }

    #[test]
    fn test_hiding_class_cascades_to_members() {
        let (mut blocks, mut connections) = scene();
        let mut state = VisibilityState::new();
        let change = state.toggle_connection_visibility(
            &mut blocks,
            &mut connections,
            &ConnectionId::from("m.C"),
            false,
            ConnectionKind::EditorContainsClass,
        );

        assert_eq!(visible_ids(&state, &blocks), vec!["m.main"]);
        assert_eq!(change.blocks.len(), 3);
        assert!(state
            .hidden_sub_connections
            .contains(&ConnectionId::from("m.C-m.C.a")));
        assert!(state
            .hidden_sub_connections
            .contains(&ConnectionId::from("m.C-m.C.standalone_1")));

        let shown: Vec<_> = state
            .visible_connections(&connections)
            .iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(shown, vec!["m.C", "m.main"]);
        assert!(!connections[0].is_visible);
    }

    #[test]
    fn test_showing_class_restores_everything() {
        let (mut blocks, mut connections) = scene();
        let mut state = VisibilityState::new();
        let id = ConnectionId::from("m.C");
        state.toggle_connection_visibility(
            &mut blocks,
            &mut connections,
            &id,
            false,
            ConnectionKind::EditorContainsClass,
        );
        state.toggle_connection_visibility(
            &mut blocks,
            &mut connections,
            &id,
            true,
            ConnectionKind::EditorContainsClass,
        );
        assert_eq!(visible_ids(&state, &blocks).len(), 4);
        assert!(state.hidden_sub_connections.is_empty());
        assert!(connections.iter().all(|c| c.is_visible));
    }

    #[test]
    fn test_class_override_hides_members_added_later() {
        let (mut blocks, mut connections) = scene();
        let mut state = VisibilityState::new();
        state.toggle_connection_visibility(
            &mut blocks,
            &mut connections,
            &ConnectionId::from("m.C"),
            false,
            ConnectionKind::EditorContainsClass,
        );
        let newcomer = member("m.C.b", BlockKind::ClassFunction, 3, "m.C");
        assert!(newcomer.is_visible);
        assert!(!state.is_block_visible(&newcomer));
    }

    #[test]
    fn test_member_edge_hides_only_member() {
        let (mut blocks, mut connections) = scene();
        let mut state = VisibilityState::new();
        state.toggle_connection_visibility(
            &mut blocks,
            &mut connections,
            &ConnectionId::from("m.C-m.C.a"),
            false,
            ConnectionKind::ClassContainsFunctions,
        );
        assert_eq!(
            visible_ids(&state, &blocks),
            vec!["m.C", "m.C.standalone_1", "m.main"]
        );
        assert!(state.hidden_sub_connections.is_empty());
    }

    #[test]
    fn test_hidden_sub_blocks_filter() {
        let (blocks, _) = scene();
        let mut state = VisibilityState::new();
        state.set_sub_block_hidden(BlockId::new("m.main"), true);
        assert_eq!(visible_ids(&state, &blocks).len(), 3);
        state.set_sub_block_hidden(BlockId::new("m.main"), false);
        assert_eq!(visible_ids(&state, &blocks).len(), 4);
    }
}
