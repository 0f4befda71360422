use codecanvas_app::{CanvasEngine, EngineSettings};
use codecanvas_core::{BlockDescriptor, BlockId, BlockKind, ParseError};
use codecanvas_storage::MemoryStore;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One code block per non-blank line, ids keyed by the line's text.
fn keyed_parser(source: &str, file: &str) -> Result<Vec<BlockDescriptor>, ParseError> {
    Ok(source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(row, line)| BlockDescriptor {
            id: BlockId::new(format!("{file}.{}", line.trim())),
            kind: BlockKind::Code,
            name: line.trim().to_string(),
            parent_class: None,
            code: line.to_string(),
            line_number: row + 1,
            author: String::new(),
            location: String::new(),
            file_type: String::new(),
        })
        .collect())
}

fn engine() -> CanvasEngine<MemoryStore> {
    CanvasEngine::new(
        "m.py",
        Arc::new(keyed_parser),
        MemoryStore::new(),
        EngineSettings::default(),
    )
}

proptest! {
    #[test]
    fn hidden_blocks_stay_hidden_after_reordering(
        names in prop::collection::btree_set("[a-z]{1,6}", 1..12),
        hide_mask in prop::collection::vec(any::<bool>(), 12),
        shuffle_seed in any::<u64>(),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let mut engine = engine();
        engine.on_code_change(&names.join("\n")).unwrap();

        let hidden: BTreeSet<String> = names
            .iter()
            .zip(&hide_mask)
            .filter(|(_, hide)| **hide)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &hidden {
            let id = BlockId::new(format!("m.py.{name}"));
            prop_assert!(engine.on_visibility_change(&id, false));
        }

        let mut reordered = names.clone();
        let len = reordered.len();
        reordered.rotate_left((shuffle_seed % len as u64) as usize);
        engine.on_code_change(&reordered.join("\n\n")).unwrap();

        let still_hidden: BTreeSet<String> = engine
            .blocks()
            .iter()
            .filter(|b| !b.is_visible)
            .map(|b| b.name.clone())
            .collect();
        prop_assert_eq!(still_hidden, hidden);
        prop_assert_eq!(engine.blocks().len(), names.len());
    }
}
