use codecanvas_core::{Block, BlockDescriptor, BlockId, BlockKind, ConnectionKind, ParseError, Size, Vec2};
use codecanvas_graph::camera::{fit_to_bounds, focus_block};
use codecanvas_graph::{
    DeriveOptions, LayoutConfig, ViewportConfig, derive_blocks, derive_connections,
};
use proptest::prelude::*;

fn code_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z =()]{0,60}", 1..12).prop_map(|lines| lines.join("\n"))
}

/// Classes with members plus loose top-level blocks, all with unique ids.
fn descriptors_strategy() -> impl Strategy<Value = Vec<BlockDescriptor>> {
    (
        proptest::collection::vec(
            (code_strategy(), proptest::collection::vec((any::<bool>(), code_strategy()), 0..4)),
            0..4,
        ),
        proptest::collection::vec((any::<bool>(), code_strategy()), 0..5),
    )
        .prop_map(|(classes, loose)| {
            let mut out = Vec::new();
            let mut line = 1;
            for (c, (class_code, members)) in classes.into_iter().enumerate() {
                let class_id = BlockId::new(format!("m.C{c}"));
                out.push(descriptor(class_id.clone(), BlockKind::Class, line, class_code, None));
                for (m, (is_method, code)) in members.into_iter().enumerate() {
                    line += 1;
                    let (kind, name) = if is_method {
                        (BlockKind::ClassFunction, format!("f{m}"))
                    } else {
                        (BlockKind::ClassStandalone, format!("standalone_{m}"))
                    };
                    out.push(descriptor(
                        class_id.child(&name),
                        kind,
                        line,
                        code,
                        Some(class_id.clone()),
                    ));
                }
                line += 3;
            }
            for (n, (is_function, code)) in loose.into_iter().enumerate() {
                let kind = if is_function {
                    BlockKind::StandaloneFunction
                } else {
                    BlockKind::Code
                };
                out.push(descriptor(BlockId::new(format!("m.L{n}")), kind, line, code, None));
                line += 2;
            }
            out
        })
}

fn descriptor(
    id: BlockId,
    kind: BlockKind,
    line_number: usize,
    code: String,
    parent_class: Option<BlockId>,
) -> BlockDescriptor {
    BlockDescriptor {
        name: id.leaf().to_string(),
        id,
        kind,
        parent_class,
        code,
        line_number,
        author: "File author".into(),
        location: "Uploaded file".into(),
        file_type: "Python".into(),
    }
}

fn derive(descriptors: &[BlockDescriptor]) -> Vec<Block> {
    let parser = |_: &str, _: &str| -> Result<Vec<BlockDescriptor>, ParseError> {
        Ok(descriptors.to_vec())
    };
    derive_blocks(
        &parser,
        "",
        "m",
        &LayoutConfig::default(),
        DeriveOptions::default(),
    )
    .unwrap()
}

fn placed_block_strategy() -> impl Strategy<Value = Block> {
    (
        0.0f32..5000.0,
        0.0f32..5000.0,
        200.0f32..1200.0,
        0.0f32..1500.0,
    )
        .prop_map(|(x, y, width, height)| {
            let mut block = Block::from_descriptor(descriptor(
                BlockId::new("m.f"),
                BlockKind::StandaloneFunction,
                1,
                "pass".into(),
                None,
            ));
            block.x = x;
            block.y = y;
            block.width = width;
            block.height = height;
            block
        })
}

proptest! {
    #[test]
    fn prop_layout_is_deterministic(descriptors in descriptors_strategy()) {
        let first = derive(&descriptors);
        let second = derive(&descriptors);
        prop_assert_eq!(first.len(), descriptors.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(&a.id, &b.id);
            prop_assert_eq!(a.kind, b.kind);
            prop_assert_eq!(&a.code, &b.code);
            prop_assert_eq!(a.line_number, b.line_number);
            prop_assert_eq!((a.x, a.y, a.width, a.height), (b.x, b.y, b.width, b.height));
        }
    }

    #[test]
    fn prop_blocks_in_a_column_never_overlap(descriptors in descriptors_strategy()) {
        let blocks = derive(&descriptors);
        for column in [850.0f32, 1900.0] {
            let mut stacked: Vec<&Block> = blocks.iter().filter(|b| b.x == column).collect();
            stacked.sort_by(|a, b| a.y.total_cmp(&b.y));
            for pair in stacked.windows(2) {
                prop_assert!(pair[0].y + pair[0].height + 40.0 <= pair[1].y + 1e-3);
            }
        }
    }

    #[test]
    fn prop_every_member_has_one_containment_edge(descriptors in descriptors_strategy()) {
        let blocks = derive(&descriptors);
        let connections = derive_connections(&blocks, Vec2::new(20.0, 20.0), &[], &LayoutConfig::default());
        for block in blocks.iter().filter(|b| b.kind.is_class_member()) {
            let parent = block.parent_class.as_ref().unwrap();
            let count = connections
                .iter()
                .filter(|c| &c.start == parent && c.end == block.id)
                .filter(|c| matches!(
                    c.kind,
                    ConnectionKind::ClassContainsFunctions | ConnectionKind::ClassContainsStandalone
                ))
                .count();
            prop_assert_eq!(count, 1);
        }
    }

    #[test]
    fn prop_fit_stays_within_unit_zoom(
        blocks in proptest::collection::vec(placed_block_strategy(), 1..20),
        vw in 200.0f32..4000.0,
        vh in 200.0f32..3000.0,
    ) {
        let cfg = ViewportConfig::default();
        let bounds = codecanvas_graph::camera::bounding_box(&blocks, cfg.fit_block_height).unwrap();
        let fit = fit_to_bounds(&bounds, Size::new(vw, vh), &cfg);
        prop_assert!(fit.zoom > 0.0 && fit.zoom <= 1.0);
        prop_assert!(fit.canvas_size.width >= vw);
        prop_assert!(fit.canvas_size.height >= vh);
    }

    #[test]
    fn prop_focus_keeps_block_center_on_screen(
        block in placed_block_strategy(),
        vw in 300.0f32..4000.0,
        vh in 300.0f32..3000.0,
    ) {
        let cfg = ViewportConfig::default();
        let focus = focus_block(&block, Size::new(vw, vh), &cfg);
        let height = if block.height > 0.0 { block.height } else { cfg.standard_block_height };
        let screen_x = (block.x + block.width / 2.0) * focus.zoom - focus.scroll.x;
        let screen_y = (block.y + height / 2.0) * focus.zoom - focus.scroll.y;
        prop_assert!(screen_x >= -1e-2 && screen_x <= vw + 1e-2);
        prop_assert!(screen_y >= -1e-2 && screen_y <= vh + 1e-2);
    }
}
