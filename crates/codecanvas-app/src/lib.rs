//! Headless canvas engine.
//!
//! Owns the buffer of record, the derived blocks and connections and every
//! override that must survive re-derivation. A host shell calls the `on_*`
//! callbacks and drains [`Event`]s from the bus.

pub mod buffer;
pub mod scheduler;
pub mod settings;
pub mod subblock;
pub mod worker;

pub use scheduler::{ParseRequest, ParseScheduler};
pub use settings::EngineSettings;
pub use worker::{ParseResponse, ParseWorker, SharedParser};

use codecanvas_core::{
    Block, BlockDescriptor, BlockId, BlockKind, Connection, ConnectionId, ConnectionKind,
    CoreError, PanelKind, ParseError, Size, Vec2,
};
use codecanvas_events::{Event, EventBus};
use codecanvas_graph::{
    BlockGraph, Camera, DeriveError, DeriveOptions, FitResult, FocusResult, GeometryMerge,
    PanDirection, SelectionCursor, VisibilityChange, VisibilityState, arrange, derive_connections,
};
use codecanvas_storage::{
    KeyValueStore, StorageError, buffer_key, documentation_key, testing_key,
};
use crossbeam_channel::Receiver;
use scheduler::Submission;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Derive(#[from] DeriveError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of installing a fresh block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeriveOutcome {
    pub request_id: u64,
    pub block_count: usize,
    pub connection_count: usize,
}

/// What happened to one buffer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    Applied(DeriveOutcome),
    /// Handed to the background worker.
    Dispatched { request_id: u64 },
    /// Waiting for the in-flight parse to finish.
    Queued { request_id: u64 },
    /// A newer submission exists; this result was dropped.
    Discarded { request_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBlockUpdate {
    pub id: BlockId,
    pub line_number: usize,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEdit {
    pub buffer: String,
    pub sub_blocks: Vec<SubBlockUpdate>,
    pub status: ParseStatus,
}

/// Serializable view of the canvas for hosts that render elsewhere.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshot {
    pub file_name: String,
    pub editor_position: Vec2,
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
    pub camera: Camera,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

pub struct CanvasEngine<S: KeyValueStore> {
    file_name: String,
    parser: SharedParser,
    store: S,
    settings: EngineSettings,
    bus: EventBus,
    buffer: String,
    graph: BlockGraph,
    connections: Vec<Connection>,
    visibility: VisibilityState,
    camera: Camera,
    cursor: SelectionCursor,
    editor_position: Vec2,
    scheduler: ParseScheduler,
    worker: Option<ParseWorker>,
    last_error: Option<String>,
}

impl<S: KeyValueStore> CanvasEngine<S> {
    pub fn new(
        file_name: impl Into<String>,
        parser: SharedParser,
        store: S,
        settings: EngineSettings,
    ) -> Self {
        let mut camera = Camera::new(settings.viewport.clone());
        camera.auto_zoom = settings.auto_zoom;
        Self {
            file_name: file_name.into(),
            parser,
            store,
            editor_position: settings.editor_position,
            settings,
            bus: EventBus::new(),
            buffer: String::new(),
            graph: BlockGraph::new(),
            connections: Vec::new(),
            visibility: VisibilityState::new(),
            camera,
            cursor: SelectionCursor::new(),
            scheduler: ParseScheduler::new(),
            worker: None,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn blocks(&self) -> &[Block] {
        self.graph.blocks()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.graph.get(id)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn visible_blocks(&self) -> Vec<&Block> {
        self.visibility.visible_blocks(self.graph.blocks())
    }

    pub fn visible_connections(&self) -> Vec<&Connection> {
        self.visibility.visible_connections(&self.connections)
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn editor_position(&self) -> Vec2 {
        self.editor_position
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> Receiver<Event> {
        self.bus.receiver()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Message of the most recent failed derivation, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_parsing(&self) -> bool {
        self.scheduler.is_busy()
    }

    pub fn snapshot(&self, visible_only: bool) -> CanvasSnapshot {
        let (blocks, connections) = if visible_only {
            (
                self.visible_blocks().into_iter().cloned().collect(),
                self.visible_connections()
                    .into_iter()
                    .filter(|c| c.is_visible)
                    .cloned()
                    .collect(),
            )
        } else {
            (self.graph.blocks().to_vec(), self.connections.clone())
        };
        CanvasSnapshot {
            file_name: self.file_name.clone(),
            editor_position: self.editor_position,
            blocks,
            connections,
            camera: self.camera.clone(),
            last_error: self.last_error.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Buffer
    // ------------------------------------------------------------------

    /// Load the stored snapshot for this file, or store `initial_text` if
    /// there is none, then derive.
    pub fn open(&mut self, initial_text: &str) -> Result<ParseStatus, EngineError> {
        let key = buffer_key(&self.file_name);
        let text = match self.store.get(&key) {
            Ok(Some(stored)) => {
                tracing::info!("Restoring stored buffer for {}", self.file_name);
                stored
            }
            Ok(None) => initial_text.to_string(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                self.bus.publish(Event::PersistFailed {
                    key,
                    error: e.to_string(),
                });
                initial_text.to_string()
            }
        };
        self.on_code_change(&text)
    }

    fn set_buffer(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.bus.publish(Event::BufferChanged {
            file_name: self.file_name.clone(),
            length: self.buffer.len(),
        });
        self.persist_buffer();
    }

    fn persist_buffer(&self) {
        let key = buffer_key(&self.file_name);
        if let Err(e) = self.store.set(&key, &self.buffer) {
            tracing::warn!("Failed to persist {}: {}", key, e);
            self.bus.publish(Event::PersistFailed {
                key,
                error: e.to_string(),
            });
        }
    }

    /// Make `text` the buffer of record, persist it and derive synchronously.
    ///
    /// While a background parse is in flight the text only takes the pending
    /// slot. A parse failure keeps the previous blocks and is returned.
    pub fn on_code_change(&mut self, text: &str) -> Result<ParseStatus, EngineError> {
        self.set_buffer(text);
        match self.scheduler.submit(self.buffer.clone()) {
            Submission::Dispatch(request) => self.run_inline(request),
            Submission::Queued { request_id } => {
                self.bus.publish(Event::ParseQueued { request_id });
                Ok(ParseStatus::Queued { request_id })
            }
        }
    }

    /// Like [`Self::on_code_change`] but parses on the background worker.
    /// Call [`Self::poll_parse`] to apply the result.
    pub fn begin_parse(&mut self, text: &str) -> Result<ParseStatus, EngineError> {
        self.set_buffer(text);
        match self.scheduler.submit(self.buffer.clone()) {
            Submission::Dispatch(request) => self.dispatch(request),
            Submission::Queued { request_id } => {
                self.bus.publish(Event::ParseQueued { request_id });
                Ok(ParseStatus::Queued { request_id })
            }
        }
    }

    /// Wait up to `timeout` for a worker result and apply it.
    pub fn poll_parse(&mut self, timeout: Duration) -> Option<Result<ParseStatus, EngineError>> {
        let response = self.worker.as_ref()?.recv_timeout(timeout)?;
        Some(self.finish_parse(response))
    }

    /// Apply one worker result and dispatch the pending submission, if any.
    pub fn finish_parse(&mut self, response: ParseResponse) -> Result<ParseStatus, EngineError> {
        let (status, next) = self.complete(response);
        match next {
            Some(next) => match self.dispatch(next) {
                Ok(ParseStatus::Dispatched { .. }) => status,
                inline => inline,
            },
            None => status,
        }
    }

    fn dispatch(&mut self, request: ParseRequest) -> Result<ParseStatus, EngineError> {
        let request_id = request.request_id;
        let worker = self.worker.get_or_insert_with(|| {
            ParseWorker::spawn(self.parser.clone(), self.file_name.clone())
        });
        match worker.submit(request) {
            Ok(()) => Ok(ParseStatus::Dispatched { request_id }),
            Err(request) => {
                tracing::warn!("Parse worker unavailable, parsing request {} inline", request_id);
                self.worker = None;
                self.run_inline(request)
            }
        }
    }

    fn run_inline(&mut self, mut request: ParseRequest) -> Result<ParseStatus, EngineError> {
        loop {
            let result = self.parser.parse(&request.source, &self.file_name);
            let (status, next) = self.complete(ParseResponse {
                request_id: request.request_id,
                result,
            });
            match next {
                Some(next) => request = next,
                None => return status,
            }
        }
    }

    fn complete(
        &mut self,
        response: ParseResponse,
    ) -> (Result<ParseStatus, EngineError>, Option<ParseRequest>) {
        let request_id = response.request_id;
        let completion = self.scheduler.complete(request_id);
        let status = if completion.is_current {
            self.apply_parse(request_id, response.result)
        } else {
            tracing::debug!("Discarding stale parse {}", request_id);
            self.bus.publish(Event::StaleParseDiscarded { request_id });
            Ok(ParseStatus::Discarded { request_id })
        };
        (status, completion.next)
    }

    fn apply_parse(
        &mut self,
        request_id: u64,
        result: Result<Vec<BlockDescriptor>, ParseError>,
    ) -> Result<ParseStatus, EngineError> {
        let derived = result.map_err(DeriveError::from).and_then(|descriptors| {
            arrange(
                descriptors,
                &self.settings.layout,
                DeriveOptions {
                    previous: self.graph.blocks(),
                    ..Default::default()
                },
            )
        });
        match derived {
            Ok(blocks) => Ok(ParseStatus::Applied(self.install(blocks, request_id)?)),
            Err(err) => {
                tracing::warn!("Derivation of {} failed: {}", self.file_name, err);
                self.last_error = Some(err.to_string());
                self.bus.publish(Event::ParseFailed {
                    request_id,
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    fn install(&mut self, blocks: Vec<Block>, request_id: u64) -> Result<DeriveOutcome, EngineError> {
        self.graph = BlockGraph::from_blocks(blocks)?;
        self.refresh_connections();
        self.last_error = None;
        self.auto_fit();
        let outcome = DeriveOutcome {
            request_id,
            block_count: self.graph.len(),
            connection_count: self.connections.len(),
        };
        self.bus.publish(Event::BlocksDerived {
            request_id,
            block_count: outcome.block_count,
            connection_count: outcome.connection_count,
        });
        Ok(outcome)
    }

    fn refresh_connections(&mut self) {
        self.connections = derive_connections(
            self.graph.blocks(),
            self.editor_position,
            &self.connections,
            &self.settings.layout,
        );
    }

    /// Re-lay out the current blocks without reparsing, keeping `x` and
    /// `width` of every block.
    fn relayout(&mut self, opening: Option<&BlockId>) -> Result<DeriveOutcome, EngineError> {
        let descriptors = self.graph.iter().map(Block::descriptor).collect();
        let blocks = arrange(
            descriptors,
            &self.settings.layout,
            DeriveOptions {
                previous: self.graph.blocks(),
                merge: GeometryMerge::PreserveSurviving,
                opening,
            },
        )?;
        let request_id = self.scheduler.latest_issued();
        self.install(blocks, request_id)
    }

    // ------------------------------------------------------------------
    // Block edits
    // ------------------------------------------------------------------

    /// Fold an edit of one block back into the buffer.
    ///
    /// Member edits are spliced into the parent class first. Nested
    /// sub-blocks found in the new code update the tracked blocks with the
    /// matching ids. The buffer is then rebuilt from every top-level block
    /// and derived like a direct buffer edit.
    pub fn on_block_code_change(
        &mut self,
        block_id: &BlockId,
        new_lines: &[String],
        line_number: usize,
    ) -> Result<BlockEdit, EngineError> {
        let new_code = new_lines.join("\n");
        let (old_code, old_line, parent) = {
            let block = self
                .graph
                .get(block_id)
                .ok_or_else(|| EngineError::UnknownBlock(block_id.clone()))?;
            (block.code.clone(), block.line_number, block.parent_class.clone())
        };

        if let Some(parent_id) = parent {
            let old_len = old_code.split('\n').count();
            let spliced = self.graph.get(&parent_id).and_then(|p| {
                buffer::splice_lines(&p.code, p.line_number, old_line, old_len, &new_code)
            });
            match (spliced, self.graph.get_mut(&parent_id)) {
                (Some(code), Some(parent_block)) => parent_block.code = code,
                _ => tracing::warn!("Could not splice {} into {}", block_id, parent_id),
            }
        }
        if let Some(block) = self.graph.get_mut(block_id) {
            block.code = new_code.clone();
            block.line_number = line_number;
        }

        let mut sub_blocks = Vec::new();
        for name in subblock::find_sub_blocks(&new_code) {
            let Some((id, span)) = self.resolve_sub_block(block_id, &new_code, &name, line_number)
            else {
                continue;
            };
            if span.code.trim().is_empty() {
                continue;
            }
            let sub_line = line_number + span.line;
            let Some(sub) = self.graph.get_mut(&id) else {
                continue;
            };
            sub.code = span.code.clone();
            sub.line_number = sub_line;
            self.bus.publish(Event::SubBlockUpdated {
                id: id.clone(),
                line_number: sub_line,
            });
            sub_blocks.push(SubBlockUpdate {
                id,
                line_number: sub_line,
                code: span.code,
            });
        }

        let buffer = buffer::join_blocks(self.graph.iter());
        let status = self.on_code_change(&buffer)?;
        Ok(BlockEdit {
            buffer,
            sub_blocks,
            status,
        })
    }

    /// Tracked block and code span for one detected sub-block.
    ///
    /// Named spans map to `{block_id}.{name}`. Statement runs are numbered by
    /// ordinal, not by row, so an anonymous `standalone_{row}` span maps to
    /// the statement member of `block_id` that starts on that buffer line.
    fn resolve_sub_block(
        &self,
        block_id: &BlockId,
        code: &str,
        name: &str,
        line_number: usize,
    ) -> Option<(BlockId, subblock::SubBlockSpan)> {
        let Some(row) = subblock::anonymous_row(name) else {
            let id = block_id.child(name);
            if !self.graph.contains(&id) {
                tracing::trace!("No tracked block for sub-block {}", id);
                return None;
            }
            return Some((id, subblock::extract_sub_block(code, name)?));
        };
        let start = line_number + row;
        let member = self
            .graph
            .members_of(block_id)
            .find(|m| m.kind == BlockKind::ClassStandalone && m.line_number == start)?;
        Some((member.id.clone(), subblock::extract_statement_run(code, row)?))
    }

    /// Move the editor (`EDITOR_ID`) or one block. Returns false for unknown ids.
    pub fn on_position_change(&mut self, id: &BlockId, x: f32, y: f32) -> bool {
        if id.is_editor() {
            self.editor_position = Vec2::new(x, y);
        } else {
            let Some(block) = self.graph.get_mut(id) else {
                return false;
            };
            block.x = x;
            block.y = y;
        }
        self.refresh_connections();
        true
    }

    pub fn on_block_width_change(&mut self, id: &BlockId, width: f32) -> bool {
        let Some(block) = self.graph.get_mut(id) else {
            return false;
        };
        block.width = width;
        self.refresh_connections();
        true
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    pub fn on_visibility_change(&mut self, id: &BlockId, is_visible: bool) -> bool {
        let found = VisibilityState::set_block_visibility(self.graph.blocks_mut(), id, is_visible);
        if found {
            self.bus.publish(Event::BlockVisibilityChanged {
                id: id.clone(),
                is_visible,
            });
        }
        found
    }

    /// Flip one block's flag; returns the new value.
    pub fn on_visibility_toggle(&mut self, id: &BlockId) -> Option<bool> {
        let is_visible = !self.graph.get(id)?.is_visible;
        self.on_visibility_change(id, is_visible);
        Some(is_visible)
    }

    pub fn on_connection_visibility_change(
        &mut self,
        connection_id: &ConnectionId,
        is_visible: bool,
        kind: ConnectionKind,
    ) -> VisibilityChange {
        let change = self.visibility.toggle_connection_visibility(
            self.graph.blocks_mut(),
            &mut self.connections,
            connection_id,
            is_visible,
            kind,
        );
        for id in &change.blocks {
            self.bus.publish(Event::BlockVisibilityChanged {
                id: id.clone(),
                is_visible,
            });
        }
        for id in &change.connections {
            self.bus.publish(Event::ConnectionVisibilityChanged {
                id: id.clone(),
                is_visible,
            });
        }
        change
    }

    pub fn set_sub_block_hidden(&mut self, id: &BlockId, hidden: bool) {
        self.visibility.set_sub_block_hidden(id.clone(), hidden);
    }

    // ------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------

    /// Open or close one panel and re-lay out with geometry preserved.
    ///
    /// Only one testing panel is open at a time.
    pub fn on_panel_change(
        &mut self,
        block_id: &BlockId,
        panel: PanelKind,
        is_open: bool,
    ) -> Result<DeriveOutcome, EngineError> {
        if !self.graph.contains(block_id) {
            return Err(EngineError::UnknownBlock(block_id.clone()));
        }
        if panel == PanelKind::Testing && is_open {
            for block in self.graph.iter_mut().filter(|b| &b.id != block_id) {
                block.panels.is_testing_open = false;
            }
        }
        if let Some(block) = self.graph.get_mut(block_id) {
            block.panels.set_open(panel, is_open);
        }
        self.relayout(is_open.then_some(block_id))
    }

    pub fn on_testing_panel_change(
        &mut self,
        block_id: &BlockId,
        is_open: bool,
    ) -> Result<DeriveOutcome, EngineError> {
        let outcome = self.on_panel_change(block_id, PanelKind::Testing, is_open)?;
        self.bus.publish(Event::TestingPanelChanged {
            id: block_id.clone(),
            is_open,
        });
        Ok(outcome)
    }

    /// Rows listed by a block's syntax-error panel; affects its height.
    pub fn set_syntax_error_count(
        &mut self,
        block_id: &BlockId,
        count: usize,
    ) -> Result<DeriveOutcome, EngineError> {
        let block = self
            .graph
            .get_mut(block_id)
            .ok_or_else(|| EngineError::UnknownBlock(block_id.clone()))?;
        block.panels.syntax_error_count = count;
        self.relayout(None)
    }

    pub fn documentation(&self) -> Result<Option<serde_json::Value>, EngineError> {
        Ok(self.store.get_json(&documentation_key(&self.file_name))?)
    }

    pub fn set_documentation(&self, value: &serde_json::Value) -> Result<(), EngineError> {
        Ok(self.store.set_json(&documentation_key(&self.file_name), value)?)
    }

    pub fn testing_data(&self) -> Result<Option<serde_json::Value>, EngineError> {
        Ok(self.store.get_json(&testing_key(&self.file_name))?)
    }

    pub fn set_testing_data(&self, value: &serde_json::Value) -> Result<(), EngineError> {
        Ok(self.store.set_json(&testing_key(&self.file_name), value)?)
    }

    // ------------------------------------------------------------------
    // Camera
    // ------------------------------------------------------------------

    fn publish_camera(&self) {
        self.bus.publish(Event::CameraChanged {
            zoom: self.camera.zoom,
            scroll_x: self.camera.scroll.x,
            scroll_y: self.camera.scroll.y,
        });
    }

    fn auto_fit(&mut self) {
        if self.camera.auto_fit(self.graph.iter()).is_some() {
            self.publish_camera();
        }
    }

    /// Fit every block into the viewport regardless of auto-zoom mode.
    pub fn fit_to_bounds(&mut self) -> Option<FitResult> {
        let fit = self.camera.fit(self.graph.iter())?;
        self.publish_camera();
        Some(fit)
    }

    /// Center the camera on a block. `None` for unknown ids.
    pub fn on_block_select(&mut self, id: &BlockId) -> Option<FocusResult> {
        let block = self.graph.get(id)?;
        let focus = self.camera.focus(block);
        self.bus.publish(Event::BlockSelected { id: id.clone() });
        self.publish_camera();
        Some(focus)
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.camera.set_viewport(viewport);
        self.auto_fit();
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
        self.publish_camera();
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
        self.publish_camera();
    }

    pub fn reset_zoom(&mut self) {
        self.camera.reset_zoom();
        self.publish_camera();
    }

    pub fn pan(&mut self, direction: PanDirection) {
        self.camera.pan(direction);
        self.publish_camera();
    }

    pub fn toggle_auto_zoom(&mut self) -> bool {
        let enabled = self.camera.toggle_auto_zoom();
        self.auto_fit();
        enabled
    }

    pub fn toggle_auto_zoom_lock(&mut self) -> bool {
        self.camera.toggle_auto_zoom_lock()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selected(&self) -> Option<BlockId> {
        self.cursor.current(self.graph.blocks())
    }

    /// Cycle through blocks of `kind` (all blocks for `None`) and focus the result.
    pub fn cycle_blocks(&mut self, kind: Option<BlockKind>) -> Option<FocusResult> {
        let id = self.cursor.cycle(kind, self.graph.blocks())?;
        self.on_block_select(&id)
    }

    pub fn select_next(&mut self) -> Option<FocusResult> {
        let id = self.cursor.next(self.graph.blocks())?;
        self.on_block_select(&id)
    }

    pub fn select_previous(&mut self) -> Option<FocusResult> {
        let id = self.cursor.previous(self.graph.blocks())?;
        self.on_block_select(&id)
    }

    pub fn toggle_selected_visibility(&mut self) -> Option<bool> {
        let id = self.selected()?;
        self.on_visibility_toggle(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecanvas_storage::MemoryStore;
    use std::sync::Arc;

    fn line_parser() -> SharedParser {
        // One code block per non-blank line; `!` marks a syntax error.
        Arc::new(
            |source: &str, file: &str| -> Result<Vec<BlockDescriptor>, ParseError> {
                if let Some(row) = source.lines().position(|l| l.contains('!')) {
                    return Err(ParseError::syntax(file, row as u32 + 1, 1, "unexpected `!`"));
                }
                Ok(source
                    .lines()
                    .enumerate()
                    .filter(|(_, l)| !l.trim().is_empty())
                    .map(|(row, line)| BlockDescriptor {
                        id: BlockId::new(format!("{file}.Block_{}", row + 1)),
                        kind: BlockKind::Code,
                        name: format!("Block_{}", row + 1),
                        parent_class: None,
                        code: line.to_string(),
                        line_number: row + 1,
                        author: String::new(),
                        location: String::new(),
                        file_type: String::new(),
                    })
                    .collect())
            },
        )
    }

    fn engine() -> CanvasEngine<MemoryStore> {
        CanvasEngine::new(
            "m.py",
            line_parser(),
            MemoryStore::new(),
            EngineSettings::default(),
        )
    }

    #[test]
    fn test_failed_parse_keeps_last_good_blocks() {
        let mut engine = engine();
        engine.on_code_change("a = 1\nb = 2").unwrap();
        assert_eq!(engine.blocks().len(), 2);

        let result = engine.on_code_change("a = 1\nb = !");
        assert!(matches!(result, Err(EngineError::Derive(DeriveError::Parse(_)))));
        assert_eq!(engine.blocks().len(), 2);
        assert_eq!(engine.buffer(), "a = 1\nb = !");
        assert!(engine.last_error().is_some());
        assert!(!engine.is_parsing());

        engine.on_code_change("a = 1").unwrap();
        assert_eq!(engine.blocks().len(), 1);
        assert!(engine.last_error().is_none());
    }

    #[test]
    fn test_stale_worker_result_is_discarded() {
        let mut engine = engine();
        let first = engine.begin_parse("a = 1").unwrap();
        assert_eq!(first, ParseStatus::Dispatched { request_id: 1 });
        assert_eq!(
            engine.on_code_change("a = 1\nb = 2").unwrap(),
            ParseStatus::Queued { request_id: 2 }
        );

        let status = engine.poll_parse(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(status, ParseStatus::Discarded { request_id: 1 });
        assert!(engine.blocks().is_empty());

        let status = engine.poll_parse(Duration::from_secs(5)).unwrap().unwrap();
        assert!(matches!(
            status,
            ParseStatus::Applied(DeriveOutcome { request_id: 2, block_count: 2, .. })
        ));
        assert!(!engine.is_parsing());
    }

    #[test]
    fn test_position_change_moves_editor_and_connections() {
        let mut engine = engine();
        engine.on_code_change("a = 1").unwrap();
        assert!(engine.on_position_change(&BlockId::editor(), 100.0, 50.0));
        assert_eq!(engine.connections()[0].start_point, Vec2::new(700.0, 90.0));

        let id = BlockId::new("m.py.Block_1");
        assert!(engine.on_position_change(&id, 10.0, 20.0));
        assert_eq!(engine.connections()[0].end_point, Vec2::new(10.0, 45.0));
        assert!(!engine.on_position_change(&BlockId::new("nope"), 0.0, 0.0));
    }
}
