use codecanvas_core::{BlockId, ConnectionId};
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Buffer
    BufferChanged {
        file_name: String,
        length: usize,
    },
    PersistFailed {
        key: String,
        error: String,
    },

    // Derivation
    BlocksDerived {
        request_id: u64,
        block_count: usize,
        connection_count: usize,
    },
    ParseFailed {
        request_id: u64,
        message: String,
    },
    StaleParseDiscarded {
        request_id: u64,
    },
    ParseQueued {
        request_id: u64,
    },

    // Block edits
    SubBlockUpdated {
        id: BlockId,
        line_number: usize,
    },

    // Visibility
    BlockVisibilityChanged {
        id: BlockId,
        is_visible: bool,
    },
    ConnectionVisibilityChanged {
        id: ConnectionId,
        is_visible: bool,
    },

    // Panels
    TestingPanelChanged {
        id: BlockId,
        is_open: bool,
    },

    // Camera
    CameraChanged {
        zoom: f32,
        scroll_x: f32,
        scroll_y: f32,
    },
    BlockSelected {
        id: BlockId,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        tracing::trace!("event: {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Collect every pending event without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Trait for components that respond to events.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
