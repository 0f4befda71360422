use crate::scheduler::ParseRequest;
use codecanvas_core::{BlockDescriptor, ParseError, SourceParser};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub type SharedParser = Arc<dyn SourceParser + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResponse {
    pub request_id: u64,
    pub result: Result<Vec<BlockDescriptor>, ParseError>,
}

/// Runs a parser on a background thread, one request at a time.
pub struct ParseWorker {
    requests: Option<Sender<ParseRequest>>,
    responses: Receiver<ParseResponse>,
    handle: Option<JoinHandle<()>>,
}

impl ParseWorker {
    pub fn spawn(parser: SharedParser, file_name: String) -> Self {
        let (request_tx, request_rx) = unbounded::<ParseRequest>();
        let (response_tx, response_rx) = unbounded();

        let handle = std::thread::spawn(move || {
            while let Ok(request) = request_rx.recv() {
                tracing::debug!("Parsing request {} for {}", request.request_id, file_name);
                let result = parser.parse(&request.source, &file_name);
                let response = ParseResponse {
                    request_id: request.request_id,
                    result,
                };
                if response_tx.send(response).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        }
    }

    /// Hands the request back when the worker thread has gone away.
    pub fn submit(&self, request: ParseRequest) -> Result<(), ParseRequest> {
        match &self.requests {
            Some(tx) => tx.send(request).map_err(|e| e.into_inner()),
            None => Err(request),
        }
    }

    pub fn try_recv(&self) -> Option<ParseResponse> {
        self.responses.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ParseResponse> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("Parse worker disconnected");
                None
            }
        }
    }
}

impl Drop for ParseWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("Parse worker panicked");
        }
    }
}
