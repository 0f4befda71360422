//! Single-slot parse scheduling with stale-result detection.
//!
//! At most one parse is in flight. A submission arriving meanwhile takes the
//! pending slot, replacing any older pending submission. Results whose id is
//! not the latest issued id are stale.

/// Source text tagged with a monotonically increasing id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    pub request_id: u64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Nothing in flight: run this request now.
    Dispatch(ParseRequest),
    /// A parse is in flight; the request waits in the pending slot.
    Queued { request_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The finished request is the latest issued one and may be applied.
    pub is_current: bool,
    /// Pending request to dispatch next, if any.
    pub next: Option<ParseRequest>,
}

#[derive(Debug, Default)]
pub struct ParseScheduler {
    latest_issued: u64,
    in_flight: Option<u64>,
    pending: Option<ParseRequest>,
}

impl ParseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_issued(&self) -> u64 {
        self.latest_issued
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending(&self) -> Option<&ParseRequest> {
        self.pending.as_ref()
    }

    pub fn submit(&mut self, source: String) -> Submission {
        self.latest_issued += 1;
        let request = ParseRequest {
            request_id: self.latest_issued,
            source,
        };
        if self.in_flight.is_some() {
            if let Some(replaced) = self.pending.replace(request) {
                tracing::debug!("Pending parse {} superseded", replaced.request_id);
            }
            return Submission::Queued {
                request_id: self.latest_issued,
            };
        }
        self.in_flight = Some(request.request_id);
        Submission::Dispatch(request)
    }

    /// Record that `request_id` finished and hand out the pending request.
    pub fn complete(&mut self, request_id: u64) -> Completion {
        if self.in_flight == Some(request_id) {
            self.in_flight = None;
        }
        let is_current = request_id == self.latest_issued;
        let next = if self.in_flight.is_none() {
            self.pending.take()
        } else {
            None
        };
        if let Some(next) = &next {
            self.in_flight = Some(next.request_id);
        }
        Completion { is_current, next }
    }
}
