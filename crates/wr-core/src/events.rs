//! Request generation events
//!
//! The generation workflow reports progress as typed events. Sessions
//! subscribe through the [`AppContext`](crate::AppContext); a
//! [`RequestBoard`] replays them onto request listings.

use dashmap::DashMap;
use wr_model::{Request, RequestId};

/// Progress of a request's document generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    /// More documents were generated
    DocsDelta {
        /// Request being generated
        request_id: RequestId,
        /// Documents added since the last event
        docs_delta: u64,
    },
    /// Generation finished
    Completed {
        /// Request that finished
        request_id: RequestId,
    },
}

impl RequestEvent {
    /// Request the event is about
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::DocsDelta { request_id, .. } | Self::Completed { request_id } => request_id,
        }
    }

    /// Replay onto a request
    pub fn apply(&self, request: &mut Request) {
        match self {
            Self::DocsDelta { docs_delta, .. } => request.record_docs_delta(*docs_delta),
            Self::Completed { .. } => request.mark_completed(),
        }
    }
}

/// Live view of request statuses
#[derive(Debug, Default)]
pub struct RequestBoard {
    requests: DashMap<RequestId, Request>,
}

impl RequestBoard {
    /// Create board from a listing
    #[must_use]
    pub fn new(requests: impl IntoIterator<Item = Request>) -> Self {
        Self {
            requests: requests.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Apply an event; returns the updated request when known
    pub fn apply(&self, event: &RequestEvent) -> Option<Request> {
        let mut entry = self.requests.get_mut(event.request_id())?;
        event.apply(&mut entry);
        Some(entry.clone())
    }

    /// Current state of one request
    #[must_use]
    pub fn get(&self, request_id: &RequestId) -> Option<Request> {
        self.requests.get(request_id).map(|r| r.clone())
    }

    /// Number of tracked requests
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no request is tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
