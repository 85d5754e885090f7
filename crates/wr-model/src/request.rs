//! Requests and users
//!
//! A request is mutated only by the generation workflow outside this engine.
//! The two mutators here replay the generation events the workflow emits.

use crate::error::ModelError;
use crate::ids::RequestId;
use serde::{Deserialize, Serialize};

/// Request lifecycle status, transmitted as a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RequestStatus {
    /// Created, generation not started (`0`)
    Draft,
    /// Generation running (`1`)
    InProgress,
    /// Generation finished (`2`)
    Completed,
}

impl TryFrom<u8> for RequestStatus {
    type Error = ModelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Draft),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Completed),
            other => Err(ModelError::UnknownStatus(other)),
        }
    }
}

impl From<RequestStatus> for u8 {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Draft => 0,
            RequestStatus::InProgress => 1,
            RequestStatus::Completed => 2,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Draft => "Draft",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        })
    }
}

/// A batch submission of scanned documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Request identifier
    pub id: RequestId,
    /// Title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Source PDF references
    #[serde(default)]
    pub pdf: Vec<String>,
    /// Number of documents generated so far
    pub doc_count: u64,
    /// Creator
    pub created_by: String,
    /// Creation timestamp as sent by the backend
    pub created_at: String,
    /// Lifecycle status
    #[serde(rename = "reqStatus")]
    pub status: RequestStatus,
}

impl Request {
    /// Generation progressed by `docs` documents
    pub fn record_docs_delta(&mut self, docs: u64) {
        self.status = RequestStatus::InProgress;
        self.doc_count = self.doc_count.saturating_add(docs);
    }

    /// Generation finished
    pub fn mark_completed(&mut self) {
        self.status = RequestStatus::Completed;
    }
}

/// A user as returned by the bulk listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Request {
        serde_json::from_value(serde_json::json!({
            "id": "r1",
            "title": "Ward survey",
            "description": "March intake",
            "docCount": 3,
            "createdBy": "admin",
            "createdAt": "2024-03-01T10:00:00Z",
            "reqStatus": 0
        }))
        .unwrap()
    }

    #[test]
    fn status_decodes_from_number() {
        let req = sample();
        assert_eq!(req.status, RequestStatus::Draft);
        assert!(req.pdf.is_empty());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let res: Result<RequestStatus, _> = serde_json::from_value(serde_json::json!(7));
        assert!(res.is_err());
    }

    #[test]
    fn generation_events_update_request() {
        let mut req = sample();
        req.record_docs_delta(2);
        assert_eq!(req.status, RequestStatus::InProgress);
        assert_eq!(req.doc_count, 5);

        req.mark_completed();
        assert_eq!(req.status, RequestStatus::Completed);
        assert_eq!(req.status.to_string(), "Completed");
    }
}
