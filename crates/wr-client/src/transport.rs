//! Transport seam
//!
//! The client speaks to the reporting backend through [`Transport`]. Framing
//! is the transport's business; the client only deals in endpoint names,
//! path segments and JSON values.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;

/// HTTP-style verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read
    Get,
    /// Query with a body
    Post,
}

/// Backend operations known to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Cross-document common problems of a request
    CommonProblems,
    /// Ward-scoped groups of a request
    WardWiseReport,
    /// Per-ward issue counts of a request
    Analysis,
    /// Documents carrying one issue
    TaggedDocs,
    /// Documents holding an explicit member list
    GroupedIssues,
    /// (document, problem) pairs of one ward carrying one issue
    WardIssueProblems,
    /// All requests
    ListRequests,
    /// One request with its documents
    RequestDetails,
    /// One document
    DocumentDetails,
    /// All users
    ListUsers,
}

impl Endpoint {
    /// Stable name, used in logs and errors
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CommonProblems => "commonProblems",
            Self::WardWiseReport => "wardWiseReport",
            Self::Analysis => "analysis",
            Self::TaggedDocs => "taggedDocs",
            Self::GroupedIssues => "groupedIssues",
            Self::WardIssueProblems => "wardIssueProblems",
            Self::ListRequests => "listRequests",
            Self::RequestDetails => "reqDetails",
            Self::DocumentDetails => "docDetails",
            Self::ListUsers => "listUsers",
        }
    }

    /// Verb used for this endpoint
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::GroupedIssues => Method::Post,
            _ => Method::Get,
        }
    }

    fn scope(self) -> &'static str {
        match self {
            Self::ListUsers => "users",
            _ => "requests",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One call to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Target operation
    pub endpoint: Endpoint,
    /// Path arguments, unescaped
    pub args: Vec<String>,
    /// JSON body for [`Method::Post`]
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create request with path arguments
    pub fn new<I, S>(endpoint: Endpoint, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoint,
            args: args.into_iter().map(Into::into).collect(),
            body: None,
        }
    }

    /// With JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Verb for this request
    #[inline]
    #[must_use]
    pub fn method(&self) -> Method {
        self.endpoint.method()
    }

    /// Full list of unescaped path segments, e.g.
    /// `["api", "requests", "taggedDocs", "r1", "water leak"]`
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = vec!["api", self.endpoint.scope(), self.endpoint.name()];
        segments.extend(self.args.iter().map(String::as_str));
        segments
    }

    /// Path for logs, arguments unescaped
    #[must_use]
    pub fn display_path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }
}

/// Sends requests to the reporting backend
///
/// Implementations must map "resource does not exist" to
/// [`TransportError::NotFound`]; every other failure is a network failure
/// as far as the caller is concerned.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the decoded JSON body
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_include_scope_and_args() {
        let req = ApiRequest::new(Endpoint::WardIssueProblems, ["r1", "5", "water leak"]);
        assert_eq!(
            req.segments(),
            vec!["api", "requests", "wardIssueProblems", "r1", "5", "water leak"]
        );
        assert_eq!(req.method(), Method::Get);
    }

    #[test]
    fn users_live_under_their_own_scope() {
        let req = ApiRequest::new(Endpoint::ListUsers, Vec::<String>::new());
        assert_eq!(req.display_path(), "/api/users/listUsers");
    }

    #[test]
    fn grouped_issues_is_a_post() {
        let req = ApiRequest::new(Endpoint::GroupedIssues, ["r1"]).with_body(serde_json::json!([]));
        assert_eq!(req.method(), Method::Post);
        assert!(req.body.is_some());
    }
}
