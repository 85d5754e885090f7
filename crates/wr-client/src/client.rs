//! Typed client for the reporting backend
//!
//! Every operation sends one request through the [`Transport`], decodes the
//! payload under its contract and converts it into model types. Nothing is
//! cached or retried here.

use crate::decode::{decode, decode_lenient, Lenient};
use crate::error::{ReportResult, ValidationError};
use crate::http::HttpTransport;
use crate::schema::{
    AnalysisRecord, CommonProblemsPayload, DocumentDetailsRecord, DocumentRecord, RequestDetails, RequestDetailsRecord,
    WardIssueRecord, WardReportPayload,
};
use crate::transport::{ApiRequest, Endpoint, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use wr_grouping::{group_by_ward, group_common_problems};
use wr_model::{
    AnalysisEntry, Document, DocumentId, IssueTag, ProblemGroup, ProblemRef, Request, RequestId,
    User, Ward, WardGroup,
};

/// Common-problems summary of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonProblemsReport {
    /// Request title
    pub title: String,
    /// Groups in first-encounter order
    pub groups: Vec<ProblemGroup>,
}

impl CommonProblemsReport {
    /// Group by upstream id
    #[must_use]
    pub fn group(&self, key: &wr_model::GroupKey) -> Option<&ProblemGroup> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// Sum of member counts over all groups
    #[must_use]
    pub fn total_members(&self) -> usize {
        self.groups.iter().map(ProblemGroup::count).sum()
    }
}

/// Ward-scoped summary of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardReport {
    /// Request the report belongs to
    pub request_id: RequestId,
    /// Groups in first-encounter order
    pub groups: Vec<WardGroup>,
}

impl WardReport {
    /// Group by `(wardId, summary)`
    #[must_use]
    pub fn group(&self, key: &wr_model::WardGroupKey) -> Option<&WardGroup> {
        self.groups.iter().find(|g| &g.key() == key)
    }
}

/// Reporting backend client
#[derive(Clone)]
pub struct ReportClient {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ReportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportClient").finish_non_exhaustive()
    }
}

impl ReportClient {
    /// Create client over a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create client over HTTP
    ///
    /// # Errors
    /// `ReportError::Network` if the transport cannot be built
    pub fn http(base_url: &str, timeout: Duration) -> ReportResult<Self> {
        let transport = HttpTransport::new(base_url, timeout)?;
        Ok(Self::new(Arc::new(transport)))
    }

    async fn fetch<T>(&self, request: ApiRequest) -> ReportResult<T>
    where
        T: DeserializeOwned + crate::schema::Validate,
    {
        let endpoint = request.endpoint.name();
        let payload = self.transport.send(request).await?;
        Ok(decode(endpoint, payload)?)
    }

    /// Common-problems groups of a request
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id))]
    pub async fn common_problems(&self, request_id: &RequestId) -> ReportResult<CommonProblemsReport> {
        let payload: CommonProblemsPayload = self
            .fetch(ApiRequest::new(Endpoint::CommonProblems, [request_id.as_str()]))
            .await?;
        let (title, fragments) = payload.into_fragments();
        let groups = group_common_problems(fragments);
        tracing::info!(groups = groups.len(), "loaded common problems");
        Ok(CommonProblemsReport { title, groups })
    }

    /// Ward-scoped groups of a request
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id))]
    pub async fn ward_wise_report(&self, request_id: &RequestId) -> ReportResult<WardReport> {
        let payload: WardReportPayload = self
            .fetch(ApiRequest::new(Endpoint::WardWiseReport, [request_id.as_str()]))
            .await?;
        let (reported_id, wards) = payload.into_wards();
        if &reported_id != request_id {
            tracing::debug!(%reported_id, "ward report carries a different request id");
        }
        let groups = group_by_ward(wards);
        tracing::info!(groups = groups.len(), "loaded ward report");
        Ok(WardReport {
            request_id: reported_id,
            groups,
        })
    }

    /// Per-ward analytics of a request, in payload order
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id))]
    pub async fn analysis(&self, request_id: &RequestId) -> ReportResult<Vec<AnalysisEntry>> {
        let records: Vec<AnalysisRecord> = self
            .fetch(ApiRequest::new(Endpoint::Analysis, [request_id.as_str()]))
            .await?;
        tracing::info!(wards = records.len(), "loaded analysis");
        Ok(records.into_iter().map(AnalysisEntry::from).collect())
    }

    /// Documents carrying an issue
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id, issue = %issue))]
    pub async fn tagged_docs(&self, request_id: &RequestId, issue: &IssueTag) -> ReportResult<Vec<Document>> {
        let records: Vec<DocumentRecord> = self
            .fetch(ApiRequest::new(
                Endpoint::TaggedDocs,
                [request_id.as_str(), issue.as_str()],
            ))
            .await?;
        Ok(records.into_iter().map(Document::from).collect())
    }

    /// Documents holding the given members
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id, members = members.len()))]
    pub async fn grouped_issues(&self, request_id: &RequestId, members: &[ProblemRef]) -> ReportResult<Vec<Document>> {
        let body = serde_json::to_value(members).map_err(|e| {
            ValidationError::new(Endpoint::GroupedIssues.name(), "problemIds", e.to_string())
        })?;
        let records: Vec<DocumentRecord> = self
            .fetch(ApiRequest::new(Endpoint::GroupedIssues, [request_id.as_str()]).with_body(body))
            .await?;
        Ok(records.into_iter().map(Document::from).collect())
    }

    /// (document, problem) pairs of one ward carrying an issue
    ///
    /// Each returned document holds exactly one problem.
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id, ward = %ward, issue = %issue))]
    pub async fn ward_issue_problems(
        &self,
        request_id: &RequestId,
        ward: &Ward,
        issue: &IssueTag,
    ) -> ReportResult<Vec<Document>> {
        let records: Vec<WardIssueRecord> = self
            .fetch(ApiRequest::new(
                Endpoint::WardIssueProblems,
                [request_id.as_str(), ward.as_str(), issue.as_str()],
            ))
            .await?;
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(position, record)| record.into_document(position))
            .collect())
    }

    /// All requests; one bad element rejects the listing
    ///
    /// # Errors
    /// `Validation` or `Network`
    #[instrument(skip(self))]
    pub async fn list_requests(&self) -> ReportResult<Vec<Request>> {
        self.fetch(ApiRequest::new(Endpoint::ListRequests, Vec::<String>::new()))
            .await
    }

    /// One request with its documents
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id))]
    pub async fn request_details(&self, request_id: &RequestId) -> ReportResult<RequestDetails> {
        let record: RequestDetailsRecord = self
            .fetch(ApiRequest::new(Endpoint::RequestDetails, [request_id.as_str()]))
            .await?;
        Ok(RequestDetails::from(record))
    }

    /// One document of a request
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id, document = %document_id))]
    pub async fn document_details(&self, request_id: &RequestId, document_id: &DocumentId) -> ReportResult<Document> {
        let record: DocumentDetailsRecord = self
            .fetch(ApiRequest::new(
                Endpoint::DocumentDetails,
                [request_id.as_str(), document_id.as_str()],
            ))
            .await?;
        Ok(Document::from(record))
    }

    /// All users; invalid elements are dropped and reported
    ///
    /// # Errors
    /// `Validation` if the payload is not an array, or `Network`
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> ReportResult<Lenient<User>> {
        let request = ApiRequest::new(Endpoint::ListUsers, Vec::<String>::new());
        let endpoint = request.endpoint.name();
        let payload = self.transport.send(request).await?;
        let listing = decode_lenient::<User>(endpoint, payload)?;
        if !listing.is_complete() {
            tracing::warn!(
                skipped = listing.skipped.len(),
                kept = listing.items.len(),
                "user listing partially invalid"
            );
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReportError, TransportError};
    use crate::transport::MockTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wr_model::{GroupKey, ProblemId, RequestStatus};

    fn client_with(mock: MockTransport) -> ReportClient {
        ReportClient::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn common_problems_fold_duplicate_groups() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.endpoint == Endpoint::CommonProblems && req.args == vec!["r1".to_string()])
            .times(1)
            .returning(|_| {
                Ok(json!({
                    "title": "Survey",
                    "commonProblems": [
                        {"id": "g1", "issues": ["leak"], "summary": "Pipes",
                         "problemIds": [{"docId": "d1", "problemId": "p1"}]},
                        {"id": "g2", "issues": [], "summary": "Roads",
                         "problemIds": [{"docId": "d2", "problemId": "p2"}]},
                        {"id": "g1", "issues": ["noise"], "summary": "Pipes",
                         "problemIds": [{"docId": "d1", "problemId": "p1"},
                                        {"docId": "d3", "problemId": "p3"}]}
                    ]
                }))
            });

        let report = client_with(mock)
            .common_problems(&RequestId::new("r1"))
            .await
            .unwrap();

        assert_eq!(report.title, "Survey");
        assert_eq!(report.groups.len(), 2);
        let g1 = report.group(&GroupKey::new("g1")).unwrap();
        assert_eq!(g1.count(), 2);
        assert_eq!(report.total_members(), 3);
    }

    #[tokio::test]
    async fn not_found_maps_to_not_found() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .returning(|req| Err(TransportError::NotFound(req.display_path())));

        let err = client_with(mock)
            .analysis(&RequestId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NotFound { .. }));
    }

    #[tokio::test]
    async fn connection_failure_maps_to_network() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .returning(|_| Err(TransportError::Connection("refused".to_string())));

        let err = client_with(mock)
            .tagged_docs(&RequestId::new("r1"), &IssueTag::new("leak"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Network(_)));
        assert!(err.is_user_visible());
    }

    #[tokio::test]
    async fn malformed_document_rejects_whole_payload() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Ok(json!([
                {"id": "d1", "name": "A", "issues": [], "problems": []},
                {"id": "d2", "issues": [], "problems": []}
            ]))
        });

        let err = client_with(mock)
            .tagged_docs(&RequestId::new("r1"), &IssueTag::new("leak"))
            .await
            .unwrap_err();
        match err {
            ReportError::Validation(v) => {
                assert_eq!(v.endpoint, "taggedDocs");
                assert!(v.path.starts_with("[1]"), "{}", v.path);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn grouped_issues_posts_member_list() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.body
                    == Some(json!([{"docId": "d1", "problemId": "p1"}]))
            })
            .returning(|_| {
                Ok(json!([{
                    "id": "d1", "name": "Jane Doe (alt)", "ward": "4", "phoneNumber": "99",
                    "issues": ["leak"],
                    "problems": [{"_id": "p1", "category": ["leak"],
                                  "description": {"english": "Leak", "hindi": "रिसाव"}}]
                }]))
            });

        let docs = client_with(mock)
            .grouped_issues(&RequestId::new("r1"), &[ProblemRef::new("d1", "p1")])
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].display_name(), "Jane Doe");
        assert_eq!(docs[0].problems[0].id, ProblemId::new("p1"));
    }

    #[tokio::test]
    async fn ward_issue_elements_hold_one_problem() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.args == vec!["r1".to_string(), "5".to_string(), "leak".to_string()])
            .returning(|_| {
                Ok(json!([
                    {"id": "d1", "name": "A", "ward": "5",
                     "problems": {"id": "p1", "category": ["leak"],
                                  "description": {"english": "x", "hindi": "y"}}},
                    {"id": "d1", "name": "A", "ward": "5",
                     "problems": {"id": "p2", "category": ["leak", "noise"],
                                  "description": {"english": "z", "hindi": "w"}}}
                ]))
            });

        let docs = client_with(mock)
            .ward_issue_problems(&RequestId::new("r1"), &Ward::new("5"), &IssueTag::new("leak"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.problems.len() == 1));
    }

    #[tokio::test]
    async fn document_details_reject_problem_without_id() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Ok(json!({
                "id": "d1", "name": "A", "issues": [],
                "problems": [{"category": ["leak"], "description": {"english": "x", "hindi": "y"}}]
            }))
        });

        let err = client_with(mock)
            .document_details(&RequestId::new("r1"), &DocumentId::new("d1"))
            .await
            .unwrap_err();
        match err {
            ReportError::Validation(v) => assert_eq!(v.path, "problems[0].id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn request_listing_is_strict() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Ok(json!([
                {"id": "r1", "title": "a", "description": "", "docCount": 1,
                 "createdBy": "x", "createdAt": "t", "reqStatus": 2},
                {"id": "r2", "title": "b", "description": "", "docCount": 1,
                 "createdBy": "x", "createdAt": "t", "reqStatus": 9}
            ]))
        });

        let err = client_with(mock).list_requests().await.unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)));
    }

    #[tokio::test]
    async fn request_details_decode_status() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Ok(json!({
                "id": "r1", "title": "a", "createdBy": "x", "createdAt": "t",
                "reqStatus": 1, "documents": []
            }))
        });

        let details = client_with(mock)
            .request_details(&RequestId::new("r1"))
            .await
            .unwrap();
        assert_eq!(details.status, RequestStatus::InProgress);
        assert!(details.documents.is_empty());
    }

    #[tokio::test]
    async fn user_listing_skips_bad_items() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.endpoint == Endpoint::ListUsers)
            .returning(|_| {
                Ok(json!([
                    {"id": "u1", "name": "Asha", "email": "a@example.org"},
                    {"id": 7, "name": "Broken", "email": "b@example.org"}
                ]))
            });

        let users = client_with(mock).list_users().await.unwrap();
        assert_eq!(users.items.len(), 1);
        assert_eq!(users.skipped[0].index, 1);
    }
}
