//! Wire payloads and their contracts
//!
//! Each payload is deserialized first (types, required fields), then run
//! through [`Validate`] for the semantic rules serde cannot express, such as
//! identifiers that must be non-empty. Unknown fields are ignored.
//! Conversions into model types happen only after validation succeeds.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use wr_grouping::{GroupFragment, WardFragment, WardProblems};
use wr_model::{
    AnalysisEntry, Description, Document, DocumentId, GroupKey, IssueCount, IssueTag, Problem,
    ProblemId, ProblemRef, Request, RequestId, RequestStatus, User, Ward, WardId,
};

/// Semantic checks run after deserialization
pub trait Validate {
    /// Check the payload, reporting the first offending field
    ///
    /// # Errors
    /// A [`FieldError`] pointing at the first field breaking the contract
    fn validate(&self) -> Result<(), FieldError>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), FieldError> {
        for (index, item) in self.iter().enumerate() {
            item.validate().map_err(|e| e.at_index(index))?;
        }
        Ok(())
    }
}

fn non_empty(value: &str, field: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        Err(FieldError::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}

/// `{docId, problemId}` member reference
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRefRecord {
    pub doc_id: String,
    pub problem_id: String,
}

impl Validate for ProblemRefRecord {
    fn validate(&self) -> Result<(), FieldError> {
        non_empty(&self.doc_id, "docId")?;
        non_empty(&self.problem_id, "problemId")
    }
}

impl From<ProblemRefRecord> for ProblemRef {
    fn from(record: ProblemRefRecord) -> Self {
        ProblemRef::new(record.doc_id, record.problem_id)
    }
}

fn tags(labels: Vec<String>) -> Vec<IssueTag> {
    labels.into_iter().map(IssueTag::from).collect()
}

/// `getCommonProblems` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonProblemsPayload {
    pub title: String,
    pub common_problems: Vec<CommonProblemRecord>,
}

/// One upstream common-problem group
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonProblemRecord {
    pub id: String,
    pub issues: Vec<String>,
    pub problem_ids: Vec<ProblemRefRecord>,
    pub summary: String,
}

impl Validate for CommonProblemsPayload {
    fn validate(&self) -> Result<(), FieldError> {
        self.common_problems
            .validate()
            .map_err(|e| e.within("commonProblems"))
    }
}

impl Validate for CommonProblemRecord {
    fn validate(&self) -> Result<(), FieldError> {
        non_empty(&self.id, "id")?;
        self.problem_ids
            .validate()
            .map_err(|e| e.within("problemIds"))
    }
}

impl CommonProblemsPayload {
    /// Split into title and grouping fragments
    #[must_use]
    pub fn into_fragments(self) -> (String, Vec<GroupFragment>) {
        let fragments = self
            .common_problems
            .into_iter()
            .map(|record| GroupFragment {
                key: GroupKey::new(record.id),
                summary: record.summary,
                issues: tags(record.issues),
                members: record.problem_ids.into_iter().map(ProblemRef::from).collect(),
            })
            .collect();
        (self.title, fragments)
    }
}

/// `getWardWiseReport` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardReportPayload {
    pub req_id: String,
    pub wards: Vec<WardRecord>,
}

/// One ward section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardRecord {
    pub ward_id: String,
    pub ward: String,
    pub category: String,
    pub problems: Vec<WardProblemRecord>,
}

/// One intra-ward group fragment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardProblemRecord {
    pub issues: Vec<String>,
    pub problem_ids: Vec<ProblemRefRecord>,
    pub summary: String,
}

impl Validate for WardReportPayload {
    fn validate(&self) -> Result<(), FieldError> {
        non_empty(&self.req_id, "reqId")?;
        self.wards.validate().map_err(|e| e.within("wards"))
    }
}

impl Validate for WardRecord {
    fn validate(&self) -> Result<(), FieldError> {
        non_empty(&self.ward_id, "wardId")?;
        non_empty(&self.category, "category")?;
        self.problems.validate().map_err(|e| e.within("problems"))
    }
}

impl Validate for WardProblemRecord {
    fn validate(&self) -> Result<(), FieldError> {
        self.problem_ids
            .validate()
            .map_err(|e| e.within("problemIds"))
    }
}

impl WardReportPayload {
    /// Split into request id and per-ward grouping input
    #[must_use]
    pub fn into_wards(self) -> (RequestId, Vec<WardProblems>) {
        let wards = self
            .wards
            .into_iter()
            .map(|record| WardProblems {
                ward_id: WardId::new(record.ward_id),
                ward: Ward::new(record.ward),
                category: record.category,
                fragments: record
                    .problems
                    .into_iter()
                    .map(|p| WardFragment {
                        summary: p.summary,
                        issues: tags(p.issues),
                        members: p.problem_ids.into_iter().map(ProblemRef::from).collect(),
                    })
                    .collect(),
            })
            .collect();
        (RequestId::new(self.req_id), wards)
    }
}

/// One ward of the `getAnalysis` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub ward: String,
    pub total_problems: u64,
    pub category: Vec<IssueCountRecord>,
}

/// One `(issue, problemCount)` pair
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCountRecord {
    pub issue: String,
    pub problem_count: u64,
}

impl Validate for AnalysisRecord {
    fn validate(&self) -> Result<(), FieldError> {
        Ok(())
    }
}

impl From<AnalysisRecord> for AnalysisEntry {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            ward: Ward::new(record.ward),
            total_problems: record.total_problems,
            category: record
                .category
                .into_iter()
                .map(|c| IssueCount {
                    issue: IssueTag::new(c.issue),
                    problem_count: c.problem_count,
                })
                .collect(),
        }
    }
}

/// Bilingual description record
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionRecord {
    pub english: String,
    pub hindi: String,
}

/// Problem record; the id may arrive as `id` or `_id`
///
/// Drill-down payloads may omit the id altogether. Such a problem is keyed
/// by its position so it still renders; only document details insist on it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "_id")]
    pub legacy_id: Option<String>,
    pub category: Vec<String>,
    pub description: DescriptionRecord,
}

impl ProblemRecord {
    fn resolved_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.legacy_id.as_deref().filter(|id| !id.is_empty()))
    }

    fn into_problem(self, position: usize) -> Problem {
        let id = self
            .resolved_id()
            .map_or_else(|| format!("#{position}"), str::to_string);
        Problem {
            id: ProblemId::new(id),
            category: tags(self.category),
            description: Description::new(self.description.english, self.description.hindi),
        }
    }
}

impl Validate for ProblemRecord {
    fn validate(&self) -> Result<(), FieldError> {
        Ok(())
    }
}

/// Document with its problems, as returned by the drill-down endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    pub issues: Vec<String>,
    pub problems: Vec<ProblemRecord>,
}

impl Validate for DocumentRecord {
    fn validate(&self) -> Result<(), FieldError> {
        non_empty(&self.id, "id")?;
        self.problems.validate().map_err(|e| e.within("problems"))
    }
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: DocumentId::new(record.id),
            name: record.name,
            phone_number: record.phone_number,
            country_code: record.country_code,
            ward: record.ward.map(Ward::new),
            problems: record
                .problems
                .into_iter()
                .enumerate()
                .map(|(position, problem)| problem.into_problem(position))
                .collect(),
        }
    }
}

/// `getDocumentDetails` payload; every problem must carry an id
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct DocumentDetailsRecord(pub DocumentRecord);

impl Validate for DocumentDetailsRecord {
    fn validate(&self) -> Result<(), FieldError> {
        self.0.validate()?;
        for (index, problem) in self.0.problems.iter().enumerate() {
            if problem.resolved_id().is_none() {
                return Err(FieldError::new("id", "problem id is required")
                    .at_index(index)
                    .within("problems"));
            }
        }
        Ok(())
    }
}

impl From<DocumentDetailsRecord> for Document {
    fn from(record: DocumentDetailsRecord) -> Self {
        Document::from(record.0)
    }
}

/// One (document, problem) pair of the `getWardIssueProblems` payload
///
/// The backend unwinds documents, so `problems` holds a single record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardIssueRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub problems: ProblemRecord,
}

impl Validate for WardIssueRecord {
    fn validate(&self) -> Result<(), FieldError> {
        non_empty(&self.id, "id")?;
        self.problems.validate().map_err(|e| e.within("problems"))
    }
}

impl WardIssueRecord {
    /// Document holding just this element's problem
    ///
    /// `position` is the element's index in the payload and keys a problem
    /// that arrived without an id.
    #[must_use]
    pub fn into_document(self, position: usize) -> Document {
        Document {
            id: DocumentId::new(self.id),
            name: self.name,
            phone_number: self.phone_number,
            country_code: None,
            ward: self.ward.map(Ward::new),
            problems: vec![self.problems.into_problem(position)],
        }
    }
}

/// `getRequestDetails` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetailsRecord {
    pub id: String,
    pub title: String,
    pub created_by: String,
    pub created_at: String,
    pub req_status: RequestStatus,
    pub documents: Vec<DocumentRecord>,
}

impl Validate for RequestDetailsRecord {
    fn validate(&self) -> Result<(), FieldError> {
        self.documents.validate().map_err(|e| e.within("documents"))
    }
}

/// Request with its documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    /// Request identifier
    pub id: RequestId,
    /// Title
    pub title: String,
    /// Creator
    pub created_by: String,
    /// Creation timestamp as sent by the backend
    pub created_at: String,
    /// Lifecycle status
    pub status: RequestStatus,
    /// Documents in backend order
    pub documents: Vec<Document>,
}

impl From<RequestDetailsRecord> for RequestDetails {
    fn from(record: RequestDetailsRecord) -> Self {
        Self {
            id: RequestId::new(record.id),
            title: record.title,
            created_by: record.created_by,
            created_at: record.created_at,
            status: record.req_status,
            documents: record.documents.into_iter().map(Document::from).collect(),
        }
    }
}

impl Validate for Request {
    fn validate(&self) -> Result<(), FieldError> {
        Ok(())
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), FieldError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn problem_id_accepts_legacy_field() {
        let record: ProblemRecord = serde_json::from_value(json!({
            "id": "",
            "_id": "abc",
            "category": ["leak"],
            "description": {"english": "e", "hindi": "h", "_id": "x"}
        }))
        .unwrap();
        assert!(record.validate().is_ok());
        assert_eq!(record.into_problem(0).id, ProblemId::new("abc"));
    }

    fn document_without_problem_ids() -> serde_json::Value {
        json!({
            "id": "d1",
            "name": "Jane Doe",
            "issues": ["leak"],
            "problems": [
                {"id": "p1", "category": ["leak"], "description": {"english": "e", "hindi": "h"}},
                {"category": ["leak"], "description": {"english": "e", "hindi": "h"}}
            ]
        })
    }

    #[test]
    fn drilldown_problem_without_id_gets_positional_key() {
        let record: DocumentRecord = serde_json::from_value(document_without_problem_ids()).unwrap();
        assert!(record.validate().is_ok());

        let ids: Vec<ProblemId> = Document::from(record).problems.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProblemId::new("p1"), ProblemId::new("#1")]);
    }

    #[test]
    fn document_details_require_problem_ids() {
        let record: DocumentDetailsRecord = serde_json::from_value(document_without_problem_ids()).unwrap();
        assert_eq!(record.validate().unwrap_err().path, "problems[1].id");
    }

    #[test]
    fn nullable_document_fields_are_accepted() {
        let record: DocumentRecord = serde_json::from_value(json!({
            "id": "d1",
            "name": "Jane Doe (alt)",
            "phoneNumber": null,
            "ward": null,
            "issues": [],
            "problems": [],
            "imageUrl": "ignored"
        }))
        .unwrap();
        let doc = Document::from(record);
        assert!(doc.ward.is_none());
        assert!(doc.phone_number.is_none());
    }

    #[test]
    fn ward_record_requires_category() {
        let payload: WardReportPayload = serde_json::from_value(json!({
            "reqId": "r1",
            "wards": [{"wardId": "w1", "ward": "3", "category": "", "problems": []}]
        }))
        .unwrap();
        assert_eq!(payload.validate().unwrap_err().path, "wards[0].category");
    }
}
