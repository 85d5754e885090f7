//! Drill-down resolution
//!
//! Turns a group, an issue, or a (ward, issue) pair back into flat rows, one
//! per (document, problem). The backend may return more than was asked for;
//! rows are filtered to exactly the requested population here.

use indexmap::IndexSet;
use std::collections::HashMap;
use tracing::instrument;
use wr_client::{ReportClient, ReportResult};
use wr_model::{Document, DocumentId, FlatProblemRow, IssueTag, Language, ProblemRef, RequestId, Ward};

/// Resolves drill-down queries through the backend
#[derive(Debug, Clone)]
pub struct DrilldownResolver {
    client: ReportClient,
    language: Language,
}

impl DrilldownResolver {
    /// Create resolver producing descriptions in `language`
    #[must_use]
    pub fn new(client: ReportClient, language: Language) -> Self {
        Self { client, language }
    }

    /// Description language of produced rows
    #[inline]
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Rows for an explicit member set, in member order
    ///
    /// Members whose problem no longer exists are dropped, so the result can
    /// be shorter than `members`. An empty set resolves without a call.
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id, members = members.len()))]
    pub async fn resolve_group(
        &self,
        request_id: &RequestId,
        members: &IndexSet<ProblemRef>,
    ) -> ReportResult<Vec<FlatProblemRow>> {
        if members.is_empty() {
            return Ok(Vec::new());
        }
        let refs: Vec<ProblemRef> = members.iter().cloned().collect();
        let documents = self.client.grouped_issues(request_id, &refs).await?;

        // one document may be split across several elements
        let mut by_id: HashMap<&DocumentId, Vec<&Document>> = HashMap::with_capacity(documents.len());
        for document in &documents {
            by_id.entry(&document.id).or_default().push(document);
        }

        let rows: Vec<FlatProblemRow> = members
            .iter()
            .filter_map(|member| {
                by_id.get(&member.doc_id)?.iter().find_map(|document| {
                    let problem = document.problem(&member.problem_id)?;
                    Some(FlatProblemRow::from_parts(document, problem, self.language))
                })
            })
            .collect();

        if rows.len() < members.len() {
            tracing::warn!(
                requested = members.len(),
                resolved = rows.len(),
                "dropping members whose problems no longer exist"
            );
        }
        Ok(rows)
    }

    /// Rows for every problem carrying `issue`
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id, issue = %issue))]
    pub async fn resolve_by_issue(&self, request_id: &RequestId, issue: &IssueTag) -> ReportResult<Vec<FlatProblemRow>> {
        let documents = self.client.tagged_docs(request_id, issue).await?;
        Ok(self.flatten(&documents, |_, problem| problem.has_issue(issue)))
    }

    /// Rows for problems carrying `issue` on documents in `ward`
    ///
    /// Documents without a ward belong to the "ward not provided" sentinel.
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `Network`
    #[instrument(skip_all, fields(request = %request_id, ward = %ward, issue = %issue))]
    pub async fn resolve_by_ward_issue(
        &self,
        request_id: &RequestId,
        ward: &Ward,
        issue: &IssueTag,
    ) -> ReportResult<Vec<FlatProblemRow>> {
        let documents = self.client.ward_issue_problems(request_id, ward, issue).await?;
        Ok(self.flatten(&documents, |document, problem| {
            let in_ward = document
                .ward
                .as_ref()
                .map_or(ward.is_not_provided(), |w| w == ward);
            in_ward && problem.has_issue(issue)
        }))
    }

    /// Fan out documents into rows, keeping matching problems once each
    fn flatten(
        &self,
        documents: &[Document],
        keep: impl Fn(&Document, &wr_model::Problem) -> bool,
    ) -> Vec<FlatProblemRow> {
        let mut seen: IndexSet<ProblemRef> = IndexSet::new();
        let mut rows = Vec::new();
        for document in documents {
            for problem in &document.problems {
                if !keep(document, problem) {
                    continue;
                }
                if seen.insert(ProblemRef::new(document.id.clone(), problem.id.clone())) {
                    rows.push(FlatProblemRow::from_parts(document, problem, self.language));
                }
            }
        }
        rows
    }
}
