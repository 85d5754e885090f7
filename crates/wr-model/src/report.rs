//! Derived report views
//!
//! Groups and analysis entries are pure views over a request's problems.
//! The count shown next to a group summary is always `members.len()`, and
//! drill-down on the same group must return exactly that many rows.

use crate::document::IssueTag;
use crate::ids::{GroupKey, WardId};
use crate::row::ProblemRef;
use crate::ward::{Ward, WardKeyed};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Problems sharing one upstream summary signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemGroup {
    /// Upstream group identifier
    pub key: GroupKey,
    /// Summary text shown as the group heading
    pub summary: String,
    /// Union of member labels, first-seen order
    pub issues: IndexSet<IssueTag>,
    /// Member references, first-seen order, no duplicates
    pub members: IndexSet<ProblemRef>,
}

impl ProblemGroup {
    /// Create an empty group
    #[must_use]
    pub fn new(key: GroupKey, summary: impl Into<String>) -> Self {
        Self {
            key,
            summary: summary.into(),
            issues: IndexSet::new(),
            members: IndexSet::new(),
        }
    }

    /// Count displayed next to the summary
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Member references as a list
    #[must_use]
    pub fn member_refs(&self) -> Vec<ProblemRef> {
        self.members.iter().cloned().collect()
    }
}

/// Identity of a ward group: the ward section plus the intra-ward summary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardGroupKey {
    /// Ward section identifier
    pub ward_id: WardId,
    /// Summary signature within that ward
    pub summary: String,
}

/// Problems of one ward sharing one summary signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardGroup {
    /// Ward section identifier
    pub ward_id: WardId,
    /// Ward
    pub ward: Ward,
    /// Top-level category assigned upstream to the ward
    pub category: String,
    /// Summary text
    pub summary: String,
    /// Union of member labels, first-seen order
    pub issues: IndexSet<IssueTag>,
    /// Member references, first-seen order, no duplicates
    pub members: IndexSet<ProblemRef>,
}

impl WardGroup {
    /// Create an empty ward group
    #[must_use]
    pub fn new(
        ward_id: WardId,
        ward: Ward,
        category: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            ward_id,
            ward,
            category: category.into(),
            summary: summary.into(),
            issues: IndexSet::new(),
            members: IndexSet::new(),
        }
    }

    /// Group identity
    #[must_use]
    pub fn key(&self) -> WardGroupKey {
        WardGroupKey {
            ward_id: self.ward_id.clone(),
            summary: self.summary.clone(),
        }
    }

    /// Count displayed next to the summary
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Member references as a list
    #[must_use]
    pub fn member_refs(&self) -> Vec<ProblemRef> {
        self.members.iter().cloned().collect()
    }
}

impl WardKeyed for WardGroup {
    fn ward(&self) -> &Ward {
        &self.ward
    }
}

/// Number of problems in a ward carrying one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCount {
    /// Label
    pub issue: IssueTag,
    /// Problems carrying it
    pub problem_count: u64,
}

/// Per-ward issue analytics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEntry {
    /// Ward
    pub ward: Ward,
    /// Problems filed in this ward
    pub total_problems: u64,
    /// Per-label counts, first-seen order
    pub category: Vec<IssueCount>,
}

impl AnalysisEntry {
    /// Count for one label, zero when absent
    #[must_use]
    pub fn issue_count(&self, issue: &IssueTag) -> u64 {
        self.category
            .iter()
            .find(|c| &c.issue == issue)
            .map_or(0, |c| c.problem_count)
    }

    /// Labels in display order
    #[must_use]
    pub fn issues(&self) -> Vec<IssueTag> {
        self.category.iter().map(|c| c.issue.clone()).collect()
    }
}

impl WardKeyed for AnalysisEntry {
    fn ward(&self) -> &Ward {
        &self.ward
    }
}
