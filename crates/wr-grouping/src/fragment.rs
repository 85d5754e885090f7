//! Grouping input
//!
//! The summary signature is computed upstream. What reaches the engine is a
//! stream of fragments, each naming the group it belongs to plus some
//! members and labels. A single problem is a fragment with one member; an
//! upstream group record is a fragment with all of its members.

use wr_model::{GroupKey, IssueTag, ProblemRef, Ward, WardId};

/// Part of a common-problem group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFragment {
    /// Upstream group identifier
    pub key: GroupKey,
    /// Summary signature text
    pub summary: String,
    /// Labels contributed
    pub issues: Vec<IssueTag>,
    /// Members contributed
    pub members: Vec<ProblemRef>,
}

impl GroupFragment {
    /// Fragment for one problem
    #[must_use]
    pub fn single(
        key: impl Into<GroupKey>,
        summary: impl Into<String>,
        member: ProblemRef,
        issues: Vec<IssueTag>,
    ) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            issues,
            members: vec![member],
        }
    }
}

/// Part of a ward group; the group is identified by its summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardFragment {
    /// Summary signature text
    pub summary: String,
    /// Labels contributed
    pub issues: Vec<IssueTag>,
    /// Members contributed
    pub members: Vec<ProblemRef>,
}

/// One ward with the problem fragments filed in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardProblems {
    /// Ward section identifier
    pub ward_id: WardId,
    /// Ward
    pub ward: Ward,
    /// Top-level category supplied upstream
    pub category: String,
    /// Fragments in upstream order
    pub fragments: Vec<WardFragment>,
}
