//! The four drill-down queries

use crate::resolver::DrilldownResolver;
use crate::surface::{DrilldownQuery, SurfaceKind};
use async_trait::async_trait;
use indexmap::IndexSet;
use wr_client::ReportResult;
use wr_model::{
    FlatProblemRow, GroupKey, IssueTag, ProblemGroup, ProblemRef, RequestId, Ward, WardGroup,
    WardGroupKey,
};

/// A group together with the members shown in its summary
///
/// Members are part of the key, so a group re-derived with different
/// membership is a different result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSelection<G> {
    /// Group identity
    pub group: G,
    /// Members in summary order
    pub members: Vec<ProblemRef>,
}

impl<G> MemberSelection<G> {
    fn member_set(&self) -> IndexSet<ProblemRef> {
        self.members.iter().cloned().collect()
    }
}

impl From<&ProblemGroup> for MemberSelection<GroupKey> {
    fn from(group: &ProblemGroup) -> Self {
        Self {
            group: group.key.clone(),
            members: group.member_refs(),
        }
    }
}

impl From<&WardGroup> for MemberSelection<WardGroupKey> {
    fn from(group: &WardGroup) -> Self {
        Self {
            group: group.key(),
            members: group.member_refs(),
        }
    }
}

/// One issue slice of one ward
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WardIssueKey {
    /// Ward
    pub ward: Ward,
    /// Issue
    pub issue: IssueTag,
}

impl WardIssueKey {
    /// Create key
    #[must_use]
    pub fn new(ward: Ward, issue: IssueTag) -> Self {
        Self { ward, issue }
    }
}

/// Clicked issue tag
#[derive(Debug, Clone, Copy, Default)]
pub struct TagQuery;

#[async_trait]
impl DrilldownQuery for TagQuery {
    type Key = IssueTag;
    const KIND: SurfaceKind = SurfaceKind::Tag;

    async fn resolve(
        &self,
        resolver: &DrilldownResolver,
        request_id: &RequestId,
        key: &IssueTag,
    ) -> ReportResult<Vec<FlatProblemRow>> {
        resolver.resolve_by_issue(request_id, key).await
    }
}

/// Clicked common-problem group
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupQuery;

#[async_trait]
impl DrilldownQuery for GroupQuery {
    type Key = MemberSelection<GroupKey>;
    const KIND: SurfaceKind = SurfaceKind::Group;

    async fn resolve(
        &self,
        resolver: &DrilldownResolver,
        request_id: &RequestId,
        key: &Self::Key,
    ) -> ReportResult<Vec<FlatProblemRow>> {
        resolver.resolve_group(request_id, &key.member_set()).await
    }
}

/// Clicked ward group
#[derive(Debug, Clone, Copy, Default)]
pub struct WardGroupQuery;

#[async_trait]
impl DrilldownQuery for WardGroupQuery {
    type Key = MemberSelection<WardGroupKey>;
    const KIND: SurfaceKind = SurfaceKind::WardGroup;

    async fn resolve(
        &self,
        resolver: &DrilldownResolver,
        request_id: &RequestId,
        key: &Self::Key,
    ) -> ReportResult<Vec<FlatProblemRow>> {
        resolver.resolve_group(request_id, &key.member_set()).await
    }
}

/// Clicked issue slice of the selected ward
#[derive(Debug, Clone, Copy, Default)]
pub struct WardIssueQuery;

#[async_trait]
impl DrilldownQuery for WardIssueQuery {
    type Key = WardIssueKey;
    const KIND: SurfaceKind = SurfaceKind::WardIssue;

    async fn resolve(
        &self,
        resolver: &DrilldownResolver,
        request_id: &RequestId,
        key: &WardIssueKey,
    ) -> ReportResult<Vec<FlatProblemRow>> {
        resolver
            .resolve_by_ward_issue(request_id, &key.ward, &key.issue)
            .await
    }
}
