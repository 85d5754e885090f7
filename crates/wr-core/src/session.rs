//! Report session
//!
//! One session per report view of one request. The session owns:
//! - Top-level views, loaded on first use and kept until invalidated
//! - The ward/issue view state machine
//! - Four independent disclosure surfaces
//!
//! Backend failures are reported through the context's notifier and
//! returned; whatever was shown before stays shown.

use crate::context::{AppContext, FailureNotice, SessionId};
use crate::error::{SessionError, SessionResult};
use crate::events::RequestEvent;
use crate::queries::{GroupQuery, MemberSelection, TagQuery, WardGroupQuery, WardIssueKey, WardIssueQuery};
use crate::resolver::DrilldownResolver;
use crate::state::{ViewPhase, ViewState};
use crate::surface::{DisclosureSurface, OpenOutcome};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::instrument;
use wr_client::{CommonProblemsReport, WardReport};
use wr_grouping::AnalysisView;
use wr_model::{AnalysisEntry, GroupKey, IssueCount, IssueTag, RequestId, Ward, WardGroupKey};

/// Interactive report over one request
#[derive(Debug)]
pub struct ReportSession {
    id: SessionId,
    request_id: RequestId,
    ctx: AppContext,
    resolver: DrilldownResolver,
    generation: AtomicU64,
    common: RwLock<Option<Arc<CommonProblemsReport>>>,
    wards: RwLock<Option<Arc<WardReport>>>,
    analysis: RwLock<Option<AnalysisView>>,
    view: Mutex<ViewState>,
    tag: DisclosureSurface<TagQuery>,
    group: DisclosureSurface<GroupQuery>,
    ward_group: DisclosureSurface<WardGroupQuery>,
    ward_issue: DisclosureSurface<WardIssueQuery>,
}

impl ReportSession {
    /// Create session; nothing is fetched until first use
    #[must_use]
    pub fn new(ctx: AppContext, request_id: RequestId) -> Self {
        let config = ctx.config().clone();
        let resolver = DrilldownResolver::new(ctx.client().clone(), config.description_language);
        let id = SessionId::new();
        tracing::debug!(session = %id, request = %request_id, "session created");
        Self {
            id,
            request_id,
            resolver,
            generation: AtomicU64::new(0),
            common: RwLock::new(None),
            wards: RwLock::new(None),
            analysis: RwLock::new(None),
            view: Mutex::new(ViewState::default()),
            tag: DisclosureSurface::new(TagQuery, &config),
            group: DisclosureSurface::new(GroupQuery, &config),
            ward_group: DisclosureSurface::new(WardGroupQuery, &config),
            ward_issue: DisclosureSurface::new(WardIssueQuery, &config),
            ctx,
        }
    }

    /// Session identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Request this session reports on
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Shared context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    fn surfaced<T>(&self, operation: &'static str, result: SessionResult<T>) -> SessionResult<T> {
        if let Err(e) = &result {
            if e.is_user_visible() {
                self.ctx.notifier().notify(FailureNotice {
                    session: self.id,
                    operation,
                    message: e.to_string(),
                });
            }
        }
        result
    }

    // ---- top-level views ----

    /// Keep a loaded view unless the session was invalidated since `generation`
    fn keep<T: Clone>(&self, slot: &RwLock<Option<T>>, generation: u64, value: T) -> T {
        let mut slot = slot.write();
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!(session = %self.id, "invalidated during load, view not kept");
            return value;
        }
        slot.get_or_insert(value).clone()
    }

    /// Common-problems summary
    ///
    /// # Errors
    /// `SessionError::Report`; failures are not remembered
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn common_problems(&self) -> SessionResult<Arc<CommonProblemsReport>> {
        let loaded = self.common.read().clone();
        if let Some(report) = loaded {
            return Ok(report);
        }
        let generation = self.generation.load(Ordering::Acquire);
        let result = self.ctx.client().common_problems(&self.request_id).await;
        let report = Arc::new(self.surfaced("common_problems", result.map_err(SessionError::from))?);
        Ok(self.keep(&self.common, generation, report))
    }

    /// Ward-scoped summary
    ///
    /// # Errors
    /// `SessionError::Report`; failures are not remembered
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn ward_report(&self) -> SessionResult<Arc<WardReport>> {
        let loaded = self.wards.read().clone();
        if let Some(report) = loaded {
            return Ok(report);
        }
        let generation = self.generation.load(Ordering::Acquire);
        let result = self.ctx.client().ward_wise_report(&self.request_id).await;
        let report = Arc::new(self.surfaced("ward_report", result.map_err(SessionError::from))?);
        Ok(self.keep(&self.wards, generation, report))
    }

    /// Per-ward analytics in display order
    ///
    /// # Errors
    /// `SessionError::Report`; failures are not remembered
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn analysis(&self) -> SessionResult<AnalysisView> {
        let loaded = self.analysis.read().clone();
        if let Some(view) = loaded {
            return Ok(view);
        }
        let generation = self.generation.load(Ordering::Acquire);
        let result = self.ctx.client().analysis(&self.request_id).await;
        let view = AnalysisView::new(self.surfaced("analysis", result.map_err(SessionError::from))?);
        Ok(self.keep(&self.analysis, generation, view))
    }

    fn with_analysis<T>(&self, f: impl FnOnce(&mut AnalysisView) -> T) -> SessionResult<T> {
        self.analysis
            .write()
            .as_mut()
            .map(f)
            .ok_or(SessionError::NotLoaded("analysis"))
    }

    /// Select the numeric ward range of the analytics chart
    ///
    /// # Errors
    /// `NotLoaded` before [`analysis`](Self::analysis) succeeded
    pub fn set_ward_range(&self, lo: i64, hi: i64) -> SessionResult<Vec<AnalysisEntry>> {
        self.with_analysis(|view| {
            view.set_range(lo, hi);
            view.filtered()
        })
    }

    /// Entries under the selected range
    ///
    /// # Errors
    /// `NotLoaded` before [`analysis`](Self::analysis) succeeded
    pub fn filtered_analysis(&self) -> SessionResult<Vec<AnalysisEntry>> {
        self.with_analysis(|view| view.filtered())
    }

    // ---- ward / issue view ----

    /// Current view phase
    #[must_use]
    pub fn view_phase(&self) -> ViewPhase {
        self.view.lock().phase()
    }

    /// Current view state
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.view.lock().clone()
    }

    /// Select a ward and return its visible issue slices
    ///
    /// Uses the loaded analytics only.
    ///
    /// # Errors
    /// `NotLoaded` or `UnknownWard`
    pub fn select_ward(&self, ward: &Ward) -> SessionResult<Vec<IssueCount>> {
        let entry = self
            .with_analysis(|view| view.entry(ward).cloned())?
            .ok_or_else(|| SessionError::UnknownWard(ward.clone()))?;
        let mut view = self.view.lock();
        view.select_ward(&entry)?;
        Ok(view.selection().map(|s| s.visible()).unwrap_or_default())
    }

    /// Flip visibility of one slice of the selected ward
    ///
    /// # Errors
    /// `NoWardSelected` or `UnknownIssue`
    pub fn toggle_issue_visibility(&self, issue: &IssueTag) -> SessionResult<bool> {
        self.view.lock().toggle_issue(issue)
    }

    /// Visible slices of the selected ward
    ///
    /// # Errors
    /// `NoWardSelected`
    pub fn visible_slices(&self) -> SessionResult<Vec<IssueCount>> {
        self.view
            .lock()
            .selection()
            .map(|s| s.visible())
            .ok_or(SessionError::NoWardSelected)
    }

    /// Drill into one issue slice of the selected ward
    ///
    /// Repeating the same slice is served from the surface cache.
    ///
    /// # Errors
    /// `NoWardSelected`, `UnknownIssue` or `Report`
    #[instrument(skip_all, fields(session = %self.id, issue = %issue))]
    pub async fn select_issue_slice(&self, issue: &IssueTag) -> SessionResult<OpenOutcome> {
        let ward = self.view.lock().slice_target(issue)?;
        let key = WardIssueKey::new(ward.clone(), issue.clone());
        let result = self.ward_issue.open(&self.resolver, &self.request_id, key).await;
        let outcome = self.surfaced("select_issue_slice", result)?;
        if outcome.applied {
            self.view.lock().enter_drilldown(&ward, issue.clone())?;
        }
        Ok(outcome)
    }

    /// Back to `Collapsed`; visibility choices are forgotten
    pub fn deselect_ward(&self) {
        self.view.lock().deselect();
    }

    // ---- disclosure surfaces ----

    /// Open the tag surface for `issue`
    ///
    /// # Errors
    /// `SessionError::Report`
    #[instrument(skip_all, fields(session = %self.id, issue = %issue))]
    pub async fn open_tag(&self, issue: &IssueTag) -> SessionResult<OpenOutcome> {
        let result = self.tag.open(&self.resolver, &self.request_id, issue.clone()).await;
        self.surfaced("open_tag", result)
    }

    /// Open the group surface for a common-problem group
    ///
    /// # Errors
    /// `UnknownGroup` or `Report`
    #[instrument(skip_all, fields(session = %self.id, group = %key))]
    pub async fn open_group(&self, key: &GroupKey) -> SessionResult<OpenOutcome> {
        let report = self.common_problems().await?;
        let group = report
            .group(key)
            .ok_or_else(|| SessionError::UnknownGroup(key.to_string()))?;
        let result = self
            .group
            .open(&self.resolver, &self.request_id, MemberSelection::from(group))
            .await;
        self.surfaced("open_group", result)
    }

    /// Open the ward-group surface
    ///
    /// # Errors
    /// `UnknownGroup` or `Report`
    #[instrument(skip_all, fields(session = %self.id, ward_id = %key.ward_id))]
    pub async fn open_ward_group(&self, key: &WardGroupKey) -> SessionResult<OpenOutcome> {
        let report = self.ward_report().await?;
        let group = report
            .group(key)
            .ok_or_else(|| SessionError::UnknownGroup(format!("{}/{}", key.ward_id, key.summary)))?;
        let result = self
            .ward_group
            .open(&self.resolver, &self.request_id, MemberSelection::from(group))
            .await;
        self.surfaced("open_ward_group", result)
    }

    /// Tag surface
    #[inline]
    #[must_use]
    pub fn tag_surface(&self) -> &DisclosureSurface<TagQuery> {
        &self.tag
    }

    /// Common-problem group surface
    #[inline]
    #[must_use]
    pub fn group_surface(&self) -> &DisclosureSurface<GroupQuery> {
        &self.group
    }

    /// Ward group surface
    #[inline]
    #[must_use]
    pub fn ward_group_surface(&self) -> &DisclosureSurface<WardGroupQuery> {
        &self.ward_group
    }

    /// Ward issue-slice surface
    #[inline]
    #[must_use]
    pub fn ward_issue_surface(&self) -> &DisclosureSurface<WardIssueQuery> {
        &self.ward_issue
    }

    // ---- invalidation ----

    /// Forget loaded views and cached drill-downs
    ///
    /// Open surfaces keep their rows until queried again. Loads in flight
    /// still return their result but do not keep it.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.common.write() = None;
        *self.wards.write() = None;
        *self.analysis.write() = None;
        self.tag.invalidate_cache();
        self.group.invalidate_cache();
        self.ward_group.invalidate_cache();
        self.ward_issue.invalidate_cache();
    }

    /// React to a request event; returns whether it concerned this session
    pub fn handle_event(&self, event: &RequestEvent) -> bool {
        if event.request_id() != &self.request_id {
            return false;
        }
        tracing::info!(session = %self.id, ?event, "request changed, invalidating views");
        self.invalidate();
        true
    }

    /// Follow request events until the stream closes
    pub async fn follow_events(&self, mut events: broadcast::Receiver<RequestEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(session = %self.id, missed, "request events lagged, invalidating views");
                    self.invalidate();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::context::ChannelNotifier;
    use crate::surface::SurfaceStatus;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wr_client::{Endpoint, TransportError};
    use wr_model::{WardId, WARD_NOT_PROVIDED};
    use wr_test_utils::{sample_client, FixtureTransport};

    fn session() -> (ReportSession, Arc<FixtureTransport>) {
        let (client, transport) = sample_client();
        let ctx = AppContext::new(ReportConfig::default(), client);
        (ReportSession::new(ctx, RequestId::new("r1")), transport)
    }

    fn issues(slices: &[IssueCount]) -> Vec<(&str, u64)> {
        slices.iter().map(|s| (s.issue.as_str(), s.problem_count)).collect()
    }

    #[tokio::test]
    async fn views_are_fetched_once() {
        let (session, transport) = session();
        session.common_problems().await.unwrap();
        session.common_problems().await.unwrap();
        session.analysis().await.unwrap();
        session.analysis().await.unwrap();

        assert_eq!(transport.calls(Endpoint::CommonProblems), 1);
        assert_eq!(transport.calls(Endpoint::Analysis), 1);
    }

    #[tokio::test]
    async fn failed_view_load_is_retried_on_next_use() {
        let (session, transport) = session();
        transport.fail_next(Endpoint::WardWiseReport, TransportError::Connection("x".into()));

        assert!(session.ward_report().await.is_err());
        assert!(session.ward_report().await.is_ok());
        assert_eq!(transport.calls(Endpoint::WardWiseReport), 2);
    }

    #[tokio::test]
    async fn analysis_is_sorted_and_range_filtered() {
        let (session, _) = session();
        let view = session.analysis().await.unwrap();
        let wards: Vec<&str> = view.entries().iter().map(|e| e.ward.as_str()).collect();
        assert_eq!(wards, vec!["2", "5", "10", WARD_NOT_PROVIDED]);

        let shown = session.set_ward_range(3, 6).unwrap();
        let wards: Vec<&str> = shown.iter().map(|e| e.ward.as_str()).collect();
        assert_eq!(wards, vec!["5", WARD_NOT_PROVIDED]);
    }

    #[tokio::test]
    async fn ward_selection_needs_loaded_analysis() {
        let (session, transport) = session();
        assert_eq!(
            session.select_ward(&Ward::new("5")),
            Err(SessionError::NotLoaded("analysis"))
        );

        session.analysis().await.unwrap();
        let slices = session.select_ward(&Ward::new("5")).unwrap();
        assert_eq!(issues(&slices), vec![("leak", 2), ("noise", 2)]);
        assert_eq!(session.view_phase(), ViewPhase::WardSelected);
        assert_eq!(transport.calls(Endpoint::Analysis), 1);

        assert_eq!(
            session.select_ward(&Ward::new("99")),
            Err(SessionError::UnknownWard(Ward::new("99")))
        );
    }

    #[tokio::test]
    async fn repeated_issue_slice_hits_backend_once() {
        let (session, transport) = session();
        session.analysis().await.unwrap();
        session.select_ward(&Ward::new("5")).unwrap();

        let first = session.select_issue_slice(&IssueTag::new("leak")).await.unwrap();
        let second = session.select_issue_slice(&IssueTag::new("leak")).await.unwrap();

        assert_eq!(first.total_rows, 2);
        assert!(second.cached);
        assert_eq!(transport.calls(Endpoint::WardIssueProblems), 1);
        assert_eq!(session.view_phase(), ViewPhase::IssueDrilldown);
    }

    #[tokio::test]
    async fn issue_slice_without_ward_is_rejected() {
        let (session, transport) = session();
        let err = session.select_issue_slice(&IssueTag::new("leak")).await.unwrap_err();
        assert_eq!(err, SessionError::NoWardSelected);
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn group_drilldown_matches_summary_count() {
        let (session, _) = session();
        let report = session.common_problems().await.unwrap();

        for group in &report.groups {
            let outcome = session.open_group(&group.key).await.unwrap();
            assert_eq!(outcome.total_rows, group.count(), "group {}", group.key);
        }
        assert!(matches!(
            session.open_group(&GroupKey::new("nope")).await,
            Err(SessionError::UnknownGroup(_))
        ));
    }

    #[tokio::test]
    async fn ward_group_drilldown_matches_summary_count() {
        let (session, _) = session();
        let key = WardGroupKey {
            ward_id: WardId::new("w-5"),
            summary: "Pipes".to_string(),
        };
        let outcome = session.open_ward_group(&key).await.unwrap();
        assert_eq!(outcome.total_rows, 2);

        let rows = session.ward_group_surface().rows().unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.problem_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn failure_is_notified_and_state_kept() {
        let (client, transport) = sample_client();
        let (notifier, mut notices) = ChannelNotifier::new(8);
        let ctx = AppContext::new(ReportConfig::default(), client).with_notifier(Arc::new(notifier));
        let session = ReportSession::new(ctx, RequestId::new("r1"));

        session.open_tag(&IssueTag::new("leak")).await.unwrap();
        transport.fail_next(Endpoint::TaggedDocs, TransportError::Status { code: 503, path: "/x".into() });
        assert!(session.open_tag(&IssueTag::new("road")).await.is_err());

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.operation, "open_tag");
        assert_eq!(notice.session, session.id());
        assert_eq!(session.tag_surface().key(), Some(IssueTag::new("leak")));
        assert_eq!(session.tag_surface().status(), SurfaceStatus::Open);
    }

    #[tokio::test]
    async fn request_event_invalidates_views_and_caches() {
        let (session, transport) = session();
        session.analysis().await.unwrap();
        session.open_tag(&IssueTag::new("leak")).await.unwrap();

        let other = RequestEvent::Completed {
            request_id: RequestId::new("r2"),
        };
        assert!(!session.handle_event(&other));

        let own = RequestEvent::DocsDelta {
            request_id: RequestId::new("r1"),
            docs_delta: 3,
        };
        assert!(session.handle_event(&own));
        assert_eq!(session.filtered_analysis(), Err(SessionError::NotLoaded("analysis")));
        assert!(session.tag_surface().is_open());

        session.open_tag(&IssueTag::new("leak")).await.unwrap();
        assert_eq!(transport.calls(Endpoint::TaggedDocs), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn event_during_view_load_forces_reload() {
        let (session, transport) = session();
        transport.delay_next(Endpoint::CommonProblems, Duration::from_millis(50));

        let (loaded, ()) = tokio::join!(session.common_problems(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.handle_event(&RequestEvent::Completed {
                request_id: RequestId::new("r1"),
            });
        });
        assert!(loaded.is_ok());

        session.common_problems().await.unwrap();
        assert_eq!(transport.calls(Endpoint::CommonProblems), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn event_during_drilldown_forces_refetch() {
        let (session, transport) = session();
        transport.delay_next(Endpoint::TaggedDocs, Duration::from_millis(50));

        let leak = IssueTag::new("leak");
        let (first, ()) = tokio::join!(session.open_tag(&leak), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.handle_event(&RequestEvent::DocsDelta {
                request_id: RequestId::new("r1"),
                docs_delta: 1,
            });
        });
        assert!(first.unwrap().applied);

        let again = session.open_tag(&IssueTag::new("leak")).await.unwrap();
        assert!(!again.cached);
        assert_eq!(transport.calls(Endpoint::TaggedDocs), 2);
    }

    #[tokio::test]
    async fn follows_event_stream_until_closed() {
        let (client, transport) = sample_client();
        let ctx = AppContext::new(ReportConfig::default(), client);
        let session = ReportSession::new(ctx, RequestId::new("r1"));
        session.common_problems().await.unwrap();

        let (tx, rx) = broadcast::channel(4);
        tx.send(RequestEvent::Completed {
            request_id: RequestId::new("r1"),
        })
        .unwrap();
        drop(tx);
        session.follow_events(rx).await;

        session.common_problems().await.unwrap();
        assert_eq!(transport.calls(Endpoint::CommonProblems), 2);
    }
}
