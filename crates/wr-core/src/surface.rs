//! Disclosure surfaces
//!
//! A surface is one drill-down panel: it runs a query, holds the resulting
//! rows and paginates them locally. Each surface kind is a
//! [`DisclosureSurface`] parameterized by its [`DrilldownQuery`], so:
//!
//! - Every surface has its own state, cache and pagination cursor
//! - A result always lands on the surface whose query produced it
//! - Paginating never touches the backend
//! - Every resolved query resets the cursor to page 1 at the default size
//!
//! When two queries on the same surface race, the [`FencingPolicy`] decides
//! which result is shown. A failed query leaves the surface as it was.

use crate::cache::{RowCache, Rows};
use crate::config::{FencingPolicy, ReportConfig};
use crate::error::{SessionError, SessionResult};
use crate::resolver::DrilldownResolver;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use wr_client::ReportResult;
use wr_model::{FlatProblemRow, RequestId};

/// The four drill-down surfaces of a report view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Documents carrying a clicked issue tag
    Tag,
    /// Members of a common-problem group
    Group,
    /// Members of a ward group
    WardGroup,
    /// Problems of one issue slice of the selected ward
    WardIssue,
}

impl SurfaceKind {
    /// Stable name, used in logs and errors
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Group => "group",
            Self::WardGroup => "ward-group",
            Self::WardIssue => "ward-issue",
        }
    }
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Query behind one surface kind
#[async_trait]
pub trait DrilldownQuery: Send + Sync + 'static {
    /// Identity of a result set; also the cache key
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Surface this query drives
    const KIND: SurfaceKind;

    /// Resolve the rows for `key`
    async fn resolve(
        &self,
        resolver: &DrilldownResolver,
        request_id: &RequestId,
        key: &Self::Key,
    ) -> ReportResult<Vec<FlatProblemRow>>;
}

/// 1-based page position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Page number, from 1
    pub page: usize,
    /// Rows per page
    pub page_size: usize,
}

impl PageCursor {
    /// First page at `page_size`
    #[inline]
    #[must_use]
    pub fn first(page_size: usize) -> Self {
        Self { page: 1, page_size }
    }

    /// Cursor at an explicit position
    ///
    /// # Errors
    /// `SessionError::InvalidPage` if either value is zero
    pub fn at(page: usize, page_size: usize) -> SessionResult<Self> {
        if page == 0 || page_size == 0 {
            return Err(SessionError::InvalidPage { page, page_size });
        }
        Ok(Self { page, page_size })
    }
}

/// One page of rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows on this page
    pub rows: Vec<T>,
    /// Page number, from 1
    pub page: usize,
    /// Rows per page
    pub page_size: usize,
    /// Rows across all pages
    pub total_rows: usize,
    /// Number of pages; zero when there are no rows
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// Cut the page at `cursor` out of `rows`; empty past the end
    #[must_use]
    pub fn slice(rows: &[T], cursor: PageCursor) -> Self {
        let page_size = cursor.page_size.max(1);
        let start = cursor.page.saturating_sub(1).saturating_mul(page_size);
        let end = start.saturating_add(page_size).min(rows.len());
        Self {
            rows: rows.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
            page: cursor.page,
            page_size,
            total_rows: rows.len(),
            total_pages: rows.len().div_ceil(page_size),
        }
    }
}

/// Externally visible surface state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    /// Nothing shown
    Closed,
    /// A query is in flight
    Loading,
    /// Rows shown
    Open,
}

/// What an [`open`](DisclosureSurface::open) call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOutcome {
    /// Rows resolved for the key
    pub total_rows: usize,
    /// Served from the surface cache
    pub cached: bool,
    /// Shown on the surface; false when fenced off or closed meanwhile
    pub applied: bool,
}

#[derive(Debug)]
enum Phase<K> {
    Closed,
    Open {
        key: K,
        rows: Rows,
        cursor: PageCursor,
    },
}

#[derive(Debug)]
struct SurfaceInner<K> {
    phase: Phase<K>,
    in_flight: usize,
    issued: u64,
    last_applied: u64,
    closed_at: u64,
    generation: u64,
}

/// One drill-down panel
#[derive(Debug)]
pub struct DisclosureSurface<Q: DrilldownQuery> {
    query: Q,
    cache: RowCache<Q::Key>,
    fencing: FencingPolicy,
    default_page_size: usize,
    inner: Mutex<SurfaceInner<Q::Key>>,
}

impl<Q: DrilldownQuery> DisclosureSurface<Q> {
    /// Create a closed surface
    #[must_use]
    pub fn new(query: Q, config: &ReportConfig) -> Self {
        let cache = match config.cache_ttl() {
            Some(ttl) => RowCache::with_ttl(config.cache_capacity, ttl),
            None => RowCache::new(config.cache_capacity),
        };
        Self {
            query,
            cache,
            fencing: config.fencing,
            default_page_size: config.default_page_size.max(1),
            inner: Mutex::new(SurfaceInner {
                phase: Phase::Closed,
                in_flight: 0,
                issued: 0,
                last_applied: 0,
                closed_at: 0,
                generation: 0,
            }),
        }
    }

    /// Surface kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> SurfaceKind {
        Q::KIND
    }

    /// Run the query for `key` and show its rows
    ///
    /// A cached result for `key` is reused without a backend call. A result
    /// resolved across a cache invalidation is shown but not kept.
    ///
    /// # Errors
    /// `SessionError::Report` if resolution fails; the surface is unchanged
    pub async fn open(
        &self,
        resolver: &DrilldownResolver,
        request_id: &RequestId,
        key: Q::Key,
    ) -> SessionResult<OpenOutcome> {
        let (ticket, generation) = self.begin();

        let result = match self.cache.get(&key).await {
            Some(rows) => {
                tracing::debug!(surface = %Q::KIND, ?key, "surface cache hit");
                Ok((rows, true))
            }
            None => self
                .cache
                .try_get_or_resolve(key.clone(), self.query.resolve(resolver, request_id, &key))
                .await
                .map(|rows| (rows, false)),
        };

        if matches!(result, Ok((_, false))) && self.inner.lock().generation != generation {
            tracing::debug!(surface = %Q::KIND, ?key, "cache invalidated while resolving, evicting");
            self.cache.invalidate(&key).await;
        }

        self.settle(ticket, key, result)
    }

    /// Re-run the current query, bypassing the cache
    ///
    /// # Errors
    /// `SurfaceClosed` or `Report`
    pub async fn refresh(&self, resolver: &DrilldownResolver, request_id: &RequestId) -> SessionResult<OpenOutcome> {
        let key = self.key().ok_or(SessionError::SurfaceClosed(Q::KIND))?;
        self.cache.invalidate(&key).await;
        self.open(resolver, request_id, key).await
    }

    fn begin(&self) -> (u64, u64) {
        let mut inner = self.inner.lock();
        inner.issued += 1;
        inner.in_flight += 1;
        (inner.issued, inner.generation)
    }

    fn settle(
        &self,
        ticket: u64,
        key: Q::Key,
        result: ReportResult<(Rows, bool)>,
    ) -> SessionResult<OpenOutcome> {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);

        let (rows, cached) = result?;
        let total_rows = rows.len();

        let superseded = self.fencing == FencingPolicy::LatestIssued && ticket < inner.last_applied;
        if ticket <= inner.closed_at || superseded {
            tracing::debug!(surface = %Q::KIND, ticket, ?key, "discarding settled query");
            return Ok(OpenOutcome {
                total_rows,
                cached,
                applied: false,
            });
        }

        tracing::info!(surface = %Q::KIND, ?key, rows = total_rows, cached, "surface opened");
        inner.last_applied = ticket;
        inner.phase = Phase::Open {
            key,
            rows,
            cursor: PageCursor::first(self.default_page_size),
        };
        Ok(OpenOutcome {
            total_rows,
            cached,
            applied: true,
        })
    }

    /// Hide the surface
    ///
    /// Queries still in flight will not reopen it.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.phase = Phase::Closed;
        inner.closed_at = inner.issued;
    }

    /// Move to another page; local only
    ///
    /// # Errors
    /// `InvalidPage` or `SurfaceClosed`
    pub fn paginate(&self, page: usize, page_size: usize) -> SessionResult<Page<FlatProblemRow>> {
        let next = PageCursor::at(page, page_size)?;
        let mut inner = self.inner.lock();
        match &mut inner.phase {
            Phase::Open { rows, cursor, .. } => {
                *cursor = next;
                Ok(Page::slice(rows.as_slice(), next))
            }
            Phase::Closed => Err(SessionError::SurfaceClosed(Q::KIND)),
        }
    }

    /// Rows on the current page
    ///
    /// # Errors
    /// `SurfaceClosed`
    pub fn page(&self) -> SessionResult<Page<FlatProblemRow>> {
        match &self.inner.lock().phase {
            Phase::Open { rows, cursor, .. } => Ok(Page::slice(rows.as_slice(), *cursor)),
            Phase::Closed => Err(SessionError::SurfaceClosed(Q::KIND)),
        }
    }

    /// Current state
    #[must_use]
    pub fn status(&self) -> SurfaceStatus {
        let inner = self.inner.lock();
        if inner.in_flight > 0 {
            SurfaceStatus::Loading
        } else if matches!(inner.phase, Phase::Open { .. }) {
            SurfaceStatus::Open
        } else {
            SurfaceStatus::Closed
        }
    }

    /// Whether rows are shown
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.inner.lock().phase, Phase::Open { .. })
    }

    /// Key of the rows shown
    #[must_use]
    pub fn key(&self) -> Option<Q::Key> {
        match &self.inner.lock().phase {
            Phase::Open { key, .. } => Some(key.clone()),
            Phase::Closed => None,
        }
    }

    /// All rows shown
    #[must_use]
    pub fn rows(&self) -> Option<Rows> {
        match &self.inner.lock().phase {
            Phase::Open { rows, .. } => Some(rows.clone()),
            Phase::Closed => None,
        }
    }

    /// Current page position
    #[must_use]
    pub fn cursor(&self) -> Option<PageCursor> {
        match &self.inner.lock().phase {
            Phase::Open { cursor, .. } => Some(*cursor),
            Phase::Closed => None,
        }
    }

    /// Whether a result for `key` is cached
    pub async fn is_cached(&self, key: &Q::Key) -> bool {
        self.cache.contains(key).await
    }

    /// Forget every cached result; shown rows stay
    ///
    /// Queries in flight still settle, but their rows are not cached.
    pub fn invalidate_cache(&self) {
        self.inner.lock().generation += 1;
        self.cache.invalidate_all();
    }
}
