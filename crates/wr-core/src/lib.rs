//! Ward Report core
//!
//! The interactive side of a ward problem report:
//! - Resolves a clicked group, issue tag or ward slice back into flat rows
//! - Holds four independent disclosure surfaces with local pagination
//! - Drives the ward/issue selection state machine
//! - Invalidates loaded views when the request changes
//!
//! # Example
//!
//! ```rust,ignore
//! use wr_core::{AppContext, ReportConfig, ReportSession};
//! use wr_model::{IssueTag, RequestId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = AppContext::connect(ReportConfig::new().with_env_overrides()?)?;
//! let session = ReportSession::new(ctx, RequestId::new("r1"));
//!
//! session.open_tag(&IssueTag::new("leak")).await?;
//! let page = session.tag_surface().page()?;
//! println!("{} of {} rows", page.rows.len(), page.total_rows);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod queries;
pub mod resolver;
pub mod session;
pub mod state;
pub mod surface;

pub use cache::{CacheStats, RowCache, Rows};
pub use config::{FencingPolicy, ReportConfig};
pub use context::{AppContext, ChannelNotifier, FailureNotice, Notifier, SessionId, TracingNotifier};
pub use error::{ConfigError, SessionError, SessionResult};
pub use events::{RequestBoard, RequestEvent};
pub use queries::{GroupQuery, MemberSelection, TagQuery, WardGroupQuery, WardIssueKey, WardIssueQuery};
pub use resolver::DrilldownResolver;
pub use session::ReportSession;
pub use state::{allowed_transitions, validate_transition, ViewPhase, ViewState, WardSelection};
pub use surface::{
    DisclosureSurface, DrilldownQuery, OpenOutcome, Page, PageCursor, SurfaceKind, SurfaceStatus,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
