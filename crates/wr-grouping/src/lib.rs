//! Ward Report grouping engine
//!
//! Pure functions over a request's problem population:
//!
//! - [`group_common_problems`]: fold problems sharing an upstream group id
//! - [`group_by_ward`]: fold each ward's problems by intra-ward summary
//! - [`compute_analysis`]: per-ward totals and per-ward per-issue counts
//! - [`AnalysisView`]: display ordering and numeric ward range filtering
//!
//! Every function preserves first-encounter order and is deterministic, so
//! re-running over the same input yields identical groups and counts.
//!
//! # Example
//!
//! ```rust,ignore
//! use wr_grouping::{group_common_problems, GroupFragment};
//!
//! let groups = group_common_problems(fragments);
//! for group in &groups {
//!     println!("{} ({})", group.summary, group.count());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod analytics;
pub mod engine;
pub mod fragment;

pub use analytics::{compute_analysis, AnalysisView};
pub use engine::{group_by_ward, group_common_problems};
pub use fragment::{GroupFragment, WardFragment, WardProblems};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
