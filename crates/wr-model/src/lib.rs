//! Ward Report domain model
//!
//! Value types shared by every layer of the report engine:
//!
//! - **Requests** own **Documents**, documents own **Problems**
//! - Problems carry free-form **IssueTag** labels and a bilingual description
//! - Documents are located in a **Ward** (numeric, "not provided", or named)
//! - Derived views: [`ProblemGroup`], [`WardGroup`], [`AnalysisEntry`]
//! - Drill-down output: [`FlatProblemRow`], one per (document, problem) pair
//!
//! None of the derived views are persisted. They are recomputed from the
//! current problem population and become stale whenever it changes.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod ids;
pub mod report;
pub mod request;
pub mod row;
pub mod ward;

pub use document::{display_name, Description, Document, IssueTag, Language, Problem};
pub use error::ModelError;
pub use ids::{DocumentId, GroupKey, ProblemId, RequestId, WardId};
pub use report::{AnalysisEntry, IssueCount, ProblemGroup, WardGroup, WardGroupKey};
pub use request::{Request, RequestStatus, User};
pub use row::{FlatProblemRow, ProblemRef};
pub use ward::{
    filter_in_range, sort_for_display, Ward, WardBounds, WardKeyed, WardKind, WardRange,
    WARD_NOT_PROVIDED,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the report model
    pub use crate::{
        AnalysisEntry, Description, Document, DocumentId, FlatProblemRow, GroupKey, IssueCount,
        IssueTag, Language, Problem, ProblemGroup, ProblemId, ProblemRef, Request, RequestId,
        RequestStatus, Ward, WardGroup, WardId,
    };
}
