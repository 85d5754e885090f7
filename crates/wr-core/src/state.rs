//! Report view state machine
//!
//! `Collapsed -> WardSelected -> IssueDrilldown`, with `deselect` returning
//! to `Collapsed` from anywhere. Ward selection is local: the issue slices
//! come from the already-loaded analytics entry.

use crate::error::{SessionError, SessionResult};
use indexmap::IndexMap;
use wr_model::{AnalysisEntry, IssueCount, IssueTag, Ward};

/// Phase of a report view, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPhase {
    /// No ward selected
    Collapsed,
    /// A ward's issue slices are shown
    WardSelected,
    /// One issue slice of the ward is drilled into
    IssueDrilldown,
}

/// Validate a phase transition
///
/// # Errors
/// `SessionError::IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: ViewPhase, to: ViewPhase) -> SessionResult<()> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(SessionError::IllegalTransition { from, to })
    }
}

/// Phases reachable in one step
#[must_use]
pub fn allowed_transitions(from: ViewPhase) -> Vec<ViewPhase> {
    use ViewPhase::{Collapsed, IssueDrilldown, WardSelected};
    match from {
        Collapsed => vec![Collapsed, WardSelected],
        WardSelected | IssueDrilldown => vec![Collapsed, WardSelected, IssueDrilldown],
    }
}

/// Issue slices of the selected ward with their visibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardSelection {
    /// Selected ward
    pub ward: Ward,
    slices: IndexMap<IssueTag, (u64, bool)>,
}

impl WardSelection {
    /// All slices of `entry`, visible
    #[must_use]
    pub fn new(entry: &AnalysisEntry) -> Self {
        Self {
            ward: entry.ward.clone(),
            slices: entry
                .category
                .iter()
                .map(|c| (c.issue.clone(), (c.problem_count, true)))
                .collect(),
        }
    }

    /// Whether the ward reports `issue`
    #[inline]
    #[must_use]
    pub fn has_issue(&self, issue: &IssueTag) -> bool {
        self.slices.contains_key(issue)
    }

    /// Flip visibility of one slice; returns the new visibility
    pub fn toggle(&mut self, issue: &IssueTag) -> Option<bool> {
        let (_, visible) = self.slices.get_mut(issue)?;
        *visible = !*visible;
        Some(*visible)
    }

    /// Visible slices in analytics order
    #[must_use]
    pub fn visible(&self) -> Vec<IssueCount> {
        self.slices
            .iter()
            .filter(|(_, (_, visible))| *visible)
            .map(|(issue, (count, _))| IssueCount {
                issue: issue.clone(),
                problem_count: *count,
            })
            .collect()
    }
}

/// Report view state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    /// No ward selected
    #[default]
    Collapsed,
    /// Ward selected
    WardSelected(WardSelection),
    /// Issue slice of the selected ward drilled into
    IssueDrilldown {
        /// Ward selection the drill-down came from
        selection: WardSelection,
        /// Issue drilled into
        issue: IssueTag,
    },
}

impl ViewState {
    /// Phase without payload
    #[must_use]
    pub fn phase(&self) -> ViewPhase {
        match self {
            Self::Collapsed => ViewPhase::Collapsed,
            Self::WardSelected(_) => ViewPhase::WardSelected,
            Self::IssueDrilldown { .. } => ViewPhase::IssueDrilldown,
        }
    }

    /// Current ward selection, if any
    #[must_use]
    pub fn selection(&self) -> Option<&WardSelection> {
        match self {
            Self::Collapsed => None,
            Self::WardSelected(selection) | Self::IssueDrilldown { selection, .. } => Some(selection),
        }
    }

    fn selection_mut(&mut self) -> Option<&mut WardSelection> {
        match self {
            Self::Collapsed => None,
            Self::WardSelected(selection) | Self::IssueDrilldown { selection, .. } => Some(selection),
        }
    }

    /// Select a ward
    ///
    /// Re-selecting the current ward keeps visibility choices; another ward
    /// starts with every slice visible.
    ///
    /// # Errors
    /// `IllegalTransition` never occurs from a valid state
    pub fn select_ward(&mut self, entry: &AnalysisEntry) -> SessionResult<()> {
        validate_transition(self.phase(), ViewPhase::WardSelected)?;
        let selection = match self.selection() {
            Some(current) if current.ward == entry.ward => current.clone(),
            _ => WardSelection::new(entry),
        };
        *self = Self::WardSelected(selection);
        Ok(())
    }

    /// Ward and issue an issue-slice drill-down would query
    ///
    /// # Errors
    /// `NoWardSelected` or `UnknownIssue`
    pub fn slice_target(&self, issue: &IssueTag) -> SessionResult<Ward> {
        let selection = self.selection().ok_or(SessionError::NoWardSelected)?;
        if !selection.has_issue(issue) {
            return Err(SessionError::UnknownIssue {
                ward: selection.ward.clone(),
                issue: issue.clone(),
            });
        }
        Ok(selection.ward.clone())
    }

    /// Enter the drill-down for `issue` of `ward`
    ///
    /// A no-op when the ward was deselected or changed while the query was
    /// in flight.
    ///
    /// # Errors
    /// `IllegalTransition` from `Collapsed`
    pub fn enter_drilldown(&mut self, ward: &Ward, issue: IssueTag) -> SessionResult<bool> {
        let Some(selection) = self.selection().filter(|s| &s.ward == ward).cloned() else {
            return Ok(false);
        };
        validate_transition(self.phase(), ViewPhase::IssueDrilldown)?;
        *self = Self::IssueDrilldown { selection, issue };
        Ok(true)
    }

    /// Toggle one slice of the selected ward
    ///
    /// # Errors
    /// `NoWardSelected` or `UnknownIssue`
    pub fn toggle_issue(&mut self, issue: &IssueTag) -> SessionResult<bool> {
        let selection = self.selection_mut().ok_or(SessionError::NoWardSelected)?;
        let ward = selection.ward.clone();
        selection.toggle(issue).ok_or_else(|| SessionError::UnknownIssue {
            ward,
            issue: issue.clone(),
        })
    }

    /// Return to `Collapsed`, forgetting visibility choices
    pub fn deselect(&mut self) {
        *self = Self::Collapsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(ward: &str, counts: &[(&str, u64)]) -> AnalysisEntry {
        AnalysisEntry {
            ward: Ward::from(ward),
            total_problems: counts.iter().map(|(_, c)| c).sum(),
            category: counts
                .iter()
                .map(|(issue, problem_count)| IssueCount {
                    issue: IssueTag::from(*issue),
                    problem_count: *problem_count,
                })
                .collect(),
        }
    }

    fn issues(slices: &[IssueCount]) -> Vec<&str> {
        slices.iter().map(|s| s.issue.as_str()).collect()
    }

    #[test]
    fn transitions_match_table() {
        assert!(validate_transition(ViewPhase::Collapsed, ViewPhase::WardSelected).is_ok());
        assert!(validate_transition(ViewPhase::WardSelected, ViewPhase::IssueDrilldown).is_ok());
        assert!(validate_transition(ViewPhase::IssueDrilldown, ViewPhase::Collapsed).is_ok());
        assert_eq!(
            validate_transition(ViewPhase::Collapsed, ViewPhase::IssueDrilldown),
            Err(SessionError::IllegalTransition {
                from: ViewPhase::Collapsed,
                to: ViewPhase::IssueDrilldown,
            })
        );
    }

    #[test]
    fn reselecting_same_ward_keeps_toggles() {
        let five = entry("5", &[("leak", 2), ("noise", 1)]);
        let mut state = ViewState::default();

        state.select_ward(&five).unwrap();
        assert_eq!(state.toggle_issue(&IssueTag::new("leak")), Ok(false));
        state.select_ward(&five).unwrap();
        assert_eq!(issues(&state.selection().unwrap().visible()), vec!["noise"]);

        state.select_ward(&entry("2", &[("road", 1)])).unwrap();
        assert_eq!(issues(&state.selection().unwrap().visible()), vec!["road"]);
    }

    #[test]
    fn deselect_discards_toggles() {
        let five = entry("5", &[("leak", 2), ("noise", 1)]);
        let mut state = ViewState::default();
        state.select_ward(&five).unwrap();
        state.toggle_issue(&IssueTag::new("noise")).unwrap();

        state.deselect();
        assert_eq!(state.phase(), ViewPhase::Collapsed);
        state.select_ward(&five).unwrap();
        assert_eq!(issues(&state.selection().unwrap().visible()), vec!["leak", "noise"]);
    }

    #[test]
    fn slice_needs_ward_and_known_issue() {
        let mut state = ViewState::default();
        assert_eq!(state.slice_target(&IssueTag::new("leak")), Err(SessionError::NoWardSelected));

        state.select_ward(&entry("5", &[("leak", 2)])).unwrap();
        assert!(matches!(
            state.slice_target(&IssueTag::new("dust")),
            Err(SessionError::UnknownIssue { .. })
        ));
        assert_eq!(state.slice_target(&IssueTag::new("leak")), Ok(Ward::new("5")));
    }

    #[test]
    fn drilldown_ignores_stale_ward() {
        let mut state = ViewState::default();
        state.select_ward(&entry("5", &[("leak", 2)])).unwrap();

        assert_eq!(state.enter_drilldown(&Ward::new("2"), IssueTag::new("leak")), Ok(false));
        assert_eq!(state.phase(), ViewPhase::WardSelected);

        assert_eq!(state.enter_drilldown(&Ward::new("5"), IssueTag::new("leak")), Ok(true));
        assert_eq!(state.phase(), ViewPhase::IssueDrilldown);
        // slices stay available for the next selection
        assert!(state.slice_target(&IssueTag::new("leak")).is_ok());
    }
}
