//! Per-ward analytics
//!
//! [`compute_analysis`] aggregates raw documents. [`AnalysisView`] holds the
//! entries in display order and applies the numeric ward range.

use indexmap::{IndexMap, IndexSet};
use wr_model::{
    filter_in_range, sort_for_display, AnalysisEntry, Document, IssueCount, IssueTag, Ward,
    WardBounds, WardRange,
};

#[derive(Default)]
struct WardTally {
    total: u64,
    issues: IndexMap<IssueTag, u64>,
}

/// Aggregate per-ward problem totals and per-issue counts
///
/// A document with N problems contributes N to its ward's total. A problem
/// with several labels contributes once to each of them; a label repeated
/// on one problem counts once. Documents without a ward are attributed to
/// the "ward not provided" sentinel. Wards with no problems are omitted,
/// wards appear in first-encounter order, and labels within a ward in
/// first-seen order.
#[must_use]
pub fn compute_analysis<'a, I>(documents: I) -> Vec<AnalysisEntry>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut wards: IndexMap<Ward, WardTally> = IndexMap::new();

    for document in documents {
        if document.problems.is_empty() {
            continue;
        }
        let ward = Ward::or_not_provided(document.ward.clone());
        let tally = wards.entry(ward).or_default();

        for problem in &document.problems {
            tally.total += 1;
            let labels: IndexSet<&IssueTag> = problem.category.iter().collect();
            for label in labels {
                *tally.issues.entry(label.clone()).or_insert(0) += 1;
            }
        }
    }

    wards
        .into_iter()
        .map(|(ward, tally)| AnalysisEntry {
            ward,
            total_problems: tally.total,
            category: tally
                .issues
                .into_iter()
                .map(|(issue, problem_count)| IssueCount {
                    issue,
                    problem_count,
                })
                .collect(),
        })
        .collect()
}

/// Analysis entries prepared for display
#[derive(Debug, Clone)]
pub struct AnalysisView {
    entries: Vec<AnalysisEntry>,
    bounds: Option<WardBounds>,
    range: Option<WardRange>,
}

impl AnalysisView {
    /// Sort entries for display and select the full numeric range
    #[must_use]
    pub fn new(mut entries: Vec<AnalysisEntry>) -> Self {
        sort_for_display(&mut entries);
        let bounds = WardBounds::from_wards(&entries);
        Self {
            range: bounds.map(|b| b.full_range()),
            entries,
            bounds,
        }
    }

    /// Whether there is anything to chart
    ///
    /// Requires at least one numeric ward.
    #[inline]
    #[must_use]
    pub fn has_numeric_data(&self) -> bool {
        self.bounds.is_some()
    }

    /// Numeric extent, when any ward is numeric
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Option<WardBounds> {
        self.bounds
    }

    /// Currently selected range
    #[inline]
    #[must_use]
    pub fn range(&self) -> Option<WardRange> {
        self.range
    }

    /// Select a numeric range
    ///
    /// Bounds are clamped to `min..=effective_max`. Ignored when there are no
    /// numeric wards.
    pub fn set_range(&mut self, lo: i64, hi: i64) {
        if let Some(bounds) = self.bounds {
            let clamp = |v: i64| v.clamp(bounds.min, bounds.effective_max());
            self.range = Some(WardRange::new(clamp(lo), clamp(hi)));
        }
    }

    /// All entries in display order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[AnalysisEntry] {
        &self.entries
    }

    /// Entries shown under the selected range
    ///
    /// The sentinel ward is always included, even without numeric wards to
    /// range over. Named wards are excluded.
    #[must_use]
    pub fn filtered(&self) -> Vec<AnalysisEntry> {
        match self.range {
            Some(range) => filter_in_range(&self.entries, range),
            None => self
                .entries
                .iter()
                .filter(|e| e.ward.is_not_provided())
                .cloned()
                .collect(),
        }
    }

    /// Entry for one ward
    #[must_use]
    pub fn entry(&self, ward: &Ward) -> Option<&AnalysisEntry> {
        self.entries.iter().find(|e| &e.ward == ward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wr_model::{Description, DocumentId, Problem, ProblemId, WARD_NOT_PROVIDED};

    fn doc(id: &str, ward: Option<&str>, problems: &[&[&str]]) -> Document {
        Document {
            id: DocumentId::new(id),
            name: format!("Resident {id}"),
            phone_number: None,
            country_code: None,
            ward: ward.map(Ward::from),
            problems: problems
                .iter()
                .enumerate()
                .map(|(i, labels)| Problem {
                    id: ProblemId::new(format!("{id}-p{i}")),
                    category: labels.iter().map(|l| IssueTag::from(*l)).collect(),
                    description: Description::new("text", "पाठ"),
                })
                .collect(),
        }
    }

    fn entry(ward: &str, total: u64, counts: &[(&str, u64)]) -> AnalysisEntry {
        AnalysisEntry {
            ward: Ward::from(ward),
            total_problems: total,
            category: counts
                .iter()
                .map(|(issue, problem_count)| IssueCount {
                    issue: IssueTag::from(*issue),
                    problem_count: *problem_count,
                })
                .collect(),
        }
    }

    #[test]
    fn counts_problems_and_labels_per_ward() {
        let docs = vec![doc("d1", Some("5"), &[&["leak"]]), doc("d2", Some("5"), &[&["leak", "noise"]])];

        let analysis = compute_analysis(&docs);
        assert_eq!(analysis, vec![entry("5", 2, &[("leak", 2), ("noise", 1)])]);
    }

    #[test]
    fn document_with_many_problems_contributes_each() {
        let docs = vec![doc("d1", Some("2"), &[&["road"], &["road"], &[]])];
        let analysis = compute_analysis(&docs);
        assert_eq!(analysis, vec![entry("2", 3, &[("road", 2)])]);
    }

    #[test]
    fn repeated_label_on_one_problem_counts_once() {
        let docs = vec![doc("d1", Some("2"), &[&["road", "road"]])];
        assert_eq!(compute_analysis(&docs), vec![entry("2", 1, &[("road", 1)])]);
    }

    #[test]
    fn missing_ward_maps_to_sentinel_and_empty_wards_are_omitted() {
        let docs = vec![
            doc("d1", None, &[&["leak"]]),
            doc("d2", Some("9"), &[]),
            doc("d3", Some("3"), &[&["dust"]]),
        ];
        let analysis = compute_analysis(&docs);
        let wards: Vec<&str> = analysis.iter().map(|e| e.ward.as_str()).collect();
        assert_eq!(wards, vec![WARD_NOT_PROVIDED, "3"]);
    }

    #[test]
    fn view_sorts_and_filters_with_sentinel() {
        let mut view = AnalysisView::new(vec![
            entry("3", 1, &[]),
            entry("1", 1, &[]),
            entry(WARD_NOT_PROVIDED, 4, &[]),
            entry("2", 1, &[]),
        ]);

        let order: Vec<&str> = view.entries().iter().map(|e| e.ward.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "3", WARD_NOT_PROVIDED]);

        let bounds = view.bounds().unwrap();
        assert_eq!((bounds.min, bounds.max, bounds.effective_max()), (1, 3, 4));
        assert_eq!(view.range(), Some(WardRange::new(1, 3)));
        assert_eq!(view.filtered().len(), 4);

        view.set_range(2, 2);
        let shown: Vec<String> = view.filtered().into_iter().map(|e| e.ward.to_string()).collect();
        assert_eq!(shown, vec!["2".to_string(), WARD_NOT_PROVIDED.to_string()]);

        view.set_range(-10, 100);
        assert_eq!(view.range(), Some(WardRange::new(1, 4)));
    }

    #[test]
    fn view_without_numeric_wards_keeps_sentinel() {
        let view = AnalysisView::new(vec![entry("Old Town", 2, &[]), entry(WARD_NOT_PROVIDED, 1, &[])]);
        assert!(!view.has_numeric_data());
        let shown: Vec<String> = view.filtered().into_iter().map(|e| e.ward.to_string()).collect();
        assert_eq!(shown, vec![WARD_NOT_PROVIDED.to_string()]);
        assert!(view.entry(&Ward::not_provided()).is_some());
    }
}
