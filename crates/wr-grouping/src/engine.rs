//! Group folding
//!
//! Folding rules shared by both groupings:
//! - one output group per distinct signature, in first-encounter order
//! - labels are unioned in first-seen order
//! - members are a set keyed by (document, problem); repeats are dropped
//! - a fragment with no labels still contributes its members

use crate::fragment::{GroupFragment, WardProblems};
use indexmap::map::Entry;
use indexmap::IndexMap;
use wr_model::{GroupKey, ProblemGroup, WardGroup, WardGroupKey};

/// Fold fragments into common-problem groups
///
/// Fragments sharing a [`GroupKey`] end up in one [`ProblemGroup`]. The
/// summary of the first fragment seen for a key is kept.
#[must_use]
pub fn group_common_problems<I>(fragments: I) -> Vec<ProblemGroup>
where
    I: IntoIterator<Item = GroupFragment>,
{
    let mut groups: IndexMap<GroupKey, ProblemGroup> = IndexMap::new();

    for fragment in fragments {
        let group = match groups.entry(fragment.key) {
            Entry::Occupied(slot) => {
                let group = slot.into_mut();
                if group.summary != fragment.summary {
                    tracing::debug!(
                        key = %group.key,
                        kept = %group.summary,
                        ignored = %fragment.summary,
                        "group key seen with a different summary"
                    );
                }
                group
            }
            Entry::Vacant(slot) => {
                let key = slot.key().clone();
                slot.insert(ProblemGroup::new(key, fragment.summary))
            }
        };

        group.issues.extend(fragment.issues);
        group.members.extend(fragment.members);
    }

    tracing::debug!(groups = groups.len(), "folded common problems");
    groups.into_values().collect()
}

/// Fold each ward's fragments into ward groups
///
/// Groups are keyed by ward section and summary. The ward's category label
/// is carried through unchanged. Ward sections appear in input order, and
/// groups within a ward in first-encounter order.
#[must_use]
pub fn group_by_ward<I>(wards: I) -> Vec<WardGroup>
where
    I: IntoIterator<Item = WardProblems>,
{
    let mut groups: IndexMap<WardGroupKey, WardGroup> = IndexMap::new();

    for ward in wards {
        for fragment in ward.fragments {
            let key = WardGroupKey {
                ward_id: ward.ward_id.clone(),
                summary: fragment.summary,
            };
            let group = groups.entry(key).or_insert_with_key(|key| {
                WardGroup::new(
                    key.ward_id.clone(),
                    ward.ward.clone(),
                    ward.category.clone(),
                    key.summary.clone(),
                )
            });

            group.issues.extend(fragment.issues);
            group.members.extend(fragment.members);
        }
    }

    tracing::debug!(groups = groups.len(), "folded ward groups");
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::WardFragment;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use wr_model::{IssueTag, ProblemRef, Ward, WardId};

    fn tags(labels: &[&str]) -> Vec<IssueTag> {
        labels.iter().map(|l| IssueTag::from(*l)).collect()
    }

    fn single(key: &str, doc: &str, problem: &str, labels: &[&str]) -> GroupFragment {
        GroupFragment::single(
            key,
            format!("summary {key}"),
            ProblemRef::new(doc, problem),
            tags(labels),
        )
    }

    #[test]
    fn groups_keep_first_encounter_order() {
        let groups = group_common_problems(vec![
            single("water", "d1", "p1", &["leak"]),
            single("roads", "d2", "p1", &["pothole"]),
            single("water", "d3", "p1", &["pressure"]),
        ]);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["water", "roads"]);
        assert_eq!(groups[0].count(), 2);
        assert_eq!(
            groups[0].issues.iter().cloned().collect::<Vec<_>>(),
            tags(&["leak", "pressure"])
        );
    }

    #[test]
    fn duplicate_members_are_not_double_counted() {
        let groups = group_common_problems(vec![
            single("water", "d1", "p1", &["leak"]),
            single("water", "d1", "p1", &["leak"]),
            single("water", "d1", "p2", &["leak"]),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count(), 2);
    }

    #[test]
    fn unlabelled_problem_still_counts() {
        let groups = group_common_problems(vec![
            single("misc", "d1", "p1", &[]),
            single("misc", "d2", "p1", &["noise"]),
        ]);
        assert_eq!(groups[0].count(), 2);
        assert_eq!(groups[0].issues.len(), 1);
    }

    #[test]
    fn first_summary_wins_for_a_key() {
        let mut late = single("water", "d2", "p1", &[]);
        late.summary = "different text".to_string();
        let groups = group_common_problems(vec![single("water", "d1", "p1", &[]), late]);
        assert_eq!(groups[0].summary, "summary water");
    }

    #[test]
    fn empty_upstream_group_is_kept() {
        let groups = group_common_problems(vec![GroupFragment {
            key: "empty".into(),
            summary: "No members".to_string(),
            issues: tags(&["x"]),
            members: vec![],
        }]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count(), 0);
    }

    #[test]
    fn ward_groups_fold_by_summary_within_ward() {
        let fragment = |summary: &str, doc: &str, labels: &[&str]| WardFragment {
            summary: summary.to_string(),
            issues: tags(labels),
            members: vec![ProblemRef::new(doc, "p1")],
        };

        let groups = group_by_ward(vec![
            WardProblems {
                ward_id: WardId::new("w5"),
                ward: Ward::from("5"),
                category: "Water".to_string(),
                fragments: vec![
                    fragment("Leaking pipes", "d1", &["leak"]),
                    fragment("Low pressure", "d2", &["pressure"]),
                    fragment("Leaking pipes", "d3", &["leak", "noise"]),
                ],
            },
            WardProblems {
                ward_id: WardId::new("w6"),
                ward: Ward::from("6"),
                category: "Roads".to_string(),
                fragments: vec![fragment("Leaking pipes", "d4", &["leak"])],
            },
        ]);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].summary, "Leaking pipes");
        assert_eq!(groups[0].count(), 2);
        assert_eq!(groups[0].category, "Water");
        assert_eq!(groups[1].summary, "Low pressure");
        assert_eq!(groups[2].ward, Ward::from("6"));
        assert_eq!(groups[2].category, "Roads");
        assert_eq!(groups[2].count(), 1);
    }

    #[test]
    fn regrouping_is_reproducible() {
        let input = vec![
            single("a", "d1", "p1", &["x"]),
            single("b", "d1", "p2", &["y"]),
            single("a", "d2", "p1", &["z"]),
        ];
        assert_eq!(
            group_common_problems(input.clone()),
            group_common_problems(input)
        );
    }

    proptest! {
        #[test]
        fn prop_member_counts_sum_to_problem_count(
            assignments in proptest::collection::vec((0u8..6, 0u8..4), 0..60)
        ) {
            // Each distinct (doc, problem) pair is assigned to exactly one group.
            let mut seen = std::collections::HashSet::new();
            let fragments: Vec<GroupFragment> = assignments
                .iter()
                .enumerate()
                .filter_map(|(i, (group, doc))| {
                    let member = ProblemRef::new(format!("d{doc}"), format!("p{i}"));
                    seen.insert(member.clone()).then(|| {
                        GroupFragment::single(format!("g{group}"), "s", member, vec![])
                    })
                })
                .collect();

            let groups = group_common_problems(fragments);
            let total: usize = groups.iter().map(ProblemGroup::count).sum();
            prop_assert_eq!(total, seen.len());
        }
    }
}
