//! Reviewable reconciliation.
//!
//! Stored reviewables are matched to desired specs by field composition, so
//! a reviewable whose fields survive an edit keeps its id and review history.

use serde::Serialize;

use super::models::{ReviewableSpec, ReviewableWithFields};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewablePlan {
    pub to_insert: Vec<ReviewableSpec>,
    pub to_archive: Vec<i64>,
    pub to_unarchive: Vec<i64>,
}

impl ReviewablePlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_archive.is_empty() && self.to_unarchive.is_empty()
    }
}

/// Plan the changes that make the stored reviewables match `desired`.
///
/// Matching compares field-role sets and is greedy: the first unconsumed
/// stored reviewable with an equal set wins.
pub fn reconcile_reviewables(
    current: &[ReviewableWithFields],
    desired: &[ReviewableSpec],
) -> ReviewablePlan {
    let current_specs: Vec<ReviewableSpec> = current.iter().map(|r| r.spec()).collect();
    let mut consumed = vec![false; current.len()];
    let mut plan = ReviewablePlan::default();

    for spec in desired {
        let matched = current_specs
            .iter()
            .enumerate()
            .position(|(i, existing)| !consumed[i] && existing == spec);

        match matched {
            Some(i) => {
                consumed[i] = true;
                if current[i].reviewable.archived {
                    plan.to_unarchive.push(current[i].reviewable.id);
                }
            }
            None => plan.to_insert.push(spec.clone()),
        }
    }

    for (i, existing) in current.iter().enumerate() {
        if !consumed[i] && !existing.reviewable.archived {
            plan.to_archive.push(existing.reviewable.id);
        }
    }

    plan
}
