// Rollback bookkeeping
// Builds the record to persist after an apply pass, complete or aborted

use super::{Action, Plan, PlanStep, SyncRecord};

/// Layer exactly the completed steps onto the prior record. Steps that never
/// ran (including the one that failed) leave their prior entry untouched.
pub fn settle<'a>(
    prior: &SyncRecord,
    completed: impl IntoIterator<Item = &'a PlanStep>,
) -> SyncRecord {
    let mut record = prior.clone();
    for step in completed {
        apply_step(&mut record, step);
    }
    record
}

fn apply_step(record: &mut SyncRecord, step: &PlanStep) {
    match step.action {
        Action::Delete => {
            record.remove(&step.name);
        }
        Action::Add | Action::Update => record.set(step.name.clone(), step.fingerprint),
    }
}

/// A copy that failed after touching the destination leaves no usable copy
/// behind, so its entry goes whatever the prior record said.
pub fn discard_failed_copy(record: &mut SyncRecord, failed: &PlanStep) {
    if failed.action.is_copy() {
        record.remove(&failed.name);
    }
}

/// Steps of `plan.apply_order()` that did not run when `completed_count` of
/// them finished. Only meaningful because execution order is fixed.
pub fn unexecuted(plan: &Plan, completed_count: usize) -> Vec<&PlanStep> {
    plan.apply_order().into_iter().skip(completed_count).collect()
}

/// Count-only derivation: apply the whole plan speculatively, then undo the
/// unexecuted suffix. Undone deletes get their prior entry back; undone adds
/// and updates revert to whatever the prior record held (nothing, for adds).
///
/// Agrees with [`settle`] as long as steps run in `apply_order()` and stop at
/// the first failure.
pub fn settle_by_count(prior: &SyncRecord, plan: &Plan, completed_count: usize) -> SyncRecord {
    let mut record = settle(prior, plan.apply_order());

    for step in unexecuted(plan, completed_count) {
        match prior.get(&step.name) {
            Some(fingerprint) => record.set(step.name.clone(), fingerprint),
            None => {
                record.remove(&step.name);
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{plan, Fingerprint, Item, Selection};
    use std::path::Path;

    fn sample() -> (SyncRecord, Plan) {
        let prior: SyncRecord = [
            ("A", Fingerprint::at(1)),
            ("B", Fingerprint::at(2)),
            ("C", Fingerprint::at(3)),
        ]
        .into_iter()
        .collect();
        let selection: Selection = ["C", "D"].into_iter().collect();
        let items: Vec<Item> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|n| Item::new(n, Path::new("/src")))
            .collect();
        let fresh = |_: &Path| Fingerprint::at(9);

        let plan = plan(&items, &selection, &prior, &fresh);
        (prior, plan)
    }

    #[test]
    fn test_failure_between_deletes_keeps_undone_delete() {
        let (prior, plan) = sample();
        assert_eq!(plan.to_delete(), ["A", "B"]);

        let order = plan.apply_order();
        let record = settle(&prior, order.into_iter().take(1));

        assert!(!record.contains("A"));
        assert_eq!(record.get("B"), Some(Fingerprint::at(2)));
        assert_eq!(record.get("C"), Some(Fingerprint::at(3)));
        assert!(!record.contains("D"));
    }

    #[test]
    fn test_count_and_explicit_settlement_agree() {
        let (prior, plan) = sample();

        for k in 0..=plan.len() {
            let explicit = settle(&prior, plan.apply_order().into_iter().take(k));
            assert_eq!(settle_by_count(&prior, &plan, k), explicit, "k = {k}");
        }
    }

    #[test]
    fn test_full_completion_applies_everything() {
        let (prior, plan) = sample();
        let record = settle(&prior, plan.apply_order());

        let expected: SyncRecord = [("C", Fingerprint::at(9)), ("D", Fingerprint::at(9))]
            .into_iter()
            .collect();
        assert_eq!(record, expected);
        assert!(unexecuted(&plan, plan.len()).is_empty());
    }

    #[test]
    fn test_failed_update_drops_prior_entry() {
        let (prior, plan) = sample();
        let mut record = settle(&prior, plan.apply_order().into_iter().take(2));
        let failed = plan.apply_order()[2].clone();
        assert_eq!((failed.name.as_str(), failed.action), ("C", Action::Update));

        discard_failed_copy(&mut record, &failed);
        assert!(record.is_empty());
    }

    #[test]
    fn test_failed_delete_keeps_entry() {
        let (prior, plan) = sample();
        let mut record = prior.clone();
        let failed = plan.apply_order()[0].clone();

        discard_failed_copy(&mut record, &failed);
        assert_eq!(record, prior);
    }

    #[test]
    fn test_unexecuted_is_suffix_of_apply_order() {
        let (_, plan) = sample();
        let names: Vec<_> = unexecuted(&plan, 2).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["C", "D"]);
    }
}
