// Reconciliation Planner
// Diffs the current selection against the sync record into delete/add/update steps

use std::collections::HashSet;
use tracing::debug;

use super::{Fingerprint, Fingerprinter, Item, Selection, SyncRecord};

/// What a step does to the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// On the destination but no longer selected
    Delete,
    /// Selected but not on the destination
    Add,
    /// Selected, on the destination, fingerprint changed (or unknown)
    Update,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Delete => "delete",
            Action::Add => "add",
            Action::Update => "update",
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, Action::Add | Action::Update)
    }
}

/// One planned operation on one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub name: String,
    pub action: Action,
    /// Fresh fingerprint to record once a copy completes; absent for deletes
    pub fingerprint: Fingerprint,
}

/// Sizes of the three operation lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub deletes: usize,
    pub adds: usize,
    pub updates: usize,
}

impl PlanSummary {
    pub fn total(&self) -> usize {
        self.deletes + self.adds + self.updates
    }
}

/// Disjoint delete/add/update lists, kept in item enumeration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    fn names_for(&self, action: Action) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.action == action)
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn to_delete(&self) -> Vec<&str> {
        self.names_for(Action::Delete)
    }

    pub fn to_add(&self) -> Vec<&str> {
        self.names_for(Action::Add)
    }

    pub fn to_update(&self) -> Vec<&str> {
        self.names_for(Action::Update)
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Execution order: every delete first, then adds and updates interleaved
    /// in plan order. Rollback depends on this ordering.
    pub fn apply_order(&self) -> Vec<&PlanStep> {
        let deletes = self.steps.iter().filter(|s| s.action == Action::Delete);
        let copies = self.steps.iter().filter(|s| s.action.is_copy());
        deletes.chain(copies).collect()
    }

    pub fn fingerprint_of(&self, name: &str) -> Option<Fingerprint> {
        self.steps
            .iter()
            .find(|s| s.name == name && s.action.is_copy())
            .map(|s| s.fingerprint)
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for step in &self.steps {
            match step.action {
                Action::Delete => summary.deletes += 1,
                Action::Add => summary.adds += 1,
                Action::Update => summary.updates += 1,
            }
        }
        summary
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compute the plan. Fingerprints are only computed for selected items.
///
/// Record entries whose directory has vanished from the source listing are
/// deleted too, unless still selected (they cannot be copied, but the user
/// asked to keep them), after all listed items and in record order.
pub fn plan(
    items: &[Item],
    selection: &Selection,
    record: &SyncRecord,
    fingerprinter: &dyn Fingerprinter,
) -> Plan {
    let mut steps = Vec::new();

    for item in items {
        let recorded = record.get(&item.name);

        if !selection.is_selected(&item.name) {
            if recorded.is_some() {
                steps.push(PlanStep {
                    name: item.name.clone(),
                    action: Action::Delete,
                    fingerprint: Fingerprint::ABSENT,
                });
            }
            continue;
        }

        let fresh = fingerprinter.fingerprint(&item.source_path);
        let action = match recorded {
            None => Action::Add,
            Some(previous) if !fresh.matches(&previous) => Action::Update,
            Some(_) => {
                debug!("{} unchanged at {}", item.name, fresh);
                continue;
            }
        };

        steps.push(PlanStep {
            name: item.name.clone(),
            action,
            fingerprint: fresh,
        });
    }

    let listed: HashSet<&str> = items.iter().map(|i| i.name.as_str()).collect();
    for name in record.names() {
        if !listed.contains(name) && !selection.is_selected(name) {
            steps.push(PlanStep {
                name: name.to_string(),
                action: Action::Delete,
                fingerprint: Fingerprint::ABSENT,
            });
        }
    }

    let plan = Plan { steps };
    let summary = plan.summary();
    debug!(
        "Planned {} deletes, {} adds, {} updates",
        summary.deletes, summary.adds, summary.updates
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn items(names: &[&str]) -> Vec<Item> {
        names.iter().map(|n| Item::new(*n, Path::new("/src"))).collect()
    }

    fn fixed(prints: &[(&str, Fingerprint)]) -> impl Fn(&Path) -> Fingerprint {
        let map: HashMap<String, Fingerprint> =
            prints.iter().map(|(n, f)| (n.to_string(), *f)).collect();
        move |path: &Path| {
            let name = path.file_name().unwrap().to_str().unwrap();
            map.get(name).copied().unwrap_or(Fingerprint::ABSENT)
        }
    }

    #[test]
    fn test_deselected_and_new_selection() {
        let record: SyncRecord = [("Album1", Fingerprint::at(100))].into_iter().collect();
        let selection: Selection = ["Album2"].into_iter().collect();
        let detector = fixed(&[("Album2", Fingerprint::at(50))]);

        let plan = plan(&items(&["Album1", "Album2"]), &selection, &record, &detector);

        assert_eq!(plan.to_delete(), ["Album1"]);
        assert_eq!(plan.to_add(), ["Album2"]);
        assert!(plan.to_update().is_empty());
        assert_eq!(plan.fingerprint_of("Album2"), Some(Fingerprint::at(50)));
    }

    #[test]
    fn test_changed_fingerprint_is_update() {
        let record: SyncRecord = [("Album1", Fingerprint::at(100))].into_iter().collect();
        let selection: Selection = ["Album1"].into_iter().collect();
        let detector = fixed(&[("Album1", Fingerprint::at(200))]);

        let plan = plan(&items(&["Album1"]), &selection, &record, &detector);

        assert!(plan.to_delete().is_empty());
        assert!(plan.to_add().is_empty());
        assert_eq!(plan.to_update(), ["Album1"]);
    }

    #[test]
    fn test_unchanged_item_is_left_out() {
        let record: SyncRecord = [("Album1", Fingerprint::at(100))].into_iter().collect();
        let selection: Selection = ["Album1"].into_iter().collect();
        let detector = fixed(&[("Album1", Fingerprint::at(100))]);

        assert!(plan(&items(&["Album1"]), &selection, &record, &detector).is_empty());
    }

    #[test]
    fn test_absent_fingerprint_is_always_replanned() {
        let record: SyncRecord = [("Album1", Fingerprint::ABSENT)].into_iter().collect();
        let selection: Selection = ["Album1", "Album2"].into_iter().collect();
        let detector = fixed(&[]);

        let plan = plan(&items(&["Album1", "Album2"]), &selection, &record, &detector);

        assert_eq!(plan.to_update(), ["Album1"]);
        assert_eq!(plan.to_add(), ["Album2"]);
        assert_eq!(plan.fingerprint_of("Album2"), Some(Fingerprint::ABSENT));
    }

    #[test]
    fn test_unselected_items_are_not_fingerprinted() {
        let record = SyncRecord::new();
        let selection = Selection::new();
        let detector = |_: &Path| -> Fingerprint { panic!("fingerprinted an unselected item") };

        assert!(plan(&items(&["A", "B"]), &selection, &record, &detector).is_empty());
    }

    #[test]
    fn test_vanished_source_is_deleted_unless_selected() {
        let record: SyncRecord = [("Gone", Fingerprint::at(1)), ("Kept", Fingerprint::at(2))]
            .into_iter()
            .collect();
        let selection: Selection = ["Kept"].into_iter().collect();

        let plan = plan(&items(&["Other"]), &selection, &record, &fixed(&[]));

        assert_eq!(plan.to_delete(), ["Gone"]);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_apply_order_puts_deletes_first() {
        let record: SyncRecord = [("B", Fingerprint::at(1)), ("D", Fingerprint::at(1))]
            .into_iter()
            .collect();
        let selection: Selection = ["A", "B", "C"].into_iter().collect();
        let detector = fixed(&[("A", Fingerprint::at(5)), ("B", Fingerprint::at(5))]);

        let plan = plan(&items(&["A", "B", "C", "D"]), &selection, &record, &detector);
        let order: Vec<_> = plan
            .apply_order()
            .iter()
            .map(|s| (s.name.as_str(), s.action))
            .collect();

        assert_eq!(
            order,
            [
                ("D", Action::Delete),
                ("A", Action::Add),
                ("B", Action::Update),
                ("C", Action::Add),
            ]
        );
        assert_eq!(
            plan.summary(),
            PlanSummary {
                deletes: 1,
                adds: 2,
                updates: 1
            }
        );
    }

    #[test]
    fn test_lists_partition_the_changes() {
        let names = ["A", "B", "C", "D", "E", "F"];
        let record: SyncRecord = [
            ("A", Fingerprint::at(1)),
            ("B", Fingerprint::at(1)),
            ("C", Fingerprint::ABSENT),
        ]
        .into_iter()
        .collect();
        let detector = fixed(&[("A", Fingerprint::at(1)), ("B", Fingerprint::at(2))]);

        // Every subset of the names as a selection
        for mask in 0u32..(1 << names.len()) {
            let selection: Selection = names
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, n)| *n)
                .collect();

            let plan = plan(&items(&names), &selection, &record, &detector);

            let mut seen = HashSet::new();
            for step in plan.steps() {
                assert!(seen.insert(step.name.as_str()), "{} planned twice", step.name);
            }

            for name in names {
                let selected = selection.is_selected(name);
                let recorded = record.get(name);
                let expected = match (selected, recorded) {
                    (false, Some(_)) => Some(Action::Delete),
                    (false, None) => None,
                    (true, None) => Some(Action::Add),
                    (true, Some(prev)) => {
                        if detector(Path::new(name)).matches(&prev) {
                            None
                        } else {
                            Some(Action::Update)
                        }
                    }
                };
                let actual = plan.steps().iter().find(|s| s.name == name).map(|s| s.action);
                assert_eq!(actual, expected, "{name} with mask {mask:b}");
            }
        }
    }
}
