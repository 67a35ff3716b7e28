// Sync Session
// Loads state once, lets the caller edit the selection, and runs plan + apply + persist

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::{SelectionStore, Settings};
use crate::error::SyncError;
use crate::operations::{
    list_items, plan, ApplyEngine, ApplyFailure, ChangeDetector, Item, Plan, PlanSummary,
    Progress, RecordStore, Selection, StorageBackend, SyncRecord,
};
use crate::utilities::QualifyingMatcher;

/// Where an item stands relative to the destination and the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Selected and recorded on the destination
    OnDestination,
    /// Selected, not on the destination yet
    PendingAdd,
    /// On the destination, no longer selected
    PendingDelete,
    /// Neither selected nor on the destination
    NotSelected,
}

/// What a sync attempt did, for the caller to report and decide on a retry
#[derive(Debug)]
pub struct SyncOutcome {
    pub summary: PlanSummary,
    pub completed: usize,
    pub total: usize,
    /// Set when the apply pass aborted
    pub failure: Option<ApplyFailure>,
    /// Set when the record could not be persisted; the destination may then
    /// disagree with the record on disk
    pub save_error: Option<SyncError>,
}

impl SyncOutcome {
    pub fn success(&self) -> bool {
        self.failure.is_none() && self.save_error.is_none()
    }

    pub fn is_noop(&self) -> bool {
        self.total == 0
    }
}

/// One sync session: the record is read on open and written once per sync
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    detector: ChangeDetector,
    record_store: RecordStore,
    selection_store: SelectionStore,
    items: Vec<Item>,
    record: SyncRecord,
    selection: Selection,
    /// In-memory record differs from the one on disk after a failed save
    unsaved: bool,
}

impl Session {
    /// Open a session: validate settings, list the source, load record and selection.
    /// Without a saved selection, whatever is on the destination stays selected.
    pub fn open(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let items = list_items(&settings.source_root)?;
        let record_store = RecordStore::new(&settings.record_file);
        let record = record_store.load();

        let selection_store = SelectionStore::new(&settings.selection_file);
        let selection = match selection_store.load()? {
            Some(selection) => selection,
            None => record.names().collect(),
        };

        info!(
            "Opened session: {} albums, {} on destination, {} selected",
            items.len(),
            record.len(),
            selection.len()
        );

        let detector =
            ChangeDetector::new(QualifyingMatcher::new(settings.qualifying_patterns.clone()));

        Ok(Self {
            settings,
            detector,
            record_store,
            selection_store,
            items,
            record,
            selection,
            unsaved: false,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn record(&self) -> &SyncRecord {
        &self.record
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// True while the last record save failed and has not been redone
    pub fn has_unsaved_record(&self) -> bool {
        self.unsaved
    }

    /// Re-read the source listing
    pub fn refresh(&mut self) -> Result<()> {
        self.items = list_items(&self.settings.source_root)?;
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    /// Mark an album; unknown names are rejected
    pub fn select(&mut self, name: &str) -> Result<bool> {
        if self.find(name).is_none() {
            anyhow::bail!("No album named '{}' in {}", name, self.settings.source_root.display());
        }
        Ok(self.selection.select(name))
    }

    /// Unmark an album. Names only on the destination may be deselected too.
    pub fn deselect(&mut self, name: &str) -> bool {
        self.selection.deselect(name)
    }

    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        if self.selection.is_selected(name) {
            Ok(!self.deselect(name))
        } else {
            self.select(name)
        }
    }

    pub fn save_selection(&self) -> Result<()> {
        self.selection_store
            .save(&self.selection)
            .context("Failed to save selection")
    }

    pub fn status(&self, name: &str) -> ItemStatus {
        match (self.selection.is_selected(name), self.record.contains(name)) {
            (true, true) => ItemStatus::OnDestination,
            (true, false) => ItemStatus::PendingAdd,
            (false, true) => ItemStatus::PendingDelete,
            (false, false) => ItemStatus::NotSelected,
        }
    }

    /// Compute what a sync would do right now
    pub fn plan(&self) -> Plan {
        plan(&self.items, &self.selection, &self.record, &self.detector)
    }

    /// Plan, apply and persist. The record is saved once, even after a
    /// failed pass, and always reflects only the steps that completed.
    /// An empty plan still saves when an earlier save failed.
    pub fn sync<B, F>(&mut self, backend: &B, progress: F) -> SyncOutcome
    where
        B: StorageBackend + ?Sized,
        F: FnMut(Progress<'_>),
    {
        let plan = self.plan();
        let summary = plan.summary();

        if plan.is_empty() {
            let save_error = if self.unsaved {
                info!("Nothing to apply; saving the pending sync record");
                self.persist()
            } else {
                info!("Destination already matches the selection");
                None
            };
            return SyncOutcome {
                summary,
                completed: 0,
                total: 0,
                failure: None,
                save_error,
            };
        }

        info!(
            "Syncing: {} to delete, {} to add, {} to update",
            summary.deletes, summary.adds, summary.updates
        );

        let engine = ApplyEngine::new(
            backend,
            &self.detector,
            &self.settings.source_root,
            &self.settings.destination,
        );
        let result = engine.apply(&plan, &self.record, progress);

        if let Some(failure) = &result.failure {
            warn!(
                "Sync stopped after {}/{} steps: {}",
                result.completed, result.total, failure.error
            );
        }

        self.record = result.record;
        let save_error = self.persist();

        SyncOutcome {
            summary,
            completed: result.completed,
            total: result.total,
            failure: result.failure,
            save_error,
        }
    }

    fn persist(&mut self) -> Option<SyncError> {
        match self.record_store.save(&self.record) {
            Ok(()) => {
                self.unsaved = false;
                None
            }
            Err(e) => {
                self.unsaved = true;
                error!(
                    "Could not save sync record ({}); destination and record may now disagree",
                    e
                );
                Some(e)
            }
        }
    }
}
