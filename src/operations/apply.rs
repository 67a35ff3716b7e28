// Apply Engine
// Executes a plan against a storage backend, stopping at the first failure

use std::path::PathBuf;
use tracing::{error, info};

use super::{rollback, Action, ChangeDetector, Plan, PlanStep, StorageBackend, SyncRecord};
use crate::error::SyncError;
use crate::utilities::is_item_name;

/// Reported after every completed step
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub completed: usize,
    pub total: usize,
    pub step: &'a PlanStep,
}

/// The step an aborted pass stopped at, and why
#[derive(Debug)]
pub struct ApplyFailure {
    /// `None` when the destination could not be mounted
    pub step: Option<PlanStep>,
    pub error: SyncError,
}

/// Outcome of one apply pass
#[derive(Debug)]
pub struct ApplyResult {
    pub completed: usize,
    pub total: usize,
    /// Steps that finished, in execution order
    pub completed_steps: Vec<PlanStep>,
    /// Record matching what actually happened on the destination
    pub record: SyncRecord,
    pub failure: Option<ApplyFailure>,
}

impl ApplyResult {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.completed == self.total
    }
}

/// Drives plan steps against a backend. Single-threaded; each backend call
/// blocks until done and nothing is retried.
pub struct ApplyEngine<'a, B: StorageBackend + ?Sized> {
    backend: &'a B,
    detector: &'a ChangeDetector,
    source_root: PathBuf,
    destination: PathBuf,
}

impl<'a, B: StorageBackend + ?Sized> ApplyEngine<'a, B> {
    pub fn new(
        backend: &'a B,
        detector: &'a ChangeDetector,
        source_root: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            detector,
            source_root: source_root.into(),
            destination: destination.into(),
        }
    }

    /// Run every step of `plan` (deletes first) against the destination.
    /// The returned record is `prior` with exactly the completed steps applied.
    pub fn apply<F>(&self, plan: &Plan, prior: &SyncRecord, mut progress: F) -> ApplyResult
    where
        F: FnMut(Progress<'_>),
    {
        let order = plan.apply_order();
        let total = order.len();

        if total == 0 {
            return ApplyResult {
                completed: 0,
                total: 0,
                completed_steps: Vec::new(),
                record: prior.clone(),
                failure: None,
            };
        }

        if let Err(e) = self.ensure_mounted() {
            error!("Destination unavailable: {}", e);
            return ApplyResult {
                completed: 0,
                total,
                completed_steps: Vec::new(),
                record: prior.clone(),
                failure: Some(ApplyFailure {
                    step: None,
                    error: e,
                }),
            };
        }

        let mut completed_steps: Vec<&PlanStep> = Vec::with_capacity(total);
        let mut failure = None;

        for (index, step) in order.into_iter().enumerate() {
            info!("[{}/{}] {} {}", index + 1, total, step.action.label(), step.name);

            let outcome = if !is_item_name(&step.name) {
                Err(SyncError::InvalidName(step.name.clone()))
            } else {
                match step.action {
                    Action::Delete => self.delete(&step.name),
                    Action::Add | Action::Update => self.copy(&step.name),
                }
            };

            if let Err(e) = outcome {
                error!("Failed to {} {}: {}", step.action.label(), step.name, e);
                failure = Some(ApplyFailure {
                    step: Some(step.clone()),
                    error: e,
                });
                break;
            }

            completed_steps.push(step);
            progress(Progress {
                completed: completed_steps.len(),
                total,
                step,
            });
        }

        let mut record = rollback::settle(prior, completed_steps.iter().copied());
        if let Some(ApplyFailure {
            step: Some(step),
            error,
        }) = &failure
        {
            if touched_destination(error) {
                rollback::discard_failed_copy(&mut record, step);
            }
        }
        if failure.is_some() {
            info!(
                "Apply aborted after {}/{} steps; {} steps rolled back",
                completed_steps.len(),
                total,
                total - completed_steps.len()
            );
        }

        ApplyResult {
            completed: completed_steps.len(),
            total,
            completed_steps: completed_steps.into_iter().cloned().collect(),
            record,
            failure,
        }
    }

    fn ensure_mounted(&self) -> Result<(), SyncError> {
        if self.backend.is_mounted() {
            Ok(())
        } else {
            Ok(self.backend.mount()?)
        }
    }

    fn delete(&self, name: &str) -> Result<(), SyncError> {
        let dest = self.destination.join(name);
        if self.backend.path_exists(&dest) {
            self.backend.remove_recursive(&dest)?;
        }
        Ok(())
    }

    /// Replace the destination copy of an item wholesale
    fn copy(&self, name: &str) -> Result<(), SyncError> {
        let source = self.source_root.join(name);
        let dest = self.destination.join(name);

        let files = self
            .detector
            .qualifying_files(&source)
            .map_err(|e| SyncError::Listing {
                path: source.clone(),
                source: e,
            })?;

        if self.backend.path_exists(&dest) {
            self.backend.clear_directory(&dest)?;
        } else {
            self.backend.make_directory(&dest)?;
        }

        for file in &files {
            self.backend.copy_file(file, &dest)?;
        }

        info!("Copied {} files into {}", files.len(), dest.display());
        Ok(())
    }
}

/// Whether a failed step may already have changed the destination. Errors
/// raised before the first backend call leave it as it was.
fn touched_destination(error: &SyncError) -> bool {
    !matches!(error, SyncError::Listing { .. } | SyncError::InvalidName(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{plan, Fingerprint, Item, LocalBackend, Selection};
    use crate::utilities::QualifyingMatcher;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        dest: PathBuf,
        detector: ChangeDetector,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("music");
        let dest = dir.path().join("player");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        Fixture {
            source,
            dest,
            detector: ChangeDetector::new(QualifyingMatcher::new(vec!["*.flac".to_string()])),
            _dir: dir,
        }
    }

    #[test]
    fn test_empty_plan_is_noop() {
        let fx = fixture();
        let backend = LocalBackend::default();
        let engine = ApplyEngine::new(&backend, &fx.detector, &fx.source, &fx.dest);
        let prior: SyncRecord = [("A", Fingerprint::at(1))].into_iter().collect();

        let mut calls = 0;
        let result = engine.apply(&Plan::default(), &prior, |_| calls += 1);

        assert!(result.is_complete());
        assert_eq!(result.total, 0);
        assert_eq!(result.record, prior);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_update_replaces_destination_contents() {
        let fx = fixture();
        let album = fx.source.join("Album");
        fs::create_dir(&album).unwrap();
        fs::write(album.join("01.flac"), b"new").unwrap();
        fs::write(album.join("cover.jpg"), b"img").unwrap();

        let old = fx.dest.join("Album");
        fs::create_dir(&old).unwrap();
        fs::write(old.join("stale.flac"), b"old").unwrap();

        let prior: SyncRecord = [("Album", Fingerprint::at(1))].into_iter().collect();
        let selection: Selection = ["Album"].into_iter().collect();
        let items = [Item::new("Album", &fx.source)];
        let fresh = |_: &std::path::Path| Fingerprint::at(2);
        let plan = plan(&items, &selection, &prior, &fresh);
        assert_eq!(plan.to_update(), ["Album"]);

        let backend = LocalBackend::default();
        let engine = ApplyEngine::new(&backend, &fx.detector, &fx.source, &fx.dest);
        let mut seen = Vec::new();
        let result = engine.apply(&plan, &prior, |p| seen.push((p.completed, p.total)));

        assert!(result.is_complete());
        assert_eq!(seen, [(1, 1)]);
        assert_eq!(result.record.get("Album"), Some(Fingerprint::at(2)));
        assert!(old.join("01.flac").is_file());
        assert!(!old.join("stale.flac").exists());
        assert!(!old.join("cover.jpg").exists());
    }

    #[test]
    fn test_delete_of_missing_destination_still_clears_entry() {
        let fx = fixture();
        let prior: SyncRecord = [("Ghost", Fingerprint::at(1))].into_iter().collect();
        let plan = plan(&[], &Selection::new(), &prior, &|_: &std::path::Path| Fingerprint::ABSENT);

        let backend = LocalBackend::default();
        let engine = ApplyEngine::new(&backend, &fx.detector, &fx.source, &fx.dest);
        let result = engine.apply(&plan, &prior, |_| {});

        assert!(result.is_complete());
        assert!(result.record.is_empty());
    }

    #[test]
    fn test_unreadable_source_aborts_before_touching_destination() {
        let fx = fixture();
        let prior = SyncRecord::new();
        let selection: Selection = ["Missing"].into_iter().collect();
        let items = [Item::new("Missing", &fx.source)];
        let plan = plan(&items, &selection, &prior, &fx.detector);

        let backend = LocalBackend::default();
        let engine = ApplyEngine::new(&backend, &fx.detector, &fx.source, &fx.dest);
        let result = engine.apply(&plan, &prior, |_| {});

        assert!(!result.is_complete());
        assert_eq!(result.completed, 0);
        assert!(result.record.is_empty());
        assert!(matches!(
            result.failure,
            Some(ApplyFailure { error: SyncError::Listing { .. }, .. })
        ));
        assert!(!fx.dest.join("Missing").exists());
    }
}
