// Change Detector
// Fingerprints an item directory by the newest modification time among its qualifying files

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::utilities::QualifyingMatcher;

/// Newest modification time (milliseconds since the UNIX epoch) among the
/// qualifying files of an item, or absent when it could not be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(Option<i64>);

impl Fingerprint {
    pub const ABSENT: Fingerprint = Fingerprint(None);

    pub fn at(millis: i64) -> Self {
        Self(Some(millis))
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let millis = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
            Err(before) => -i64::try_from(before.duration().as_millis()).unwrap_or(i64::MAX),
        };
        Self(Some(millis))
    }

    pub fn millis(&self) -> Option<i64> {
        self.0
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// True only when both sides were observed and agree. An absent side
    /// always reads as changed.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        matches!((self.0, other.0), (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(millis) => write!(f, "{millis}"),
            None => f.write_str("absent"),
        }
    }
}

/// Anything that can fingerprint an item's source directory
pub trait Fingerprinter {
    fn fingerprint(&self, item_path: &Path) -> Fingerprint;
}

impl<F> Fingerprinter for F
where
    F: Fn(&Path) -> Fingerprint,
{
    fn fingerprint(&self, item_path: &Path) -> Fingerprint {
        self(item_path)
    }
}

/// Filesystem-backed change detector
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    matcher: QualifyingMatcher,
}

impl ChangeDetector {
    pub fn new(matcher: QualifyingMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &QualifyingMatcher {
        &self.matcher
    }

    /// Regular files directly inside `item_path` that qualify, sorted by name
    pub fn qualifying_files(&self, item_path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(item_path).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() && self.matcher.qualifies(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn newest_mtime(&self, item_path: &Path) -> io::Result<Option<SystemTime>> {
        let mut newest = None;

        for file in self.qualifying_files(item_path)? {
            let modified = file.metadata()?.modified()?;
            if newest.map_or(true, |n| modified > n) {
                newest = Some(modified);
            }
        }

        Ok(newest)
    }
}

impl Fingerprinter for ChangeDetector {
    fn fingerprint(&self, item_path: &Path) -> Fingerprint {
        match self.newest_mtime(item_path) {
            Ok(Some(time)) => Fingerprint::from_system_time(time),
            Ok(None) => {
                debug!("No qualifying files in {}", item_path.display());
                Fingerprint::ABSENT
            }
            Err(e) => {
                warn!("Cannot fingerprint {}: {}", item_path.display(), e);
                Fingerprint::ABSENT
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use tempfile::TempDir;

    fn detector() -> ChangeDetector {
        ChangeDetector::new(QualifyingMatcher::new(vec!["*.flac".to_string()]))
    }

    fn write_at(path: &Path, secs: i64) {
        fs::write(path, b"data").unwrap();
        set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    #[test]
    fn test_newest_qualifying_file_wins() {
        let dir = TempDir::new().unwrap();
        write_at(&dir.path().join("01.flac"), 1_000);
        write_at(&dir.path().join("02.flac"), 3_000);
        write_at(&dir.path().join("notes.txt"), 9_000);

        assert_eq!(detector().fingerprint(dir.path()), Fingerprint::at(3_000_000));
    }

    #[test]
    fn test_nested_directories_are_ignored() {
        let dir = TempDir::new().unwrap();
        write_at(&dir.path().join("01.flac"), 1_000);
        let nested = dir.path().join("extras.flac");
        fs::create_dir(&nested).unwrap();
        write_at(&nested.join("bonus.flac"), 5_000);

        assert_eq!(detector().fingerprint(dir.path()), Fingerprint::at(1_000_000));
        assert_eq!(detector().qualifying_files(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_no_qualifying_files_is_absent() {
        let dir = TempDir::new().unwrap();
        write_at(&dir.path().join("cover.jpg"), 1_000);

        assert!(detector().fingerprint(dir.path()).is_absent());
    }

    #[test]
    fn test_unreadable_directory_is_absent() {
        let dir = TempDir::new().unwrap();
        assert!(detector().fingerprint(&dir.path().join("missing")).is_absent());
    }

    #[test]
    fn test_absent_never_matches() {
        assert!(Fingerprint::at(5).matches(&Fingerprint::at(5)));
        assert!(!Fingerprint::at(5).matches(&Fingerprint::at(6)));
        assert!(!Fingerprint::ABSENT.matches(&Fingerprint::ABSENT));
        assert!(!Fingerprint::ABSENT.matches(&Fingerprint::at(5)));
    }

    #[test]
    fn test_closure_fingerprinter() {
        let fixed = |_: &Path| Fingerprint::at(42);
        assert_eq!(fixed.fingerprint(Path::new("/anywhere")), Fingerprint::at(42));
    }
}
