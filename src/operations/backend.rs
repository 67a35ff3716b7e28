// Storage Backend
// Destination-side filesystem capability the apply engine drives

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::error::BackendError;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Everything the apply engine needs from the destination. Every fallible
/// call may abort an apply pass.
pub trait StorageBackend {
    /// Whether the destination medium is available
    fn is_mounted(&self) -> bool;

    /// Make the destination medium available
    fn mount(&self) -> BackendResult<()>;

    fn path_exists(&self, path: &Path) -> bool;

    fn remove_recursive(&self, path: &Path) -> BackendResult<()>;

    fn make_directory(&self, path: &Path) -> BackendResult<()>;

    /// Copy `src` into `dest_dir`, keeping its file name
    fn copy_file(&self, src: &Path, dest_dir: &Path) -> BackendResult<()>;

    /// Empty an existing directory, leaving the directory itself in place
    fn clear_directory(&self, path: &Path) -> BackendResult<()> {
        self.remove_recursive(path)?;
        self.make_directory(path)
    }
}

/// Local filesystem backend. With a mount point configured, mounting goes
/// through the system `mountpoint`/`mount` tools.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    mount_point: Option<PathBuf>,
}

impl LocalBackend {
    pub fn new(mount_point: Option<PathBuf>) -> Self {
        Self { mount_point }
    }

    fn run(command: &str, args: &[&OsStr]) -> BackendResult<()> {
        let output = Command::new(command)
            .args(args)
            .output()
            .map_err(|e| BackendError::CommandFailed {
                command: command.to_string(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BackendError::CommandFailed {
                command: command.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl StorageBackend for LocalBackend {
    fn is_mounted(&self) -> bool {
        match &self.mount_point {
            Some(point) => Self::run("mountpoint", &[OsStr::new("-q"), point.as_os_str()]).is_ok(),
            None => true,
        }
    }

    fn mount(&self) -> BackendResult<()> {
        let Some(point) = &self.mount_point else {
            return Ok(());
        };

        info!("Mounting {}", point.display());
        Self::run("mount", &[point.as_os_str()])?;

        if self.is_mounted() {
            Ok(())
        } else {
            Err(BackendError::NotMounted(point.clone()))
        }
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_recursive(&self, path: &Path) -> BackendResult<()> {
        debug!("Removing {}", path.display());
        fs::remove_dir_all(path).map_err(|e| BackendError::io("remove", path, e))
    }

    fn make_directory(&self, path: &Path) -> BackendResult<()> {
        debug!("Creating {}", path.display());
        fs::create_dir_all(path).map_err(|e| BackendError::io("mkdir", path, e))
    }

    fn copy_file(&self, src: &Path, dest_dir: &Path) -> BackendResult<()> {
        let file_name = src.file_name().ok_or_else(|| {
            BackendError::io(
                "copy",
                src,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"),
            )
        })?;
        let dest = dest_dir.join(file_name);

        debug!("Copying {} -> {}", src.display(), dest.display());
        fs::copy(src, &dest).map_err(|e| BackendError::io("copy", src, e))?;

        // Keep the source mtime so the copy looks like the original
        let mtime = fs::metadata(src)
            .and_then(|m| m.modified())
            .map_err(|e| BackendError::io("stat", src, e))?;
        filetime::set_file_mtime(&dest, filetime::FileTime::from_system_time(mtime))
            .map_err(|e| BackendError::io("set mtime", &dest, e))?;

        Ok(())
    }
}
