//! Moving classified files into their destination directories.
//!
//! This module creates destination directories as needed, picks a free file
//! name when the destination already holds a file of the same name, and
//! performs the move. In dry-run mode it computes the same plan without
//! touching the filesystem.

use crate::scanner::FileEntry;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while moving a single file.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a destination directory.
    #[error("Could not create destination directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What `move_file` did, or would do in dry-run mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file now lives at `to`.
    Moved { to: PathBuf, renamed: bool },
    /// Dry run: the file would be moved to `to`.
    WouldMove { to: PathBuf, renamed: bool },
}

impl MoveOutcome {
    /// The final path of the file.
    pub fn destination(&self) -> &Path {
        match self {
            MoveOutcome::Moved { to, .. } | MoveOutcome::WouldMove { to, .. } => to,
        }
    }

    /// True when conflict resolution picked a different file name.
    pub fn renamed(&self) -> bool {
        match self {
            MoveOutcome::Moved { renamed, .. } | MoveOutcome::WouldMove { renamed, .. } => *renamed,
        }
    }
}

/// Makes sure `dir` exists, creating it and any missing parents.
///
/// # Errors
///
/// Returns `OrganizeError::DirectoryCreationFailed` on permission or I/O
/// errors, including when `dir` exists but is not a directory.
pub fn ensure_destination(dir: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Checks, without creating anything, that `dir` could be used as a
/// destination: it is either an existing directory or does not exist yet.
fn check_destination(dir: &Path) -> OrganizeResult<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(OrganizeError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "path exists and is not a directory"),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OrganizeError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Returns the path `entry` should take inside `destination_dir`.
///
/// The file keeps its name if nothing by that name exists there. Otherwise
/// `stem(1).ext`, `stem(2).ext`, ... are probed until a free name is found.
/// The probe has no upper bound.
pub fn resolve_conflict(entry: &FileEntry, destination_dir: &Path) -> PathBuf {
    let candidate = destination_dir.join(&entry.file_name);
    if !entry_exists(&candidate) {
        return candidate;
    }

    let original = Path::new(&entry.file_name);
    let stem: OsString = original
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| entry.file_name.clone());
    let extension: Option<OsString> = original.extension().map(|e| e.to_os_string());

    let mut counter: u64 = 1;
    loop {
        let mut name = stem.clone();
        name.push(format!("({})", counter));
        if let Some(ext) = &extension {
            name.push(".");
            name.push(ext);
        }

        let candidate = destination_dir.join(&name);
        if !entry_exists(&candidate) {
            debug!(file = %entry.name, renamed = %candidate.display(), attempts = counter, "resolved name conflict");
            return candidate;
        }
        counter += 1;
    }
}

/// True if anything, including a dangling symlink, occupies `path`.
fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Moves `entry` into `destination_dir`, or plans the move in dry-run mode.
///
/// The destination directory is created first (in dry-run mode it is only
/// checked). A conflict-free file name is then chosen and, unless
/// `dry_run` is set, the file is moved with a single rename. Moves across
/// filesystems fall back to copy and delete.
///
/// `display_name` is the destination as the user configured it and is only
/// used in log events.
///
/// # Errors
///
/// Returns `OrganizeError::DirectoryCreationFailed` if the destination
/// directory cannot be created, in which case no move is attempted, and
/// `OrganizeError::FileMoveFailure` if the move itself fails.
///
/// # Examples
///
/// ```no_run
/// use cleanify::file_organizer::move_file;
/// use cleanify::scanner::FileEntry;
/// use std::path::Path;
///
/// let entry = FileEntry::from_path(Path::new("/home/u/Desktop/shot.png")).unwrap();
/// match move_file(&entry, Path::new("/home/u/Desktop/Screenshots"), true, "Screenshots") {
///     Ok(outcome) => println!("would move to {}", outcome.destination().display()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn move_file(
    entry: &FileEntry,
    destination_dir: &Path,
    dry_run: bool,
    display_name: &str,
) -> OrganizeResult<MoveOutcome> {
    if dry_run {
        check_destination(destination_dir)?;
    } else {
        ensure_destination(destination_dir)?;
    }

    let target = resolve_conflict(entry, destination_dir);
    let renamed = target.file_name() != Some(entry.file_name.as_os_str());

    if dry_run {
        info!(
            file = %entry.name,
            destination = display_name,
            target = %target.display(),
            renamed,
            "dry run: would move file"
        );
        return Ok(MoveOutcome::WouldMove { to: target, renamed });
    }

    relocate(&entry.path, &target).map_err(|e| {
        warn!(file = %entry.name, error = %e, "move failed");
        OrganizeError::FileMoveFailure {
            from: entry.path.clone(),
            to: target.clone(),
            source: e,
        }
    })?;

    info!(file = %entry.name, destination = display_name, target = %target.display(), "moved file");
    Ok(MoveOutcome::Moved { to: target, renamed })
}

/// Renames `from` to `to`, copying and deleting when they are on different
/// filesystems.
fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(from = %from.display(), to = %to.display(), "cross-device move; copying instead");
            if let Err(copy_err) = fs::copy(from, to) {
                let _ = fs::remove_file(to);
                return Err(copy_err);
            }
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}

fn is_cross_device(e: &io::Error) -> bool {
    match e.raw_os_error() {
        // EXDEV
        #[cfg(unix)]
        Some(18) => true,
        // ERROR_NOT_SAME_DEVICE
        #[cfg(windows)]
        Some(17) => true,
        _ => false,
    }
}
