//! Top-level directory scanning.
//!
//! Only the direct children of the target directory are considered. Hidden
//! entries and operating-system metadata files are never organized.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metadata files dropped by macOS and Windows.
const SYSTEM_FILE_NAMES: [&str; 5] = [
    ".DS_Store",
    ".AppleDouble",
    ".LSOverride",
    "Thumbs.db",
    "desktop.ini",
];

/// A file discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The file name, including its extension, for matching and display.
    /// Lossy when the real name is not valid UTF-8.
    pub name: String,
    /// The file name exactly as stored on disk.
    pub file_name: OsString,
    /// The lowercased final extension with its leading dot, or `""`.
    pub extension: String,
    /// The full path to the file.
    pub path: PathBuf,
}

impl FileEntry {
    /// Builds an entry for `path`. Returns `None` if the path has no file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_os_string();
        let name = file_name.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        Some(Self {
            name,
            file_name,
            extension,
            path: path.to_path_buf(),
        })
    }
}

/// Returns true if `name` is a hidden entry or a known system metadata file.
///
/// ```
/// use cleanify::scanner::is_system_file;
///
/// assert!(is_system_file(".gitignore"));
/// assert!(is_system_file("Thumbs.db"));
/// assert!(!is_system_file("thumbs.db"));
/// assert!(!is_system_file("report.pdf"));
/// ```
pub fn is_system_file(name: &str) -> bool {
    name.starts_with('.') || SYSTEM_FILE_NAMES.contains(&name)
}

/// Lists the regular, non-system files directly inside `path`.
///
/// A missing path, a path that is not a directory, or a directory that cannot
/// be opened all yield an empty list. If listing fails part-way, the entries
/// collected before the failure are kept. Entries are sorted by name.
pub fn scan_directory(path: &Path) -> Vec<FileEntry> {
    if !path.is_dir() {
        debug!(path = %path.display(), "scan target is missing or not a directory");
        return Vec::new();
    }

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not list directory");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    kept = files.len(),
                    "directory listing interrupted"
                );
                break;
            }
        };

        let name = entry.file_name();
        if is_system_file(&name.to_string_lossy()) {
            continue;
        }

        let entry_path = entry.path();
        // Follows symlinks, so a link to a regular file is organized too.
        if !entry_path.is_file() {
            continue;
        }

        if let Some(file) = FileEntry::from_path(&entry_path) {
            files.push(file);
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(path = %path.display(), count = files.len(), "scanned directory");
    files
}
