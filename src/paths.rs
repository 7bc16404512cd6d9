//! Destination path resolution.
//!
//! Destinations from the rules file are resolved against the scanned
//! directory and always stay inside it: a destination that would lead
//! outside is clamped back under the base instead of being rejected.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Canonicalizes `path` without requiring it to exist.
///
/// The existing prefix has its symlinks resolved; `.` and `..` are applied
/// in order, and components that do not exist yet are appended as written.
/// Relative paths are made absolute against the current directory first.
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                if let Ok(real) = fs::canonicalize(&resolved) {
                    resolved = real;
                }
            }
        }
    }
    resolved
}

/// Resolves a rule destination against the scanned directory.
///
/// Relative destinations are joined to `base_path`. Absolute destinations are
/// used as-is when they lie inside `base_path`. Anything that would end up
/// outside the base (an absolute path elsewhere, or `..` climbing out) is
/// re-read as a path relative to the base with its root and escaping `..`
/// segments removed, so `/etc` and `../../etc` both become `<base>/etc`.
///
/// # Arguments
///
/// * `base_path` - The scanned directory; need not be canonical
/// * `destination` - The destination as written in the rule
///
/// # Returns
///
/// The canonical destination directory, always inside the canonical base.
/// When a symlink under the base leads outside it, the base itself is
/// returned, which leaves matching files where they are.
///
/// # Examples
///
/// ```no_run
/// use cleanify::paths::resolve_destination;
/// use std::path::Path;
///
/// let dest = resolve_destination(Path::new("/home/u/Desktop"), "../../etc");
/// assert!(dest.starts_with("/home/u/Desktop"));
/// ```
pub fn resolve_destination(base_path: &Path, destination: &str) -> PathBuf {
    let base = canonicalize_lenient(base_path);
    let requested = Path::new(destination);

    let candidate = if requested.is_absolute() {
        canonicalize_lenient(requested)
    } else {
        canonicalize_lenient(&base.join(requested))
    };

    if candidate.starts_with(&base) {
        return candidate;
    }

    debug!(
        destination,
        base = %base.display(),
        "destination leaves the scanned directory; clamping"
    );

    let resolved = canonicalize_lenient(&clamp_under(&base, requested));
    if resolved.starts_with(&base) {
        return resolved;
    }

    warn!(
        destination,
        target = %resolved.display(),
        "destination symlink leads outside the scanned directory; using the scanned directory"
    );
    base
}

/// Joins `requested` to `base` so that the result can never climb above `base`.
fn clamp_under(base: &Path, requested: &Path) -> PathBuf {
    let mut relative = PathBuf::new();
    for component in requested.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::ParentDir => {
                relative.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    base.join(relative)
}

/// Expands a leading `~` to the current user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// The directory scanned when none is given: the user's Desktop.
pub fn default_scan_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn canonical_base(temp_dir: &TempDir) -> PathBuf {
        fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize temp directory")
    }

    #[test]
    fn test_relative_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);

        assert_eq!(resolve_destination(&base, "Images"), base.join("Images"));
        assert_eq!(
            resolve_destination(&base, "Docs/./Invoices"),
            base.join("Docs").join("Invoices")
        );
        assert_eq!(resolve_destination(&base, "a/../b"), base.join("b"));
    }

    #[test]
    fn test_parent_escape_is_clamped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);

        let resolved = resolve_destination(&base, "../../etc");
        assert_eq!(resolved, base.join("etc"));
    }

    #[test]
    fn test_absolute_inside_base_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);
        let inside = base.join("Sorted").join("Images");

        let resolved = resolve_destination(&base, inside.to_str().unwrap());
        assert_eq!(resolved, inside);
    }

    #[test]
    fn test_absolute_outside_base_is_clamped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);

        let resolved = resolve_destination(&base, "/etc/cleanify");
        assert_eq!(resolved, base.join("etc").join("cleanify"));
    }

    #[test]
    fn test_base_given_with_dot_segments() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);
        fs::create_dir(base.join("inner")).unwrap();
        let dotted = base.join("inner").join("..");

        assert_eq!(resolve_destination(&dotted, "Images"), base.join("Images"));
    }

    #[test]
    fn test_canonicalize_lenient_missing_tail() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);

        let path = base.join("missing").join("..").join("also").join(".").join("missing");
        assert_eq!(canonicalize_lenient(&path), base.join("also").join("missing"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_base_is_resolved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);
        let real = base.join("real");
        fs::create_dir(&real).unwrap();
        let link = base.join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(resolve_destination(&link, "Images"), real.join("Images"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_falls_back_to_base() {
        let outside = TempDir::new().expect("Failed to create temp directory");
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);
        std::os::unix::fs::symlink(outside.path(), base.join("out")).unwrap();

        assert_eq!(resolve_destination(&base, "out"), base);
        assert_eq!(resolve_destination(&base, "out/nested"), base);
        assert_eq!(resolve_destination(&base, "/out"), base);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_base_is_followed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = canonical_base(&temp_dir);
        let real = base.join("Sorted");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, base.join("alias")).unwrap();

        assert_eq!(resolve_destination(&base, "alias"), real);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/Desktop")), home.join("Desktop"));
            assert_eq!(expand_home(Path::new("~")), home);
        }
    }
}
