//! Path helpers for configured store and log locations.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` to `$HOME`, leaving other paths untouched.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    env::var_os("HOME").map_or_else(|| path.to_path_buf(), |home| PathBuf::from(home).join(rest))
}

/// Resolve a configured path to an absolute, normalized path.
///
/// `~` is expanded first. Existing paths are canonicalized so symlinked data
/// directories resolve to the real database file; paths that do not exist yet
/// are joined onto the CWD and normalized syntactically.
#[must_use]
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir().map_or_else(|_| expanded.clone(), |cwd| cwd.join(&expanded))
    };

    std::fs::canonicalize(&absolute).unwrap_or_else(|_| normalize_syntactic(&absolute))
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out.into_iter().collect()
}
