//! Path resolution
//!
//! Maps a ticket's logical target path onto a location under the storage root.
//! Resolution is pure path arithmetic: nothing on disk is read or created, so it
//! can run before any directory exists.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// The target path would land outside the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Target path escapes the storage root: {0}")]
pub struct PathTraversal(pub String);

/// A destination proven to lie strictly beneath the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    absolute: PathBuf,
    relative: String,
}

impl ResolvedPath {
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Normalized path relative to the root, `/`-separated.
    pub fn relative(&self) -> &str {
        &self.relative
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Resolver for `root`. A relative root is anchored at the current directory.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let absolute = std::path::absolute(root.as_ref())?;
        Ok(Self {
            root: normalize(&absolute),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, target_path: &str) -> Result<ResolvedPath, PathTraversal> {
        let reject = || PathTraversal(target_path.to_string());

        if target_path.is_empty() || target_path.contains('\0') {
            return Err(reject());
        }

        let target = Path::new(target_path);
        if target.is_absolute() || target.has_root() {
            return Err(reject());
        }

        let resolved = normalize(&self.root.join(target));
        let relative = resolved.strip_prefix(&self.root).map_err(|_| reject())?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    segments.push(segment.to_str().ok_or_else(reject)?.to_string())
                }
                _ => return Err(reject()),
            }
        }

        // The root itself is not a file destination.
        if segments.is_empty() {
            return Err(reject());
        }

        Ok(ResolvedPath {
            absolute: resolved,
            relative: segments.join("/"),
        })
    }
}

/// Lexically collapse `.` and `..` without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // popping past the root is a no-op, which keeps `out` absolute
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
