//! Confines `file://` references to the download root.
//!
//! Resolution is purely lexical: the reference is percent-decoded, `.` and `..`
//! segments are collapsed, and any `..` that would climb above the root is an
//! error rather than being clamped.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::encoding::percent_decode;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Empty file path")]
    Empty,

    #[error("Path escapes the download root: {0}")]
    Traversal(String),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// ## Summary
/// Maps a raw local reference onto a path under `root`.
///
/// ## Errors
/// - `PathError::Empty` if the reference is empty
/// - `PathError::Traversal` if a `..` segment would leave `root`, or the
///   reference contains a NUL byte
pub fn resolve_local_path(root: &Path, raw_reference: &str) -> Result<PathBuf, PathError> {
    let decoded = percent_decode(raw_reference);
    if decoded.is_empty() {
        return Err(PathError::Empty);
    }
    if decoded.contains('\0') {
        return Err(PathError::Traversal(decoded));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::Traversal(decoded.clone()));
                }
            }
            other => segments.push(other),
        }
    }

    let resolved = segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment));

    if !resolved.starts_with(root) {
        return Err(PathError::Traversal(decoded));
    }
    Ok(resolved)
}

/// ## Summary
/// Checks that `path` exists and is a regular file, returning its metadata.
///
/// ## Errors
/// - `PathError::NotFound` if nothing exists at `path`
/// - `PathError::NotAFile` for directories and other non-regular files
/// - `PathError::Io` for permission and other I/O failures
pub async fn servable_metadata(path: &Path) -> Result<Metadata, PathError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PathError::NotFound(path.to_path_buf())
        } else {
            PathError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    if !metadata.is_file() {
        return Err(PathError::NotAFile(path.to_path_buf()));
    }
    Ok(metadata)
}
