//! Frame source: expands the command-line arguments into an ordered
//! sequence of image files.

use std::path::{Path, PathBuf};

use crate::error::CliError;

/// File extensions picked up when a directory is given as a frame source.
const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// Expand `sources` into the frame sequence.
///
/// Files are taken as given, in argument order. A directory contributes
/// its image files (by extension, case-insensitive), sorted by name, so
/// numbered dumps such as `frame-0001.png` play back in order.
/// Subdirectories are not descended into.
///
/// # Errors
///
/// Returns [`CliError::ListFrames`] if a directory cannot be read.
pub fn collect_frames(sources: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    let mut frames = Vec::new();
    for source in sources {
        if source.is_dir() {
            frames.extend(list_directory(source)?);
        } else {
            frames.push(source.clone());
        }
    }
    Ok(frames)
}

fn list_directory(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let list_error = |source| CliError::ListFrames {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_error)? {
        let path = entry.map_err(list_error)?.path();
        if path.is_file() && is_frame_file(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    tracing::debug!(dir = %dir.display(), frames = entries.len(), "listed frame directory");
    Ok(entries)
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
