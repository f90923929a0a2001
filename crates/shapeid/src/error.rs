use std::path::PathBuf;

use shapeid_pipeline::PipelineError;

/// Failures that end a `shapeid` run.
///
/// Frames that cannot be read or decoded are not errors: they are
/// logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The `--config` file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The `--config` file is not a valid configuration.
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The assembled configuration failed validation.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A frame argument could not be listed or inspected.
    #[error("failed to list frames in {path}: {source}")]
    ListFrames {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file or directory could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A frame report could not be serialized.
    #[error("failed to serialize frame report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The panel image could not be encoded or saved.
    #[error("failed to save panel {path}: {source}")]
    SavePanel {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Nothing was processed.
    #[error("no frame could be processed")]
    NoFrames,
}
