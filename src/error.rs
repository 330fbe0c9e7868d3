// Error types for omp-probe
use camino::Utf8PathBuf;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("{path} is not a valid executable: {reason}")]
    InvalidTarget { path: Utf8PathBuf, reason: String },

    #[error("Failed to run {program}: {source}")]
    LddSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} failed on {path}: {stderr}")]
    LddFailed {
        program: String,
        path: Utf8PathBuf,
        stderr: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the error raised when the inspected path is not an executable file.
    pub fn is_invalid_target(&self) -> bool {
        matches!(self, Error::InvalidTarget { .. })
    }
}
