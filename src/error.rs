use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Everything that can go wrong during a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input is not a well-formed MIDI container.
    #[error("failed to parse MIDI file: {0}")]
    Parse(String),

    /// The input could not be read or the output could not be written.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A command-line argument was out of range.
    #[error("invalid argument: {0}")]
    Validation(String),
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
