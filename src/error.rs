//! Error types for rendermath.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The step of a render that was running when something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Creating the scratch directory and writing the `.tex` source.
    Prepare,
    /// Running the LaTeX compiler.
    Latex,
    /// Running dvipng.
    Dvipng,
    /// Measuring the image and moving it to its destination.
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Prepare => "prepare",
            Stage::Latex => "latex",
            Stage::Dvipng => "dvipng",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{stage}: program `{program}` not found")]
    ToolNotFound { stage: Stage, program: String },

    #[error("{stage}: process exited with {status}\n{log}")]
    ToolFailed {
        stage: Stage,
        status: ExitStatus,
        log: String,
    },

    #[error("{stage}: expected output {} was not produced", path.display())]
    MissingOutput { stage: Stage, path: PathBuf },

    #[error("invalid image {}: {reason}", path.display())]
    InvalidImage { path: PathBuf, reason: String },

    #[error("{stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The stage that failed, if the error is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::ToolNotFound { stage, .. }
            | Error::ToolFailed { stage, .. }
            | Error::MissingOutput { stage, .. }
            | Error::Io { stage, .. } => Some(*stage),
            Error::InvalidImage { .. } => Some(Stage::Output),
        }
    }

    pub(crate) fn io(stage: Stage) -> impl FnOnce(std::io::Error) -> Error {
        move |source| Error::Io { stage, source }
    }
}
