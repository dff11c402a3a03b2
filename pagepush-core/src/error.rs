//! Error types for pagepush

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pagepush operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pagepush operations
#[derive(Error, Debug)]
pub enum Error {
    /// A subprocess exited with a non-zero status
    ///
    /// `message` is the captured stderr, or a synthesized message if the
    /// process wrote nothing to stderr.
    #[error("{message}")]
    Process { code: i32, message: String },

    /// The git executable could not be spawned
    #[error("Git executable not found at '{0}'. Is git installed?")]
    GitNotFound(String),

    /// The cached clone points at a different repository
    #[error(
        "Remote url mismatch.  Got \"{found}\" but expected \"{expected}\" in {}.  \
         If you have changed your \"repo\" option, try running `pagepush clean` first.",
        .clone.display()
    )]
    RemoteMismatch {
        found: String,
        expected: String,
        clone: PathBuf,
    },

    /// No repository URL could be determined
    #[error("{0}")]
    RepoUrl(String),

    /// Invalid input detected before touching git
    #[error("{0}")]
    Precondition(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid glob pattern
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Replacement for any failure when running silently
    #[error("Unspecified error (run without silent option for detail)")]
    Silenced,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Exit code of a failed subprocess, if this is a process failure
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Process { code, .. } => Some(*code),
            _ => None,
        }
    }
}
