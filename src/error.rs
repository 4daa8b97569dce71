use std::io;
use thiserror::Error;

/// Failure to enumerate applications from a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("application registry unavailable: {0}")]
    Unavailable(String),

    #[error("failed to walk application directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// The operating environment refused to start an entry.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("entry has no command to run")]
    EmptyCommand,

    #[error("could not spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already terminated")]
    Terminated,
}
