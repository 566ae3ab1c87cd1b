// =============================================================================
// SHARED/SRC/TYPES/ERROR.RS - Typed Build Tool Errors
// =============================================================================

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while flattening map files
#[derive(Error, Debug)]
pub enum FlattenError {
    /// The build context did not provide the output root
    #[error("build environment has no value for {0}")]
    MissingOutputBase(&'static str),

    /// Copying a single map file failed
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures resolving platform settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("unsupported build target: {0}")]
    UnsupportedTarget(String),

    #[error("failed to read platform configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid platform configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failures launching or running an external invocable
#[derive(Error, Debug)]
pub enum InvocableError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} terminated by signal")]
    Terminated { program: String },
}
