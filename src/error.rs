//! Error types and the fail-fast termination routine
//!
//! Every fatal condition is funneled through [`fail`], which logs the error
//! with the program-name prefix and exits with the status from
//! [`AppError::exit_code`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::logger;

/// Exit status for usage errors, `--help` and `--version`
pub const EXIT_USAGE: i32 = 2;
/// Exit status for runtime and I/O failures
pub const EXIT_FAILURE: i32 = 1;
/// Exit status after an operator interrupt
pub const EXIT_INTERRUPT: i32 = 0;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad command line
    #[error("{0}")]
    Usage(String),

    /// Poll source exists but is not a named pipe
    #[error("not a FIFO: {}", .0.display())]
    NotAFifo(PathBuf),

    /// Source could not be opened or inspected
    #[error("{}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the source stream failed
    #[error("read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Listen address could not be parsed or resolved
    #[error("invalid listen address '{0}'")]
    Address(String),

    /// Listener could not be bound
    #[error("listen tcp {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Settings file or environment is invalid
    #[error("settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// Log files could not be opened
    #[error("log: {0}")]
    Log(#[source] io::Error),

    /// Runtime construction or a blocking task failed
    #[error("runtime: {0}")]
    Runtime(String),
}

impl AppError {
    /// Process exit status for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

/// Log a fatal error and terminate the process
pub fn fail(err: &AppError) -> ! {
    logger::log_fatal(err);
    std::process::exit(err.exit_code())
}
