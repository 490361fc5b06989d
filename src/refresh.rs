//! Refresh source
//!
//! Feeds the content cache either once from standard input or repeatedly
//! from a named pipe. Every open or read failure is fatal: the caller gets
//! an [`AppError`] and the poll worker terminates the process through
//! [`error::fail`].

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::content::{ContentCache, Snapshot};
use crate::error::{self, AppError};
use crate::logger;

/// Where new versions of the virtual resource come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshSource {
    /// Read standard input once
    Stdin,
    /// Reopen a named pipe forever, one version per writer session
    Fifo(PathBuf),
}

impl RefreshSource {
    /// Pick the source for `poll`, verifying a poll path is a named pipe
    ///
    /// Does not open the pipe, so it never blocks.
    pub fn new(poll: Option<&Path>) -> Result<Self, AppError> {
        match poll {
            Some(path) => {
                check_fifo(path)?;
                Ok(Self::Fifo(path.to_path_buf()))
            }
            None => Ok(Self::Stdin),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Stdin => "standard input".to_string(),
            Self::Fifo(path) => path.display().to_string(),
        }
    }

    /// First fill of the cache; blocks until a complete payload arrived
    pub fn initial_fill(&self, cache: &ContentCache) -> Result<Arc<Snapshot>, AppError> {
        match self {
            Self::Stdin => fill_from(cache, io::stdin().lock(), "standard input"),
            Self::Fifo(path) => fill_from_fifo(cache, path),
        }
    }

    /// Start the background poll worker (poll mode only)
    ///
    /// The worker never returns: a failure logs and exits the process.
    pub fn spawn_poller(&self, cache: Arc<ContentCache>) -> io::Result<Option<JoinHandle<()>>> {
        let Self::Fifo(path) = self else {
            return Ok(None);
        };
        let path = path.clone();
        thread::Builder::new()
            .name("abserve-poll".to_string())
            .spawn(move || {
                let err = poll_loop(&path, &cache);
                error::fail(&err);
            })
            .map(Some)
    }
}

/// Verify `path` names a FIFO without opening it
pub fn check_fifo(path: &Path) -> Result<(), AppError> {
    let meta = std::fs::metadata(path).map_err(|source| AppError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if is_fifo(&meta.file_type()) {
        Ok(())
    } else {
        Err(AppError::NotAFifo(path.to_path_buf()))
    }
}

#[cfg(unix)]
fn is_fifo(file_type: &std::fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    file_type.is_fifo()
}

#[cfg(not(unix))]
const fn is_fifo(_file_type: &std::fs::FileType) -> bool {
    false
}

/// One open-read-close cycle on the pipe
///
/// Opening blocks until a writer connects; reading ends when every writer
/// has closed its end.
pub fn fill_from_fifo(cache: &ContentCache, path: &Path) -> Result<Arc<Snapshot>, AppError> {
    let open_err = |source| AppError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_err)?;
    let meta = file.metadata().map_err(open_err)?;
    if !is_fifo(&meta.file_type()) {
        return Err(AppError::NotAFifo(path.to_path_buf()));
    }
    fill_from(cache, file, &path.display().to_string())
}

/// Fill the cache from any reader, mapping failures to [`AppError::Read`]
pub fn fill_from<R: io::Read>(
    cache: &ContentCache,
    source: R,
    name: &str,
) -> Result<Arc<Snapshot>, AppError> {
    let snapshot = cache.fill(source).map_err(|source| AppError::Read {
        name: name.to_string(),
        source,
    })?;
    logger::log_content_updated(name, snapshot.len());
    Ok(snapshot)
}

/// Refill from the pipe until an error occurs, then return it
pub fn poll_loop(path: &Path, cache: &ContentCache) -> AppError {
    loop {
        if let Err(err) = fill_from_fifo(cache, path) {
            return err;
        }
    }
}
