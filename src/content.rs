//! Content cache
//!
//! Holds the virtual resource's bytes together with the time of the fill that
//! produced them. A fill reads its source completely before taking the lock,
//! so a slow writer on the other end of a pipe never stalls request handling.
//! Readers get an `Arc<Snapshot>` that later fills cannot touch.

use std::io::{self, Read};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use hyper::body::Bytes;

use crate::http::cache;

/// One version of the virtual resource
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    bytes: Bytes,
    last_modified: Option<DateTime<Utc>>,
    etag: Option<String>,
}

impl Snapshot {
    fn new(bytes: Bytes, last_modified: DateTime<Utc>) -> Self {
        let etag = cache::generate_etag(last_modified, bytes.len());
        Self {
            bytes,
            last_modified: Some(last_modified),
            etag: Some(etag),
        }
    }

    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Time of the fill that produced this snapshot, `None` before the first fill
    pub const fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Shared holder of the current [`Snapshot`]
///
/// There is one writer (the refresh source) and any number of readers (the
/// request handlers). Both sides share it through an `Arc`.
#[derive(Debug, Default)]
pub struct ContentCache {
    current: RwLock<Arc<Snapshot>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `source` to end-of-stream and publish it as the new content.
    ///
    /// Blocks until the source is exhausted. The source is dropped before the
    /// new content becomes visible. On a read error the previous content stays
    /// in place and the error is returned.
    pub fn fill<R: Read>(&self, mut source: R) -> io::Result<Arc<Snapshot>> {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        // Close the source before publishing
        drop(source);
        Ok(self.replace(buf))
    }

    /// Publish `bytes` stamped with the current time
    ///
    /// The stamp is the commit time: for [`fill`](Self::fill) that is after
    /// the source hit end-of-stream, not when reading began.
    pub fn replace(&self, bytes: impl Into<Bytes>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot::new(bytes.into(), Utc::now()));
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::clone(&snapshot);
        snapshot
    }

    /// Current content; unaffected by fills that happen afterwards
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Whether at least one fill has completed
    pub fn is_filled(&self) -> bool {
        self.snapshot().last_modified.is_some()
    }
}
