//! HTTP Range request parsing module
//!
//! Single byte-range requests (RFC 7233). Multi-range requests are answered
//! with the full representation.

/// An inclusive byte range already resolved against the representation size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    /// Number of bytes covered, never zero
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// `Content-Range` header value
    pub fn content_range(&self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Serve this slice with 206
    Partial(ByteRange),
    /// No byte of the representation is selected, answer 416
    Unsatisfiable,
    /// No Range header, unsupported unit or malformed: serve everything
    Ignored,
}

/// Parse an HTTP Range header against a representation of `size` bytes
///
/// Supported forms:
/// - `bytes=start-end`
/// - `bytes=start-`
/// - `bytes=-suffix`
///
/// # Examples
/// ```
/// use abserve::http::range::{parse_range_header, ByteRange, RangeOutcome};
///
/// assert_eq!(
///     parse_range_header(Some("bytes=0-99"), 1000),
///     RangeOutcome::Partial(ByteRange { start: 0, end: 99 })
/// );
/// assert_eq!(parse_range_header(None, 1000), RangeOutcome::Ignored);
/// ```
pub fn parse_range_header(header: Option<&str>, size: usize) -> RangeOutcome {
    let Some(set) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Ignored;
    };
    if set.contains(',') {
        return RangeOutcome::Ignored;
    }
    let Some((first, last)) = set.split_once('-') else {
        return RangeOutcome::Ignored;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        let Ok(suffix) = last.parse::<usize>() else {
            return RangeOutcome::Ignored;
        };
        if suffix == 0 || size == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        return RangeOutcome::Partial(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        });
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeOutcome::Ignored;
    };
    if start >= size {
        return RangeOutcome::Unsatisfiable;
    }
    let end = if last.is_empty() {
        size - 1
    } else {
        match last.parse::<usize>() {
            Ok(end) if end < start => return RangeOutcome::Ignored,
            Ok(end) => end.min(size - 1),
            Err(_) => return RangeOutcome::Ignored,
        }
    };
    RangeOutcome::Partial(ByteRange { start, end })
}
