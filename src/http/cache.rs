//! HTTP cache validators
//!
//! `ETag` generation, HTTP-date handling and evaluation of conditional
//! request headers (RFC 7232).

use chrono::{DateTime, NaiveDateTime, Utc};

/// IMF-fixdate, the preferred HTTP-date format
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete asctime() format
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Generate an `ETag` for a resource version
///
/// Derived from the modification time and the length, so every fill of the
/// content cache yields a new validator without hashing the body.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"17f0c2a9b1d3e000-6"`
pub fn generate_etag(last_modified: DateTime<Utc>, len: usize) -> String {
    let stamp = last_modified
        .timestamp_nanos_opt()
        .unwrap_or_else(|| last_modified.timestamp());
    format!("\"{stamp:x}-{len:x}\"")
}

/// Generate an `ETag` for a file on disk (weak, from mtime and size)
pub fn generate_file_etag(modified: DateTime<Utc>, len: u64) -> String {
    format!("W/\"{:x}-{len:x}\"", modified.timestamp())
}

/// Format a timestamp as an IMF-fixdate
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP-date formats
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    [IMF_FIXDATE, RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Check if a client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// Uses weak comparison, so `W/"abc123"` matches `"abc123"`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e.trim_start_matches("W/") == etag.trim_start_matches("W/")
        })
    })
}

/// Strong comparison used by `If-Match` and `If-Range`
fn strong_match(candidate: &str, etag: &str) -> bool {
    !candidate.starts_with("W/") && !etag.starts_with("W/") && candidate == etag
}

/// Conditional headers extracted from a request
#[derive(Debug, Default, Clone)]
pub struct Conditionals {
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub if_unmodified_since: Option<String>,
    pub if_range: Option<String>,
    pub range: Option<String>,
}

/// Outcome of evaluating preconditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Serve the representation (possibly partially)
    Proceed,
    /// Answer 304 Not Modified
    NotModified,
    /// Answer 412 Precondition Failed
    Failed,
}

/// Tri-state result of a single header check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Absent,
    True,
    False,
}

impl Conditionals {
    /// Evaluate preconditions in RFC 7232 section 6 order
    ///
    /// `safe` is true for GET and HEAD; only those get 304 responses.
    pub fn evaluate(
        &self,
        etag: Option<&str>,
        last_modified: Option<DateTime<Utc>>,
        safe: bool,
    ) -> Precondition {
        let mut if_match = self.check_if_match(etag);
        if if_match == Check::Absent {
            if_match = self.check_if_unmodified_since(last_modified);
        }
        if if_match == Check::False {
            return Precondition::Failed;
        }

        match self.check_if_none_match(etag) {
            Check::False => {
                return if safe {
                    Precondition::NotModified
                } else {
                    Precondition::Failed
                };
            }
            Check::Absent => {
                if safe && self.check_if_modified_since(last_modified) == Check::False {
                    return Precondition::NotModified;
                }
            }
            Check::True => {}
        }

        Precondition::Proceed
    }

    /// Whether a `Range` header should be honored given `If-Range`
    pub fn range_applies(&self, etag: Option<&str>, last_modified: Option<DateTime<Utc>>) -> bool {
        let Some(if_range) = self.if_range.as_deref().map(str::trim) else {
            return true;
        };
        if if_range.starts_with('"') || if_range.starts_with("W/") {
            return etag.is_some_and(|etag| strong_match(if_range, etag));
        }
        match (parse_http_date(if_range), last_modified) {
            (Some(date), Some(lm)) => lm.timestamp() == date.timestamp(),
            _ => false,
        }
    }

    fn check_if_match(&self, etag: Option<&str>) -> Check {
        let Some(header) = self.if_match.as_deref() else {
            return Check::Absent;
        };
        let matched = header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || etag.is_some_and(|etag| strong_match(candidate, etag))
        });
        if matched {
            Check::True
        } else {
            Check::False
        }
    }

    fn check_if_unmodified_since(&self, last_modified: Option<DateTime<Utc>>) -> Check {
        let (Some(header), Some(lm)) = (self.if_unmodified_since.as_deref(), last_modified) else {
            return Check::Absent;
        };
        let Some(since) = parse_http_date(header) else {
            return Check::Absent;
        };
        if lm.timestamp() <= since.timestamp() {
            Check::True
        } else {
            Check::False
        }
    }

    fn check_if_none_match(&self, etag: Option<&str>) -> Check {
        match (self.if_none_match.as_deref(), etag) {
            (None, _) => Check::Absent,
            (Some(header), Some(etag)) if check_etag_match(Some(header), etag) => Check::False,
            (Some(header), None) if header.trim() == "*" => Check::False,
            _ => Check::True,
        }
    }

    fn check_if_modified_since(&self, last_modified: Option<DateTime<Utc>>) -> Check {
        let (Some(header), Some(lm)) = (self.if_modified_since.as_deref(), last_modified) else {
            return Check::Absent;
        };
        let Some(since) = parse_http_date(header) else {
            return Check::Absent;
        };
        // HTTP dates have one-second resolution
        if lm.timestamp() <= since.timestamp() {
            Check::False
        } else {
            Check::True
        }
    }
}
