//! Representation serving
//!
//! Turns an in-memory representation plus request conditionals into a
//! response: preconditions, `Range`, HEAD. Used for the virtual resource and
//! for files read from the fallback directory.

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::cache::{Conditionals, Precondition};
use super::mime;
use super::range::{parse_range_header, RangeOutcome};
use super::response::{self, ContentMeta};

/// A complete representation ready to be served
#[derive(Debug, Clone)]
pub struct Representation<'a> {
    /// Name used to pick the Content-Type (a path or a base name)
    pub name: &'a str,
    pub data: Bytes,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<&'a str>,
    pub cache_control: Option<&'a str>,
}

/// Serve `rep` honoring conditional and range headers
///
/// `is_head` suppresses the body but keeps every header.
pub fn serve_content(
    cond: &Conditionals,
    rep: &Representation<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let meta = ContentMeta {
        content_type: mime::content_type_for(rep.name, &rep.data),
        etag: rep.etag,
        last_modified: rep.last_modified,
        cache_control: rep.cache_control,
    };

    match cond.evaluate(rep.etag, rep.last_modified, true) {
        Precondition::NotModified => return response::build_304_response(&meta),
        Precondition::Failed => return response::build_412_response(),
        Precondition::Proceed => {}
    }

    if cond.range.is_some() && cond.range_applies(rep.etag, rep.last_modified) {
        match parse_range_header(cond.range.as_deref(), rep.data.len()) {
            RangeOutcome::Partial(range) => {
                return response::build_partial_response(&meta, &rep.data, range, is_head);
            }
            RangeOutcome::Unsatisfiable => {
                return response::build_416_response(rep.data.len());
            }
            RangeOutcome::Ignored => {}
        }
    }

    response::build_content_response(&meta, rep.data.clone(), is_head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::cache::{format_http_date, generate_etag};
    use chrono::{Duration, TimeZone};
    use http_body_util::BodyExt;

    fn rep(lm: DateTime<Utc>, etag: &str) -> Representation<'_> {
        Representation {
            name: "greet.txt",
            data: Bytes::from_static(b"hello\n"),
            last_modified: Some(lm),
            etag: Some(etag),
            cache_control: None,
        }
    }

    async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_full_body() {
        let lm = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let etag = generate_etag(lm, 6);
        let resp = serve_content(&Conditionals::default(), &rep(lm, &etag), false);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/plain; charset=utf-8");
        assert_eq!(resp.headers()["Last-Modified"], format_http_date(lm).as_str());
        assert_eq!(body_of(resp).await.as_ref(), b"hello\n");
    }

    #[tokio::test]
    async fn test_not_modified_has_no_body() {
        let lm = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let etag = generate_etag(lm, 6);
        let cond = Conditionals {
            if_modified_since: Some(format_http_date(lm + Duration::seconds(30))),
            ..Default::default()
        };
        let resp = serve_content(&cond, &rep(lm, &etag), false);
        assert_eq!(resp.status(), 304);
        assert!(body_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_range_and_head() {
        let lm = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let etag = generate_etag(lm, 6);
        let cond = Conditionals {
            range: Some("bytes=1-3".to_string()),
            ..Default::default()
        };
        let resp = serve_content(&cond, &rep(lm, &etag), false);
        assert_eq!(resp.status(), 206);
        assert_eq!(body_of(resp).await.as_ref(), b"ell");

        let resp = serve_content(&Conditionals::default(), &rep(lm, &etag), true);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Length"], "6");
        assert!(body_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_if_range_serves_everything() {
        let lm = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let etag = generate_etag(lm, 6);
        let cond = Conditionals {
            range: Some("bytes=0-1".to_string()),
            if_range: Some("\"previous-version\"".to_string()),
            ..Default::default()
        };
        let resp = serve_content(&cond, &rep(lm, &etag), false);
        assert_eq!(resp.status(), 200);
        assert_eq!(body_of(resp).await.as_ref(), b"hello\n");
    }

    #[test]
    fn test_unsatisfiable_range() {
        let lm = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let etag = generate_etag(lm, 6);
        let cond = Conditionals {
            range: Some("bytes=100-".to_string()),
            ..Default::default()
        };
        assert_eq!(serve_content(&cond, &rep(lm, &etag), false).status(), 416);
    }
}
