//! HTTP response building module
//!
//! Builders for the status codes the server emits, decoupled from routing.

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::Response;

use super::cache::format_http_date;
use super::range::ByteRange;

/// Allowed methods advertised on 405 and OPTIONS responses
const ALLOW: &str = "GET, HEAD, OPTIONS";

/// Representation metadata shared by 200, 206 and 304 responses
#[derive(Debug, Clone, Copy)]
pub struct ContentMeta<'a> {
    pub content_type: &'a str,
    pub etag: Option<&'a str>,
    pub last_modified: Option<DateTime<Utc>>,
    pub cache_control: Option<&'a str>,
}

impl ContentMeta<'_> {
    /// Add validator and cache headers to a builder
    fn apply_validators(&self, mut builder: Builder) -> Builder {
        if let Some(etag) = self.etag {
            builder = builder.header("ETag", etag);
        }
        if let Some(lm) = self.last_modified {
            builder = builder.header("Last-Modified", format_http_date(lm));
        }
        if let Some(cc) = self.cache_control {
            builder = builder.header("Cache-Control", cc);
        }
        builder
    }
}

/// Build 200 OK with the full representation
pub fn build_content_response(
    meta: &ContentMeta<'_>,
    data: Bytes,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    meta.apply_validators(Response::builder().status(200))
        .header("Content-Type", meta.content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content for one byte range of `data`
pub fn build_partial_response(
    meta: &ContentMeta<'_>,
    data: &Bytes,
    range: ByteRange,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        data.slice(range.start..=range.end)
    };

    meta.apply_validators(Response::builder().status(206))
        .header("Content-Type", meta.content_type)
        .header("Content-Length", range.len())
        .header("Content-Range", range.content_range(data.len()))
        .header("Accept-Ranges", "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(meta: &ContentMeta<'_>) -> Response<Full<Bytes>> {
    meta.apply_validators(Response::builder().status(304))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a plain-text error response
fn build_text_response(status: u16, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("X-Content-Type-Options", "nosniff")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<Full<Bytes>> {
    build_text_response(400, "400 Bad Request\n")
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<Full<Bytes>> {
    build_text_response(403, "403 Forbidden\n")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(404, "404 page not found\n")
}

/// Build 412 Precondition Failed response
pub fn build_412_response() -> Response<Full<Bytes>> {
    build_text_response(412, "412 Precondition Failed\n")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_text_response(500, "500 Internal Server Error\n")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut response = build_text_response(405, "405 Method Not Allowed\n");
    response
        .headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static(ALLOW));
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Range", format!("bytes */{size}"))
        .body(Full::new(Bytes::from_static(b"416 Range Not Satisfiable\n")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", ALLOW)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 301 redirect to `location`
pub fn build_redirect_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(301)
        .header("Location", location)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(format!(
            "<a href=\"{}\">Moved Permanently</a>.\n",
            super::escape_html(location)
        ))))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta() -> ContentMeta<'static> {
        ContentMeta {
            content_type: "text/plain; charset=utf-8",
            etag: Some("\"1-5\""),
            last_modified: Some(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()),
            cache_control: None,
        }
    }

    #[test]
    fn test_content_response_headers() {
        let resp = build_content_response(&meta(), Bytes::from_static(b"hello"), false);
        assert_eq!(resp.status(), 200);
        let headers = resp.headers();
        assert_eq!(headers["Content-Length"], "5");
        assert_eq!(headers["ETag"], "\"1-5\"");
        assert_eq!(headers["Last-Modified"], "Sat, 09 Mar 2024 14:05:07 GMT");
        assert!(headers.get("Cache-Control").is_none());
    }

    #[test]
    fn test_head_keeps_length() {
        let resp = build_content_response(&meta(), Bytes::from_static(b"hello"), true);
        assert_eq!(resp.headers()["Content-Length"], "5");
    }

    #[test]
    fn test_partial_response() {
        let data = Bytes::from_static(b"0123456789");
        let resp = build_partial_response(&meta(), &data, ByteRange { start: 2, end: 4 }, false);
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Content-Range"], "bytes 2-4/10");
        assert_eq!(resp.headers()["Content-Length"], "3");
    }

    #[test]
    fn test_status_builders() {
        assert_eq!(build_304_response(&meta()).status(), 304);
        assert_eq!(build_404_response().status(), 404);
        assert_eq!(build_405_response().headers()["Allow"], ALLOW);
        assert_eq!(build_416_response(10).headers()["Content-Range"], "bytes */10");
        assert_eq!(build_redirect_response("/dir/").headers()["Location"], "/dir/");
    }
}
