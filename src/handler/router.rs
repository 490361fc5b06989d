//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, the virtual
//! resource, then the fallback directory.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, Conditionals, Representation};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Percent-decoded path
    pub path: &'a str,
    /// Path as it appeared on the request line
    pub raw_path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub conditionals: Conditionals,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();
    let mut response = dispatch(&parts, &state).await;

    if let Some(name) = state.settings.http.server_name.as_deref() {
        if let Ok(value) = HeaderValue::from_str(name) {
            response.headers_mut().insert(header::SERVER, value);
        }
    }

    if state.access_log() {
        let entry = access_entry(&parts, &response, peer, started);
        logger::log_access(&entry, &state.settings.logging.access_log_format);
    }
    Ok(response)
}

async fn dispatch(req: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(&req.method) {
        return resp;
    }

    let raw_path = req.uri.path();
    let Some(path) = http::decode_path(raw_path) else {
        logger::log_warning(&format!("Undecodable request path: {raw_path}"));
        return http::build_400_response();
    };

    let ctx = RequestContext {
        path: &path,
        raw_path,
        query: req.uri.query(),
        is_head: req.method == Method::HEAD,
        conditionals: conditionals_from(req),
    };
    route_request(&ctx, state).await
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Virtual resource first, then the fallback directory
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    if ctx.path == state.server.virtual_path {
        return serve_virtual(ctx, state);
    }

    match state.server.directory.as_deref() {
        Some(root) => static_files::serve_directory(ctx, root, &state.settings.http).await,
        None => http::build_404_response(),
    }
}

/// Serve the current snapshot of the content cache
fn serve_virtual(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let snapshot = state.content.snapshot();
    let rep = Representation {
        name: state.server.virtual_name(),
        data: snapshot.bytes().clone(),
        last_modified: snapshot.last_modified(),
        etag: snapshot.etag(),
        cache_control: state.settings.http.cache_control.as_deref(),
    };
    http::serve_content(&ctx.conditionals, &rep, ctx.is_head)
}

fn conditionals_from(req: &Parts) -> Conditionals {
    let get = |name: HeaderName| header_string(req, &name);
    Conditionals {
        if_match: get(header::IF_MATCH),
        if_none_match: get(header::IF_NONE_MATCH),
        if_modified_since: get(header::IF_MODIFIED_SINCE),
        if_unmodified_since: get(header::IF_UNMODIFIED_SINCE),
        if_range: get(header::IF_RANGE),
        range: get(header::RANGE),
    }
}

fn header_string(req: &Parts, name: &HeaderName) -> Option<String> {
    req.headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn access_entry(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    peer: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(str::to_string);
    entry.http_version = match req.version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header_string(req, &header::REFERER);
    entry.user_agent = header_string(req, &header::USER_AGENT);
    entry.elapsed = started.elapsed();
    entry
}
