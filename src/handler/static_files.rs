//! Static file serving module
//!
//! Serves the fallback directory: `..` rejection, index files, directory
//! listings and conditional/range handling through [`http::serve_content`].

use crate::config::HttpConfig;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, response, Representation};
use crate::logger;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write;
use std::io;
use std::path::Path;
use tokio::fs;

/// Characters left unescaped in listing links
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Serve `ctx.path` from the directory `root`
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    root: &Path,
    config: &HttpConfig,
) -> Response<Full<Bytes>> {
    if ctx.path.split('/').any(|segment| segment == "..") {
        logger::log_warning(&format!("Rejected path with '..': {}", ctx.path));
        return http::build_400_response();
    }

    // Redirect .../index.html to the directory itself
    if let Some(dir) = ctx.raw_path.strip_suffix("index.html") {
        if dir.ends_with('/') {
            return http::build_redirect_response(&with_query(dir, ctx.query));
        }
    }

    // `..` is rejected above, so the join cannot climb out of `root`.
    // Symlinks inside the directory are followed wherever they point.
    let file_path = root.join(ctx.path.trim_start_matches('/'));
    let meta = match fs::metadata(&file_path).await {
        Ok(m) => m,
        Err(e) => return io_error_response(&e, &file_path),
    };

    if !meta.is_dir() {
        return serve_file(ctx, &file_path, &meta).await;
    }

    if !ctx.raw_path.ends_with('/') {
        let location = format!("{}/", ctx.raw_path);
        return http::build_redirect_response(&with_query(&location, ctx.query));
    }

    for index in &config.index_files {
        let index_path = file_path.join(index);
        if let Ok(index_meta) = fs::metadata(&index_path).await {
            if index_meta.is_file() {
                return serve_file(ctx, &index_path, &index_meta).await;
            }
        }
    }

    if !config.directory_listing {
        return http::build_404_response();
    }
    match render_listing(&file_path).await {
        Ok(html) => response::build_html_response(html, ctx.is_head),
        Err(e) => io_error_response(&e, &file_path),
    }
}

/// Serve a regular file with validators taken from its metadata
async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    meta: &std::fs::Metadata,
) -> Response<Full<Bytes>> {
    let data = match fs::read(path).await {
        Ok(d) => d,
        Err(e) => return io_error_response(&e, path),
    };

    let modified: Option<DateTime<Utc>> = meta.modified().ok().map(DateTime::from);
    let etag = modified.map(|m| cache::generate_file_etag(m, meta.len()));
    let name = path.to_string_lossy();

    let rep = Representation {
        name: &name,
        data: Bytes::from(data),
        last_modified: modified,
        etag: etag.as_deref(),
        cache_control: None,
    };
    http::serve_content(&ctx.conditionals, &rep, ctx.is_head)
}

/// HTML listing of a directory, directories first marked with `/`
async fn render_listing(dir: &Path) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for name in &entries {
        let (stem, slash) = name
            .strip_suffix('/')
            .map_or((name.as_str(), ""), |s| (s, "/"));
        let href = utf8_percent_encode(stem, SEGMENT);
        let _ = writeln!(html, "<a href=\"{href}{slash}\">{}</a>", http::escape_html(name));
    }
    html.push_str("</pre>\n");
    Ok(html)
}

/// Map a filesystem error to a response
fn io_error_response(err: &io::Error, path: &Path) -> Response<Full<Bytes>> {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => http::build_404_response(),
        io::ErrorKind::PermissionDenied => http::build_403_response(),
        _ => {
            logger::log_error(&format!("Failed to read '{}': {err}", path.display()));
            http::build_500_response()
        }
    }
}

fn with_query(location: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{location}?{q}"),
        None => location.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::http::Conditionals;
    use http_body_util::BodyExt;

    fn http_config() -> HttpConfig {
        Settings::default().http
    }

    fn ctx<'a>(path: &'a str) -> RequestContext<'a> {
        RequestContext {
            path,
            raw_path: path,
            query: None,
            is_head: false,
            conditionals: Conditionals::default(),
        }
    }

    fn assets() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body { color: red }").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
        std::fs::create_dir(dir.path().join("raw")).unwrap();
        std::fs::write(dir.path().join("raw/a&b.txt"), "x").unwrap();
        dir
    }

    async fn body_text(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serves_file_with_type_and_validators() {
        let dir = assets();
        let resp = serve_directory(&ctx("/style.css"), dir.path(), &http_config()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/css; charset=utf-8");
        assert!(resp.headers().contains_key("Last-Modified"));
        assert!(resp.headers().contains_key("ETag"));
        assert_eq!(body_text(resp).await, "body { color: red }");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = assets();
        let resp = serve_directory(&ctx("/nope.css"), dir.path(), &http_config()).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_dotdot_is_rejected() {
        let dir = assets();
        let resp = serve_directory(&ctx("/../etc/passwd"), dir.path(), &http_config()).await;
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_encoded_dotdot_is_rejected() {
        let dir = assets();
        let mut context = ctx("/docs/../../secret");
        context.raw_path = "/docs/%2E%2E/%2e%2e/secret";
        let resp = serve_directory(&context, dir.path(), &http_config()).await;
        assert_eq!(resp.status(), 400);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_followed() {
        let dir = assets();
        let shared = tempfile::tempdir().unwrap();
        std::fs::write(shared.path().join("logo.svg"), "<svg/>").unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("assets")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("style.css"), dir.path().join("main.css")).unwrap();

        let resp = serve_directory(&ctx("/assets/logo.svg"), dir.path(), &http_config()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_text(resp).await, "<svg/>");

        let resp = serve_directory(&ctx("/main.css"), dir.path(), &http_config()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_text(resp).await, "body { color: red }");
    }

    #[tokio::test]
    async fn test_directory_redirects_and_index() {
        let dir = assets();
        let config = http_config();

        let resp = serve_directory(&ctx("/docs"), dir.path(), &config).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/docs/");

        let resp = serve_directory(&ctx("/docs/"), dir.path(), &config).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_text(resp).await, "<h1>docs</h1>");

        let resp = serve_directory(&ctx("/docs/index.html"), dir.path(), &config).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/docs/");
    }

    #[tokio::test]
    async fn test_listing_escapes_names() {
        let dir = assets();
        let resp = serve_directory(&ctx("/raw/"), dir.path(), &http_config()).await;
        assert_eq!(resp.status(), 200);
        let html = body_text(resp).await;
        assert!(html.contains("<a href=\"a%26b.txt\">a&amp;b.txt</a>"));

        let mut config = http_config();
        config.directory_listing = false;
        let resp = serve_directory(&ctx("/raw/"), dir.path(), &config).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_root_listing_marks_directories() {
        let dir = assets();
        let html = body_text(
            serve_directory(&ctx("/"), dir.path(), &http_config()).await,
        )
        .await;
        assert!(html.contains("<a href=\"docs/\">docs/</a>"));
        assert!(html.contains("<a href=\"style.css\">style.css</a>"));
    }
}
