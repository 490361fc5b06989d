//! HTTP protocol layer module
//!
//! Validators, content types, ranges and response builders shared by the
//! virtual resource and the fallback directory server.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;
pub mod serve;

use percent_encoding::percent_decode_str;

// Re-export commonly used types
pub use cache::Conditionals;
pub use response::{
    build_400_response, build_403_response, build_404_response, build_405_response, build_500_response,
    build_options_response, build_redirect_response,
};
pub use serve::{serve_content, Representation};

/// Percent-decode a request path
///
/// Returns `None` when the decoded bytes are not UTF-8.
pub fn decode_path(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
