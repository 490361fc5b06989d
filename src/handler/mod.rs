//! Request handler module
//!
//! Dispatches each request to the virtual resource or the fallback
//! directory server.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, RequestContext};
