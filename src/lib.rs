//! abserve: cache standard input (or each write session on a named pipe) in
//! memory and serve it over HTTP at a single path, optionally falling back to
//! a directory for every other path.

pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod refresh;
pub mod server;
