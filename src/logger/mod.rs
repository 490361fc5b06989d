//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Leveled error/warning/info/debug messages
//! - Fatal errors prefixed with the program name
//! - Access logging with multiple formats
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::{LogLevel, LoggingConfig, ServerConfig, Settings};

/// Fallback program name before `init`
const DEFAULT_PROGRAM: &str = "abserve";

static PROGRAM: OnceLock<String> = OnceLock::new();
static LEVEL: OnceLock<LogLevel> = OnceLock::new();

/// Initialize the logger
///
/// Should be called once at startup, before any worker is spawned.
pub fn init(program: &str, config: &LoggingConfig) -> std::io::Result<()> {
    set_program_name(program);
    let _ = LEVEL.set(config.level);
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

/// Name prefixed to fatal errors; only the first call takes effect
pub fn set_program_name(program: &str) {
    let _ = PROGRAM.set(program.to_string());
}

/// Base name of `argv[0]`
pub fn program_name_from(argv0: &str) -> String {
    Path::new(argv0)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_PROGRAM)
        .to_string()
}

pub fn program_name() -> &'static str {
    PROGRAM.get().map_or(DEFAULT_PROGRAM, String::as_str)
}

fn enabled(level: LogLevel) -> bool {
    level <= LEVEL.get().copied().unwrap_or(LogLevel::Warn)
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Unrecoverable error, always written
pub fn log_fatal(err: &impl Display) {
    write_error(&format!("{}: {err}", program_name()));
}

pub fn log_error(message: &str) {
    if enabled(LogLevel::Error) {
        write_error(&format!("[ERROR] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_server_start(addr: &SocketAddr, server: &ServerConfig, settings: &Settings) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_info("======================================");
    write_info(&format!("{} started", program_name()));
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Virtual resource: {}", server.virtual_path));
    match &server.poll {
        Some(fifo) => write_info(&format!("Source: polling {}", fifo.display())),
        None => write_info("Source: standard input (read once)"),
    }
    if let Some(dir) = &server.directory {
        write_info(&format!("Fallback directory: {}", dir.display()));
    }
    write_info(&format!("Log level: {}", settings.logging.level));
    if let Some(workers) = settings.performance.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(max) = settings.performance.max_connections {
        write_info(&format!("Max connections: {max}"));
    }
    if let Some(ref path) = settings.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = settings.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_content_updated(source: &str, bytes: usize) {
    log_info(&format!("Cached {bytes} bytes from {source}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_warning(&format!("Failed to serve connection: {err:?}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
