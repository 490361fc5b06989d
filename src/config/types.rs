// Configuration types module
// Defines the server configuration and the ambient runtime settings

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Port used when `--listen` omits one
pub const DEFAULT_PORT: u16 = 8080;

/// What to serve and where; fixed for the life of the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// URL path of the virtual resource, always starting with `/`
    pub virtual_path: String,
    /// Directory serving every other path
    pub directory: Option<PathBuf>,
    /// Named pipe to poll instead of reading stdin once
    pub poll: Option<PathBuf>,
    pub listen: ListenAddr,
}

impl ServerConfig {
    pub fn new(
        virtual_path: &str,
        directory: Option<PathBuf>,
        poll: Option<PathBuf>,
        listen: ListenAddr,
    ) -> Self {
        Self {
            virtual_path: normalize_virtual_path(virtual_path),
            directory,
            poll,
            listen,
        }
    }

    /// Base name of the virtual path, used to pick its Content-Type
    pub fn virtual_name(&self) -> &str {
        self.virtual_path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("/")
    }
}

/// Prepend `/` unless already present
pub fn normalize_virtual_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// `[address][:port]` as given to `--listen`
///
/// An empty host binds every interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddr {
    pub host: String,
    pub port: u16,
}

impl Default for ListenAddr {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
        }
    }
}

impl FromStr for ListenAddr {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Address(s.to_string());
        let parse_port = |p: &str| -> Result<u16, AppError> {
            if p.is_empty() {
                Ok(DEFAULT_PORT)
            } else {
                p.parse().map_err(|_| invalid())
            }
        };

        // [v6addr] or [v6addr]:port
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match tail {
                "" => DEFAULT_PORT,
                t => parse_port(t.strip_prefix(':').ok_or_else(invalid)?)?,
            };
            return Ok(Self {
                host: host.to_string(),
                port,
            });
        }

        // Bare IPv6 address without port
        if s.matches(':').count() > 1 {
            s.parse::<IpAddr>().map_err(|_| invalid())?;
            return Ok(Self {
                host: s.to_string(),
                port: DEFAULT_PORT,
            });
        }

        match s.split_once(':') {
            Some((host, port)) => Ok(Self {
                host: host.to_string(),
                port: parse_port(port)?,
            }),
            None => Ok(Self {
                host: s.to_string(),
                port: DEFAULT_PORT,
            }),
        }
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl ListenAddr {
    /// Resolve to a bindable socket address
    pub fn to_socket_addr(&self) -> Result<SocketAddr, AppError> {
        if self.host.is_empty() {
            return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port));
        }
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| AppError::Address(self.to_string()))
    }
}

/// Ambient runtime settings (file + environment)
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Log verbosity, most severe first
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Runtime worker threads (CPU cores if unset); zero is rejected
    #[serde(default)]
    pub workers: Option<NonZeroUsize>,
    /// Concurrent connection cap (unlimited if unset)
    #[serde(default)]
    pub max_connections: Option<u64>,
    pub keep_alive: bool,
    pub backlog: i32,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// `Server` header value (omitted if unset)
    #[serde(default)]
    pub server_name: Option<String>,
    /// `Cache-Control` for the virtual resource (omitted if unset)
    #[serde(default)]
    pub cache_control: Option<String>,
    /// Files tried, in order, when a directory is requested
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    /// List directories that have no index file
    pub directory_listing: bool,
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string()]
}
