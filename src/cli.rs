//! Command line interface
//!
//! Parsed with clap, but `-h/--help` and `--version` are handled here so they
//! can print the short synopsis and exit with the usage status.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use crate::config::{ListenAddr, ServerConfig};
use crate::error::AppError;

const DESCRIPTION: &str =
    "Cache and serve input (from memory) at http://<address>:<port>/[<path>].";

#[derive(Parser, Debug)]
#[command(name = "abserve", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// URL path of the cached input
    #[arg(value_name = "path")]
    paths: Vec<String>,

    /// Ignore input and cache <fifo> (which must be a FIFO) on loop instead
    #[arg(short = 'p', long = "poll", value_name = "fifo")]
    poll: Option<PathBuf>,

    /// Serve everything else from <directory>
    #[arg(short = 'd', long = "directory", value_name = "directory")]
    directory: Option<PathBuf>,

    /// Listen on <address>:<port>
    #[arg(short = 'l', long = "listen", value_name = "address:port", default_value = ":8080")]
    listen: String,

    /// Read runtime settings from <file>
    #[arg(short = 'c', long = "config", value_name = "file")]
    config: Option<PathBuf>,

    /// Print this
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Print version
    #[arg(long = "version")]
    version: bool,
}

/// What the command line asks for
#[derive(Debug)]
pub enum Invocation {
    Serve(ServeArgs),
    Help,
    Version,
}

#[derive(Debug)]
pub struct ServeArgs {
    pub server: ServerConfig,
    pub config_file: Option<PathBuf>,
}

/// Parse `args` (including the program name)
///
/// Help wins over version, version over argument count checks.
pub fn parse<I, T>(args: I) -> Result<Invocation, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| AppError::Usage(usage_message(&e)))?;

    if cli.help {
        return Ok(Invocation::Help);
    }
    if cli.version {
        return Ok(Invocation::Version);
    }
    if cli.paths.len() > 1 {
        return Err(AppError::Usage(format!(
            "too many arguments: expected at most one path, got {}",
            cli.paths.len()
        )));
    }

    let listen: ListenAddr = cli.listen.parse()?;
    let path = cli.paths.into_iter().next().unwrap_or_default();
    Ok(Invocation::Serve(ServeArgs {
        server: ServerConfig::new(&path, cli.directory, cli.poll, listen),
        config_file: cli.config,
    }))
}

/// One-line synopsis
pub fn synopsis(program: &str) -> String {
    format!("Usage: {program} [-h] [-p <fifo>] [-d <directory>] [--] [<path>]")
}

/// Synopsis, description and option list
pub fn help(program: &str) -> String {
    let options = Cli::command()
        .help_template("{options}")
        .render_help()
        .to_string();
    format!(
        "{}\n\n{DESCRIPTION}\n\nOptions:\n{}",
        synopsis(program),
        options.trim_end()
    )
}

/// `abserve v<version>`
pub fn version_line() -> String {
    format!("abserve v{}", env!("CARGO_PKG_VERSION"))
}

/// First line of a clap error without its `error: ` prefix
fn usage_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve(args: &[&str]) -> ServeArgs {
        match parse(std::iter::once("abserve").chain(args.iter().copied())).unwrap() {
            Invocation::Serve(s) => s,
            other => panic!("expected serve, got {other:?}"),
        }
    }

    fn parse_args(args: &[&str]) -> Result<Invocation, AppError> {
        parse(std::iter::once("abserve").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = serve(&[]);
        assert_eq!(args.server.virtual_path, "/");
        assert_eq!(args.server.listen, ListenAddr::default());
        assert!(args.server.directory.is_none());
        assert!(args.server.poll.is_none());
        assert!(args.config_file.is_none());
    }

    #[test]
    fn test_path_is_normalized() {
        assert_eq!(serve(&["doc.html"]).server.virtual_path, "/doc.html");
        assert_eq!(serve(&["/greet.txt"]).server.virtual_path, "/greet.txt");
        assert_eq!(serve(&["--", "-dash.txt"]).server.virtual_path, "/-dash.txt");
    }

    #[test]
    fn test_short_and_long_options() {
        let args = serve(&["-p", "feed", "-d", "assets", "-l", ":8085", "page.html"]);
        assert_eq!(args.server.poll, Some(PathBuf::from("feed")));
        assert_eq!(args.server.directory, Some(PathBuf::from("assets")));
        assert_eq!(args.server.listen.port, 8085);

        let args = serve(&["--poll", "feed", "--directory=assets", "--listen", "127.0.0.1:9000"]);
        assert_eq!(args.server.poll, Some(PathBuf::from("feed")));
        assert_eq!(args.server.listen.host, "127.0.0.1");

        let args = serve(&["-c", "abserve.toml"]);
        assert_eq!(args.config_file, Some(PathBuf::from("abserve.toml")));
    }

    #[test]
    fn test_help_and_version() {
        assert!(matches!(parse_args(&["-h"]), Ok(Invocation::Help)));
        assert!(matches!(parse_args(&["--help", "a", "b"]), Ok(Invocation::Help)));
        assert!(matches!(parse_args(&["--version"]), Ok(Invocation::Version)));
        assert_eq!(version_line(), format!("abserve v{}", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_usage_errors() {
        let err = parse_args(&["a", "b"]).unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);

        let err = parse_args(&["--bogus"]).unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));

        let err = parse_args(&["-p"]).unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
    }

    #[test]
    fn test_bad_listen_address_is_runtime_error() {
        let err = parse_args(&["-l", "host:http"]).unwrap_err();
        assert!(matches!(err, AppError::Address(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_FAILURE);
    }

    #[test]
    fn test_help_text() {
        let text = help("abserve");
        assert!(text.starts_with("Usage: abserve [-h] [-p <fifo>] [-d <directory>] [--] [<path>]"));
        assert!(text.contains(DESCRIPTION));
        assert!(text.contains("--poll"));
        assert!(text.contains("--directory"));
    }
}
