//! Process-level tests: run the built binary and check exit statuses and
//! the fatal error line.

use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const BIN: &str = env!("CARGO_BIN_EXE_abserve");

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("abserve did not exit within {timeout:?}");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

/// A loopback address nothing is listening on
fn free_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap()
}

#[test]
fn version_exits_with_usage_status() {
    let out = run(&["--version"]);
    assert_eq!(out.status.code(), Some(2));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.trim_end(), format!("abserve v{}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_goes_to_stderr_with_usage_status() {
    let out = run(&["-h"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with("Usage: abserve [-h]"), "{stderr}");
}

#[test]
fn two_paths_is_a_usage_error() {
    let out = run(&["a", "b"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Usage: abserve"), "{stderr}");
}

#[test]
fn regular_file_as_poll_source_fails_before_binding() {
    let file = tempfile::NamedTempFile::new().unwrap();
    // Hold the port: a bind attempt would report "listen tcp" instead
    let busy = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = busy.local_addr().unwrap().to_string();

    let path = file.path().to_str().unwrap();
    let out = run(&["-p", path, "-l", &addr]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert_eq!(stderr.trim_end(), format!("abserve: not a FIFO: {path}"));
}

#[test]
fn zero_workers_is_a_settings_error() {
    let addr = free_addr().to_string();
    let out = Command::new(BIN)
        .args(["-l", &addr])
        .env("ABSERVE_PERFORMANCE__WORKERS", "0")
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with("abserve: settings:"), "{stderr}");
    assert!(!stderr.contains("panicked"), "{stderr}");
}

#[test]
fn bind_failure_exits_one() {
    let busy = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = busy.local_addr().unwrap().to_string();
    let out = run(&["-l", &addr]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with(&format!("abserve: listen tcp {addr}")), "{stderr}");
}

#[cfg(unix)]
#[test]
fn interrupt_while_waiting_for_input_exits_zero() {
    let addr = free_addr();
    let mut child = Command::new(BIN)
        .args(["-l", &addr.to_string(), "/greet.txt"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // The listener is bound after the SIGINT handler is installed and
    // before stdin is read, so a successful connect means both are ready
    let deadline = Instant::now() + Duration::from_secs(10);
    while TcpStream::connect(addr).is_err() {
        assert!(Instant::now() < deadline, "abserve never started listening");
        thread::sleep(Duration::from_millis(20));
    }

    let killed = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), Some(0));

    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
    assert!(!stderr.contains("abserve:"), "{stderr}");
    drop(child.stdin.take());
}
