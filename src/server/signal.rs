// Signal handling module
//
// SIGINT (Ctrl+C) ends the process at once with status 0. No draining:
// in-flight requests and a blocked pipe read are abandoned. Every other
// signal keeps its default disposition.

use crate::error::EXIT_INTERRUPT;
use crate::logger;

/// Spawn the SIGINT watcher on the current runtime
///
/// Registration happens before this returns, so an interrupt that arrives
/// right after startup is not lost.
pub fn start_signal_handler() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            if sigint.recv().await.is_some() {
                on_interrupt();
            }
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt();
        }
    });

    Ok(())
}

fn on_interrupt() -> ! {
    logger::log_info("Interrupted, exiting");
    std::process::exit(EXIT_INTERRUPT)
}
