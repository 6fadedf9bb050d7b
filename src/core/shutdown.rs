//! # OS termination signals.
//!
//! [`wait_for_shutdown_signal`] resolves with the name of the first signal the
//! controller process receives; the runtime records it in the
//! `ShutdownRequested` event.
//!
//! - Unix: `SIGINT`, `SIGTERM` (service manager stop), `SIGQUIT`
//! - elsewhere: Ctrl-C

/// Waits for a termination signal and returns its name.
///
/// `Err` if a signal listener could not be registered.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
