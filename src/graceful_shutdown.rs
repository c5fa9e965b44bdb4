//! Shutdown signal handling

use tokio::signal;

/// Resolves once the process is asked to stop
///
/// Ctrl+C on every platform, SIGTERM additionally on Unix; whichever
/// arrives first wins.
pub async fn handler() {
    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Valid SIGTERM handler");

        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => result.expect("Valid CTRL+C handler"),
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining open connections");
}
