//! Process stop signals

use std::future::Future;

/// Resolves when the process is asked to stop: Ctrl-C, or SIGTERM on unix.
///
/// The SIGTERM handler is installed when this is called rather than on first
/// poll, so a signal arriving right after the call is not lost. Must be called
/// from inside a tokio runtime.
pub fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());

    async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[Shutdown] Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match terminate {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::error!("[Shutdown] Failed to listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("[Shutdown] Ctrl-C received"),
            _ = terminate => tracing::info!("[Shutdown] SIGTERM received"),
        }
    }
}
