//! Signal-driven shutdown.
//!
//! The first SIGINT (Ctrl+C) or SIGTERM cancels the returned token so every
//! browser can stop and the transport can drain. A second signal force-exits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Exit status used when a second signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Install signal handlers and return the token they cancel.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let count = Arc::new(AtomicU32::new(0));

    let handler_token = token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut sigterm = {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(sigterm) => Some(sigterm),
                Err(e) => {
                    tracing::warn!("Cannot listen for SIGTERM: {}", e);
                    None
                }
            }
        };

        loop {
            #[cfg(unix)]
            let received = match sigterm.as_mut() {
                Some(sigterm) => tokio::select! {
                    r = tokio::signal::ctrl_c() => r.is_ok(),
                    r = sigterm.recv() => r.is_some(),
                },
                None => tokio::signal::ctrl_c().await.is_ok(),
            };

            #[cfg(not(unix))]
            let received = tokio::signal::ctrl_c().await.is_ok();

            if !received {
                tracing::warn!("Signal listener closed, shutdown only via the token");
                return;
            }

            let prev = count.fetch_add(1, Ordering::SeqCst);
            if prev == 0 {
                tracing::info!("Received shutdown signal, stopping browsers...");
                tracing::info!("Press Ctrl+C again to force exit");
                handler_token.cancel();
            } else {
                tracing::warn!("Force exit requested");
                std::process::exit(FORCED_EXIT_CODE);
            }
        }
    });

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_starts_uncancelled() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_child_tokens_observe_parent_cancel() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
