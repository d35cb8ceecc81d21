//! Graceful shutdown coordination, shared by the agent tickers and the
//! binary's top-level run loop. Ported from a CancellationToken-based
//! server shutdown controller; trimmed of anything protocol-specific since
//! nothing here binds to a socket.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinates graceful shutdown across the three periodic agents.
///
/// Cloning shares the same underlying token; [`child_token`] hands out an
/// independently-cancellable token that is still cancelled when the parent
/// is, so a single agent can be stopped without tearing down the others.
///
/// [`child_token`]: ShutdownController::child_token
#[derive(Clone)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Spawns a background task that cancels the token on Ctrl+C.
    pub fn with_ctrl_c() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received Ctrl+C, initiating graceful shutdown");
                    token.cancel();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl+C"),
            }
        });

        controller
    }

    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn shutdown(&self) {
        info!("manual shutdown triggered");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_shutdown_cancels_children() {
        let controller = ShutdownController::new();
        let child = controller.child_token();

        assert!(!controller.is_cancelled());
        assert!(!child.is_cancelled());

        controller.shutdown();

        assert!(controller.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn child_tokens_are_independent_until_parent_cancels() {
        let controller = ShutdownController::new();
        let a = controller.child_token();
        let b = controller.child_token();

        a.cancel();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!controller.is_cancelled());

        controller.shutdown();
        assert!(b.is_cancelled());
    }
}
