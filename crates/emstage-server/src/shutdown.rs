//! Cooperative shutdown signal for the server.

use tokio::sync::watch;

/// Fires the paired [`ShutdownSignal`].
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Resolves once shutdown has been requested.
///
/// A signal whose trigger is dropped without firing never resolves.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Signal that fires on Ctrl+C. Must be called inside a tokio runtime.
    pub fn ctrl_c() -> Self {
        let (trigger, signal) = shutdown_channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received shutdown signal");
                    trigger.trigger();
                }
                Err(e) => {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    // Keep the trigger alive so the server stays up.
                    std::future::pending::<()>().await;
                }
            }
        });
        signal
    }

    /// Whether shutdown has already been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the trigger.
    pub async fn wait(mut self) {
        let fired = self.rx.wait_for(|fired| *fired).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a connected trigger and signal.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_trigger_resolves_wait() {
        let (trigger, signal) = shutdown_channel();
        assert!(!signal.is_triggered());

        trigger.trigger();

        assert!(signal.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("signal should resolve after trigger");
    }

    #[tokio::test]
    async fn test_dropped_trigger_never_fires() {
        let (trigger, signal) = shutdown_channel();
        drop(trigger);

        let result = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(result.is_err());
    }
}
