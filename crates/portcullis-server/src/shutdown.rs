//! Graceful shutdown signaling and connection tracking.
//!
//! A [`ShutdownSignal`] is a cloneable watcher the accept loop selects on.
//! It can be driven by OS signals (ctrl-c) or programmatically, which is
//! what tests use. The [`ConnectionTracker`] counts in-flight connections so
//! shutdown can wait for them to drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// Cloneable shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

/// Handle that triggers a [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Signals shutdown to every clone of the paired signal.
    pub fn shutdown(&self) {
        // Receivers may already be gone; nothing to do then.
        let _ = self.sender.send(true);
    }
}

impl ShutdownSignal {
    /// Creates a signal triggered manually through the returned handle.
    #[must_use]
    pub fn manual() -> (ShutdownHandle, Self) {
        let (sender, receiver) = watch::channel(false);
        (ShutdownHandle { sender }, Self { receiver })
    }

    /// Creates a signal triggered by ctrl-c.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let (handle, signal) = Self::manual();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received, shutting down");
                handle.shutdown();
            }
        });
        signal
    }

    /// Waits until shutdown is signaled.
    pub async fn recv(&self) {
        let mut receiver = self.receiver.clone();
        // Already signaled, or wait for the next change.
        while !*receiver.borrow() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Counts in-flight connections for graceful shutdown.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

/// Token held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no active connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection; drop the token when it closes.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::AcqRel);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Returns the number of active connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Waits until every tracked connection has closed.
    pub async fn wait_for_idle(&self) {
        loop {
            let notified = self.notify.notified();
            if self.active.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
        self.notify.notify_waiters();
    }
}
