// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Detached session liveness updates.
//!
//! Recording "last seen" must never delay or fail a request. The tracker
//! accepts session IDs on a bounded queue and a background task applies them
//! through [`SessionManager::update_session_activity`]. A full queue drops the
//! update; a failed update is logged and forgotten.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use super::manager::SessionManager;
use crate::config::ActivityConfig;

/// Commands sent to the activity worker.
enum ActivityCommand {
    /// Mark a session as seen now.
    Touch(String),
    /// Reply once every earlier command has been applied.
    Flush(oneshot::Sender<()>),
    /// Stop the worker after draining the queue.
    Shutdown,
}

/// Activity tracker statistics.
#[derive(Debug, Default)]
struct ActivityStats {
    /// Updates accepted onto the queue.
    received: AtomicU64,
    /// Updates applied successfully.
    applied: AtomicU64,
    /// Updates dropped because the queue was full or closed.
    dropped: AtomicU64,
    /// Updates that failed in the repository.
    failed: AtomicU64,
}

// =============================================================================
// ActivityTracker
// =============================================================================

/// Background worker that applies session liveness updates.
///
/// Must be created inside a Tokio runtime.
pub struct ActivityTracker {
    sender: mpsc::Sender<ActivityCommand>,
    stats: Arc<ActivityStats>,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ActivityTracker {
    /// Spawns the worker.
    pub fn spawn(sessions: SessionManager, config: &ActivityConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let stats = Arc::new(ActivityStats::default());

        let handle = tokio::spawn(Self::worker(sessions, receiver, Arc::clone(&stats)));

        Self {
            sender,
            stats,
            handle: Mutex::new(Some(handle)),
        }
    }

    async fn worker(
        sessions: SessionManager,
        mut receiver: mpsc::Receiver<ActivityCommand>,
        stats: Arc<ActivityStats>,
    ) {
        while let Some(cmd) = receiver.recv().await {
            match cmd {
                ActivityCommand::Touch(session_id) => {
                    match sessions.update_session_activity(&session_id).await {
                        Ok(()) => {
                            stats.applied.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(
                                session_id = %session_id,
                                error = %e,
                                "Failed to update session activity"
                            );
                        }
                    }
                }
                ActivityCommand::Flush(reply) => {
                    let _ = reply.send(());
                }
                ActivityCommand::Shutdown => break,
            }
        }

        tracing::debug!("Session activity worker stopped");
    }

    /// Queues a liveness update without waiting.
    pub fn record(&self, session_id: impl Into<String>) {
        match self.sender.try_send(ActivityCommand::Touch(session_id.into())) {
            Ok(()) => {
                self.stats.received.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Activity queue full; update dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Activity worker stopped; update dropped");
            }
        }
    }

    /// Waits until every update queued before this call has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(ActivityCommand::Flush(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Drains the queue and stops the worker.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(ActivityCommand::Shutdown).await;

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Session activity worker panicked");
            }
        }
    }

    /// Returns the number of updates accepted onto the queue.
    pub fn received(&self) -> u64 {
        self.stats.received.load(Ordering::Relaxed)
    }

    /// Returns the number of updates applied.
    pub fn applied(&self) -> u64 {
        self.stats.applied.load(Ordering::Relaxed)
    }

    /// Returns the number of updates dropped.
    pub fn dropped(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }

    /// Returns the number of updates that failed.
    pub fn failed(&self) -> u64 {
        self.stats.failed.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ActivityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityTracker")
            .field("received", &self.received())
            .field("applied", &self.applied())
            .field("dropped", &self.dropped())
            .field("failed", &self.failed())
            .finish()
    }
}
