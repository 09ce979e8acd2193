//! Application lifecycle tracking.
//!
//! The host reports `active | inactive | background` phase changes. Only
//! leaving `active` matters to the lock: that is when an unlocked app
//! re-locks. Coming back to `active` never unlocks anything.
//!
//! Host events reach the lock through one ordered queue
//! ([`lifecycle_channel`]). A single [`LifecycleWorker`] applies them in the
//! order they were sent, so a focus-lost/focus-gained pair can never be
//! applied backwards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::lock::LockStateMachine;
use crate::security::LockPhase;

/// Host application phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppPhase {
    /// In the foreground and receiving input.
    Active,
    /// Visible but not receiving input (app switcher, incoming call).
    Inactive,
    /// Not visible.
    Background,
}

impl AppPhase {
    /// Whether the app is in the foreground.
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Edge produced by a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTransition {
    /// `active` to `inactive` or `background`.
    LeftForeground,
    /// Back to `active`.
    EnteredForeground,
    /// Same phase again, or `inactive` <-> `background`.
    None,
}

/// Remembers the last phase seen so repeated events are no-ops.
#[derive(Debug, Clone)]
pub struct LifecycleTracker {
    current: AppPhase,
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new(AppPhase::Active)
    }
}

impl LifecycleTracker {
    /// Tracker starting in `initial`.
    pub fn new(initial: AppPhase) -> Self {
        Self { current: initial }
    }

    /// Last phase seen.
    pub fn current(&self) -> AppPhase {
        self.current
    }

    /// Record `next` and report the edge it forms with the previous phase.
    pub fn advance(&mut self, next: AppPhase) -> PhaseTransition {
        let previous = std::mem::replace(&mut self.current, next);
        match (previous.is_active(), next.is_active()) {
            (true, false) => PhaseTransition::LeftForeground,
            (false, true) => PhaseTransition::EnteredForeground,
            _ => PhaseTransition::None,
        }
    }
}

/// Phase for a window focus change. Losing focus is `inactive`.
pub fn focus_phase(focused: bool) -> AppPhase {
    if focused {
        AppPhase::Active
    } else {
        AppPhase::Inactive
    }
}

// ============================================================================
// ORDERED EVENT QUEUE
// ============================================================================

struct PhaseReport {
    phase: AppPhase,
    reply: Option<oneshot::Sender<LockPhase>>,
}

/// Sending half of the lifecycle queue. Clones share the same queue.
#[derive(Clone)]
pub struct LifecycleFeed {
    tx: mpsc::UnboundedSender<PhaseReport>,
}

/// Receiving half of the lifecycle queue.
pub struct LifecycleWorker {
    rx: mpsc::UnboundedReceiver<PhaseReport>,
}

/// New lifecycle queue.
pub fn lifecycle_channel() -> (LifecycleFeed, LifecycleWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LifecycleFeed { tx }, LifecycleWorker { rx })
}

impl LifecycleFeed {
    /// Queue `phase` without waiting. Returns `false` once the worker is gone.
    pub fn report(&self, phase: AppPhase) -> bool {
        self.tx.send(PhaseReport { phase, reply: None }).is_ok()
    }

    /// Queue a window focus change.
    pub fn report_focus(&self, focused: bool) -> bool {
        self.report(focus_phase(focused))
    }

    /// Queue `phase` and wait for the lock phase it produced. `None` if the
    /// worker is gone.
    pub async fn submit(&self, phase: AppPhase) -> Option<LockPhase> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PhaseReport {
                phase,
                reply: Some(reply),
            })
            .ok()?;
        rx.await.ok()
    }
}

impl LifecycleWorker {
    /// Apply queued reports to `lock` one at a time until every feed is
    /// dropped.
    pub async fn run(mut self, lock: Arc<LockStateMachine>) {
        while let Some(report) = self.rx.recv().await {
            let phase = lock.handle_lifecycle(report.phase).await;
            if let Some(reply) = report.reply {
                let _ = reply.send(phase);
            }
        }
        tracing::debug!("Lifecycle queue closed");
    }
}
