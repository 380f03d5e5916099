//! Save status state machine.
//!
//! ```text
//!   idle|saved|error|saving ──edit──▶ pending ──debounce fires──▶ saving
//!   saving ──ok──▶ saved ──display delay──▶ idle
//!   saving ──fail──▶ error ──retry──▶ saving
//!   pending ──draft creation failed──▶ error
//! ```
//!
//! Every transition is a compare-and-set against [`DocumentState`], so the
//! status is never written outside this table.

use std::time::Duration;

use scribe_types::SaveStatus;
use tracing::debug;

use crate::debounce::Debouncer;
use crate::state::DocumentState;

/// Why a save is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// The debounce window closed after an edit.
    Debounce,
    /// The user asked to retry a failed save.
    Retry,
}

/// Whether the machine may move from `from` to `to`.
pub fn permits(from: SaveStatus, to: SaveStatus) -> bool {
    use SaveStatus::*;
    matches!(
        (from, to),
        (Idle | Saved | Error | Saving | Pending, Pending)
            | (Pending | Error, Saving)
            | (Saving, Saved)
            | (Saving | Pending, Error)
            | (Saved, Idle)
    )
}

pub struct SaveStatusMachine {
    state: DocumentState,
    fade: Debouncer,
}

impl SaveStatusMachine {
    pub fn new(state: DocumentState, saved_display: Duration) -> Self {
        Self {
            state,
            fade: Debouncer::new(saved_display),
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.state.save_status()
    }

    /// An edit happened. Always allowed; cancels a pending saved→idle fade.
    pub fn mark_pending(&self) -> bool {
        self.fade.cancel();
        self.apply(SaveStatus::Pending, |_| true)
    }

    /// A save is about to hit the network.
    pub fn begin_saving(&self, trigger: SaveTrigger) -> bool {
        let required = match trigger {
            SaveTrigger::Debounce => SaveStatus::Pending,
            SaveTrigger::Retry => SaveStatus::Error,
        };
        self.apply(SaveStatus::Saving, |from| from == required)
    }

    /// The in-flight save succeeded. Ignored if a newer edit already moved
    /// the status back to pending.
    pub fn mark_saved(&self) -> bool {
        if !self.apply(SaveStatus::Saved, |from| from == SaveStatus::Saving) {
            return false;
        }
        let state = self.state.clone();
        self.fade.schedule(move || async move {
            let _ = state.transition_status(SaveStatus::Idle, |from| from == SaveStatus::Saved);
        });
        true
    }

    /// The in-flight save failed. Ignored if a newer edit superseded it; the
    /// next save carries the full current state anyway.
    pub fn mark_failed(&self) -> bool {
        self.apply(SaveStatus::Error, |from| from == SaveStatus::Saving)
    }

    /// No identity could be created for the pending edit.
    pub fn mark_provision_failed(&self) -> bool {
        self.apply(SaveStatus::Error, |from| from == SaveStatus::Pending)
    }

    /// Forget any scheduled fade; used when the session switches document.
    pub fn reset(&self) {
        self.fade.cancel();
    }

    fn apply(&self, to: SaveStatus, guard: impl FnOnce(SaveStatus) -> bool) -> bool {
        match self
            .state
            .transition_status(to, |from| permits(from, to) && guard(from))
        {
            Ok(from) => {
                if from != to {
                    debug!(%from, %to, "save status");
                }
                true
            }
            Err(current) => {
                debug!(%current, requested = %to, "save status transition refused");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;
    use SaveStatus::*;

    const DISPLAY: Duration = Duration::from_secs(3);

    fn machine() -> (DocumentState, SaveStatusMachine) {
        let state = DocumentState::new();
        let machine = SaveStatusMachine::new(state.clone(), DISPLAY);
        (state, machine)
    }

    #[test]
    fn saving_is_never_entered_straight_from_idle_or_saved() {
        assert!(!permits(Idle, Saving));
        assert!(!permits(Saved, Saving));
        assert!(permits(Pending, Saving));
        // only an explicit retry leaves error for saving
        assert!(permits(Error, Saving));
    }

    #[test]
    fn every_resting_state_accepts_an_edit() {
        for from in [Idle, Pending, Saving, Saved, Error] {
            assert!(permits(from, Pending), "{from} -> pending");
        }
        assert!(!permits(Idle, Saved));
        assert!(!permits(Pending, Saved));
        assert!(!permits(Idle, Error));
        assert!(!permits(Pending, Idle));
    }

    #[tokio::test]
    async fn debounce_trigger_requires_pending() {
        let (_state, m) = machine();
        assert!(!m.begin_saving(SaveTrigger::Debounce));
        assert!(m.mark_pending());
        assert!(!m.begin_saving(SaveTrigger::Retry));
        assert!(m.begin_saving(SaveTrigger::Debounce));
        assert_eq!(m.status(), Saving);
    }

    #[tokio::test]
    async fn error_then_edit_goes_back_to_pending() {
        let (_state, m) = machine();
        m.mark_pending();
        m.begin_saving(SaveTrigger::Debounce);
        assert!(m.mark_failed());
        assert_eq!(m.status(), Error);

        assert!(m.mark_pending());
        assert_eq!(m.status(), Pending);
    }

    #[tokio::test]
    async fn superseded_save_outcome_is_ignored() {
        let (_state, m) = machine();
        m.mark_pending();
        m.begin_saving(SaveTrigger::Debounce);
        m.mark_pending();

        assert!(!m.mark_saved());
        assert!(!m.mark_failed());
        assert_eq!(m.status(), Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn saved_fades_to_idle_after_display_delay() {
        let (_state, m) = machine();
        m.mark_pending();
        m.begin_saving(SaveTrigger::Debounce);
        m.mark_saved();

        sleep(DISPLAY - Duration::from_millis(1)).await;
        assert_eq!(m.status(), Saved);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(m.status(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn edit_during_saved_display_cancels_the_fade() {
        let (_state, m) = machine();
        m.mark_pending();
        m.begin_saving(SaveTrigger::Debounce);
        m.mark_saved();

        sleep(Duration::from_secs(1)).await;
        m.mark_pending();

        sleep(DISPLAY).await;
        assert_eq!(m.status(), Pending);
    }

    #[tokio::test]
    async fn provisioning_failure_only_applies_to_pending_edits() {
        let (_state, m) = machine();
        assert!(!m.mark_provision_failed());
        m.mark_pending();
        assert!(m.mark_provision_failed());
        assert_eq!(m.status(), Error);
        assert!(m.begin_saving(SaveTrigger::Retry));
    }
}
