//! Echo suppression and refresh policy between the editing surface and the
//! server copy.
//!
//! When the server pushes a tree into the editing surface, the surface
//! reports the change back through the same channel it uses for user edits.
//! Without a guard, that report would be relayed to the server as a new
//! edit, which pushes it again, and so on. [`EchoGuard`] breaks the loop: it
//! is armed right before a programmatic push and disarmed once the surface
//! has applied it. The guard is a single flag, not a counter, so a second
//! push while armed is refused and must be coalesced by the caller.

use crate::error::EngineError;

/// The two states of an [`EchoGuard`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoState {
    #[default]
    Idle,
    Suppressing,
}

/// Where a change notification from the editing surface came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// The echo of a programmatic push. Not relayed.
    Programmatic,
    /// A real user edit. Relayed to the server.
    User,
}

/// Session-owned echo-suppression flag.
///
/// Owned by the sync layer and handed to whatever performs the push; the
/// entity transitions never see it.
#[derive(Debug, Default)]
pub struct EchoGuard {
    state: EchoState,
}

impl EchoGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EchoState {
        self.state
    }

    pub fn is_suppressing(&self) -> bool {
        self.state == EchoState::Suppressing
    }

    /// Arm before a programmatic push.
    pub fn arm(&mut self) -> Result<(), EngineError> {
        if self.is_suppressing() {
            return Err(EngineError::AlreadySuppressing);
        }
        self.state = EchoState::Suppressing;
        Ok(())
    }

    /// Disarm once the surface has applied the push. Idempotent.
    pub fn disarm(&mut self) {
        self.state = EchoState::Idle;
    }

    /// Classify a change notification from the surface.
    ///
    /// While armed, the notification is the echo of the push: it is reported
    /// as [`ChangeOrigin::Programmatic`] and the guard disarms itself.
    pub fn on_surface_change(&mut self) -> ChangeOrigin {
        match self.state {
            EchoState::Suppressing => {
                self.state = EchoState::Idle;
                ChangeOrigin::Programmatic
            }
            EchoState::Idle => ChangeOrigin::User,
        }
    }
}

/// Why the server copy of a chapter changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCause {
    Revision,
    VersionSwitch,
    VersionCreated,
    VersionDeleted,
    ChangesConfirmed,
    ChangesDiscarded,
    EntityDeleted,
    EntityRestored,
    EntityReplaced,
    CandidateUpdated,
    ContentUpdated,
}

/// How the editing surface must catch up after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Replace the surface's tree wholesale (`force-refresh`).
    Full,
    /// Patch the surface's tree in place (`editor-content-update`).
    Incremental,
    /// The surface already shows the change.
    None,
}

impl SyncCause {
    pub fn refresh(self) -> RefreshKind {
        match self {
            SyncCause::Revision
            | SyncCause::VersionSwitch
            | SyncCause::VersionCreated
            | SyncCause::VersionDeleted
            | SyncCause::ChangesConfirmed
            | SyncCause::ChangesDiscarded => RefreshKind::Full,
            SyncCause::EntityDeleted
            | SyncCause::EntityRestored
            | SyncCause::EntityReplaced
            | SyncCause::CandidateUpdated => RefreshKind::Incremental,
            // the surface sent the content itself
            SyncCause::ContentUpdated => RefreshKind::None,
        }
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_edits_pass_while_idle() {
        let mut g = EchoGuard::new();
        assert_eq!(g.on_surface_change(), ChangeOrigin::User);
        assert_eq!(g.state(), EchoState::Idle);
    }

    #[test]
    fn echo_of_push_is_swallowed_once() {
        let mut g = EchoGuard::new();
        g.arm().unwrap();
        assert_eq!(g.on_surface_change(), ChangeOrigin::Programmatic);
        assert_eq!(g.on_surface_change(), ChangeOrigin::User);
    }

    #[test]
    fn nested_arm_is_refused() {
        let mut g = EchoGuard::new();
        g.arm().unwrap();
        assert_eq!(g.arm(), Err(EngineError::AlreadySuppressing));
        g.disarm();
        assert!(g.arm().is_ok());
    }

    #[test]
    fn refresh_policy() {
        assert_eq!(SyncCause::Revision.refresh(), RefreshKind::Full);
        assert_eq!(SyncCause::VersionSwitch.refresh(), RefreshKind::Full);
        assert_eq!(SyncCause::EntityReplaced.refresh(), RefreshKind::Incremental);
        assert_eq!(SyncCause::ContentUpdated.refresh(), RefreshKind::None);
    }
}
