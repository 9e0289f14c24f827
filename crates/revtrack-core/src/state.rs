//! Client revision state machine types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Phases of the client revision state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientPhase {
    /// Boot revision not resolved yet
    Uninitialized,
    /// Boot revision known, no answer from the authority yet
    BootResolved,
    /// Running the recommended revision, or none is known
    Idle,
    /// The authority recommends a different revision
    UpdateAvailable,
    /// The update command is running
    Updating,
}

impl fmt::Display for ClientPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClientPhase::Uninitialized => "uninitialized",
            ClientPhase::BootResolved => "boot_resolved",
            ClientPhase::Idle => "idle",
            ClientPhase::UpdateAvailable => "update_available",
            ClientPhase::Updating => "updating",
        };
        f.write_str(s)
    }
}

/// Boot, current and target revision of one running client
///
/// Invariants:
/// - `boot` is assigned at most once
/// - `current` changes only through [`RevisionState::finish_update`] with an
///   applied revision (or together with `boot` on first resolution)
#[derive(Debug, Clone, Default)]
pub struct RevisionState {
    boot: Option<String>,
    current: Option<String>,
    target: Option<String>,
    force_restart: bool,
    updating: bool,
    last_response_at: Option<DateTime<Utc>>,
}

impl RevisionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn boot_revision(&self) -> Option<&str> {
        self.boot.as_deref()
    }

    #[must_use]
    pub fn current_revision(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn target_revision(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Restart requested by the authority and not yet honoured
    #[must_use]
    pub fn force_restart(&self) -> bool {
        self.force_restart
    }

    #[must_use]
    pub fn last_response_at(&self) -> Option<DateTime<Utc>> {
        self.last_response_at
    }

    /// Record the boot revision; later calls keep the first value
    pub fn set_boot(&mut self, revision: String) -> &str {
        if self.boot.is_none() {
            if self.current.is_none() {
                self.current = Some(revision.clone());
            }
            self.boot = Some(revision);
        }
        self.boot.as_deref().unwrap_or_default()
    }

    /// Apply a well-formed answer from the authority
    ///
    /// A missing revision clears the target. The force-restart flag is
    /// sticky: it is only cleared by a successful update.
    pub fn record_response(&mut self, target: Option<String>, force_restart: bool) {
        self.target = target;
        if force_restart {
            self.force_restart = true;
        }
        self.last_response_at = Some(Utc::now());
    }

    /// A target is known and differs from the current revision
    #[must_use]
    pub fn update_available(&self) -> bool {
        match &self.target {
            Some(target) => self.current.as_deref() != Some(target.as_str()),
            None => false,
        }
    }

    /// The running code no longer matches the applied revision
    #[must_use]
    pub fn needs_restart(&self) -> bool {
        self.current != self.boot
    }

    pub fn begin_update(&mut self) {
        self.updating = true;
    }

    /// Leave the `Updating` phase
    ///
    /// `applied` is the revision the update command installed, or `None`
    /// when the command failed and `current` must stay untouched.
    pub fn finish_update(&mut self, applied: Option<String>) {
        self.updating = false;
        if let Some(revision) = applied {
            self.current = Some(revision);
            self.force_restart = false;
        }
    }

    #[must_use]
    pub fn phase(&self) -> ClientPhase {
        if self.updating {
            ClientPhase::Updating
        } else if self.boot.is_none() {
            ClientPhase::Uninitialized
        } else if self.update_available() {
            ClientPhase::UpdateAvailable
        } else if self.last_response_at.is_none() {
            ClientPhase::BootResolved
        } else {
            ClientPhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booted(revision: &str) -> RevisionState {
        let mut state = RevisionState::new();
        state.set_boot(revision.to_string());
        state
    }

    #[test]
    fn test_initial_phase() {
        let state = RevisionState::new();
        assert_eq!(state.phase(), ClientPhase::Uninitialized);
        assert!(!state.update_available());
        assert!(!state.needs_restart());
    }

    #[test]
    fn test_boot_set_once() {
        let mut state = booted("aaa");
        assert_eq!(state.set_boot("bbb".to_string()), "aaa");
        assert_eq!(state.boot_revision(), Some("aaa"));
        assert_eq!(state.current_revision(), Some("aaa"));
        assert_eq!(state.phase(), ClientPhase::BootResolved);
    }

    #[test]
    fn test_update_available() {
        let mut state = booted("aaa");

        state.record_response(None, false);
        assert!(!state.update_available());
        assert_eq!(state.phase(), ClientPhase::Idle);

        state.record_response(Some("aaa".to_string()), false);
        assert!(!state.update_available());

        state.record_response(Some("bbb".to_string()), false);
        assert!(state.update_available());
        assert_eq!(state.phase(), ClientPhase::UpdateAvailable);
    }

    #[test]
    fn test_missing_target_clears_previous() {
        let mut state = booted("aaa");
        state.record_response(Some("bbb".to_string()), false);
        state.record_response(None, false);

        assert_eq!(state.target_revision(), None);
        assert!(!state.update_available());
    }

    #[test]
    fn test_successful_update() {
        let mut state = booted("aaa");
        state.record_response(Some("bbb".to_string()), true);

        state.begin_update();
        assert_eq!(state.phase(), ClientPhase::Updating);
        state.finish_update(Some("bbb".to_string()));

        assert_eq!(state.current_revision(), Some("bbb"));
        assert_eq!(state.boot_revision(), Some("aaa"));
        assert!(state.needs_restart());
        assert!(!state.update_available());
        assert!(!state.force_restart());
        assert_eq!(state.phase(), ClientPhase::Idle);
    }

    #[test]
    fn test_failed_update_keeps_current() {
        let mut state = booted("aaa");
        state.record_response(Some("bbb".to_string()), true);

        state.begin_update();
        state.finish_update(None);

        assert_eq!(state.current_revision(), Some("aaa"));
        assert!(state.update_available());
        assert!(state.force_restart());
        assert!(!state.needs_restart());
    }

    #[test]
    fn test_force_restart_is_sticky() {
        let mut state = booted("aaa");
        state.record_response(Some("aaa".to_string()), true);
        state.record_response(Some("aaa".to_string()), false);

        assert!(state.force_restart());
    }
}
