//! Message types for the client actor
//!
//! Message handlers are implemented in `actor::client`.

use chrono::{DateTime, Utc};
use kameo_macros::Reply;
use serde::Serialize;

use crate::state::ClientPhase;

/// Resolve the boot revision, then start the scheduled phonehome chain
///
/// Replies with the boot lookup outcome. The first report is sent even when
/// the lookup fails. Repeated `Start` messages do not start a second chain.
#[derive(Debug)]
pub struct Start;

/// Resolve the boot revision (cached after the first success)
#[derive(Debug)]
pub struct ResolveBoot;

/// Send a single report outside the schedule
#[derive(Debug)]
pub struct SendPhonehome;

/// Scheduled report; reschedules itself when an interval is configured
#[derive(Debug)]
pub struct ScheduledPhonehome;

/// Apply the available update
#[derive(Debug)]
pub struct RunUpdate;

/// Apply an explicit revision
#[derive(Debug)]
pub struct UpdateToRevision {
    /// Revision to apply
    pub revision: String,
}

/// Get full client status
#[derive(Debug)]
pub struct GetStatus;

/// Outcome of one phonehome exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhonehomeOutcome {
    /// Revision recommended by the authority, if any rule matched
    pub target_revision: Option<String>,
    /// Update applied as a result of this exchange
    pub update: Option<UpdateOutcome>,
}

/// Outcome of an applied update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// Revision now applied
    pub revision: String,
    /// Whether the restart handler was invoked
    pub restart_invoked: bool,
    /// Whether the running code differs from the applied revision
    pub needs_restart: bool,
}

/// Client status response
#[derive(Debug, Clone, Serialize, Reply)]
pub struct ClientStatus {
    /// Package name
    pub package_name: String,
    /// Current phase
    pub phase: ClientPhase,
    /// Revision the process started with
    pub boot_revision: Option<String>,
    /// Revision applied on disk
    pub current_revision: Option<String>,
    /// Revision recommended by the authority
    pub target_revision: Option<String>,
    /// Target known and different from current
    pub update_available: bool,
    /// Current differs from boot
    pub needs_restart: bool,
    /// Sticky restart request from the authority
    pub force_restart: bool,
    /// Time of the last well-formed response
    pub last_response_at: Option<DateTime<Utc>>,
}
