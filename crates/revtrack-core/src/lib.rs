//! revtrack-core: Revision resolution and update orchestration
//!
//! Contains the hostname rule matcher used by the authority and the client
//! side state machine: boot revision lookup, the `ClientActor` driving the
//! phonehome cycle, the update executor and restart handling.

pub mod actor;
pub mod config;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod message;
pub mod restart;
pub mod revision;
pub mod state;
pub mod transport;
pub mod updater;

pub use actor::client::{ClientActor, ClientActorArgs};
pub use config::ClientConfig;
pub use error::CoreError;
pub use identity::{ClientIdentity, HostIdentity, StaticIdentity, SystemIdentity};
pub use matcher::{RevisionRule, RuleSet, resolve_revision};
pub use message::{
    ClientStatus, GetStatus, PhonehomeOutcome, ResolveBoot, RunUpdate, SendPhonehome, Start,
    UpdateOutcome, UpdateToRevision,
};
pub use restart::{ExitRestartHandler, LogRestartHandler, RestartHandler};
pub use revision::RevisionLookup;
pub use state::{ClientPhase, RevisionState};
pub use transport::PhonehomeTransport;
pub use updater::{BUNDLED_UPDATE_SCRIPT, UpdateExecutor};
