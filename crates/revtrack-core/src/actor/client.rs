//! `ClientActor`: Per-process revision tracking
//!
//! Owns the revision state of one running client and serializes every
//! operation on it: boot lookup, phonehome exchanges, update application and
//! restart. The actor mailbox guarantees that no two of these overlap, and the
//! scheduled chain only queues its next report after the previous one has
//! finished.

use std::sync::Arc;
use std::time::Duration;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tracing::{debug, error, info, warn};

use revtrack_api::PhonehomeRequest;
use revtrack_exec::{CommandRunner, CommandSpec};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::identity::{ClientIdentity, HostIdentity};
use crate::message::{
    ClientStatus, GetStatus, PhonehomeOutcome, ResolveBoot, RunUpdate, ScheduledPhonehome,
    SendPhonehome, Start, UpdateOutcome, UpdateToRevision,
};
use crate::restart::RestartHandler;
use crate::revision::RevisionLookup;
use crate::state::{ClientPhase, RevisionState};
use crate::transport::PhonehomeTransport;
use crate::updater::UpdateExecutor;

/// Arguments for spawning a `ClientActor`
pub struct ClientActorArgs {
    /// Client configuration
    pub config: ClientConfig,
    /// Runs the revision lookup and update commands
    pub runner: Arc<dyn CommandRunner>,
    /// Delivers reports to the authority
    pub transport: Arc<dyn PhonehomeTransport>,
    /// Invoked after an update when a restart is due
    pub restart_handler: Arc<dyn RestartHandler>,
    /// Hostname and address source
    pub identity: Arc<dyn HostIdentity>,
}

/// Actor driving the client revision state machine
pub struct ClientActor {
    /// Client configuration
    config: ClientConfig,
    /// Boot/current/target revisions
    state: RevisionState,
    /// Boot revision lookup
    lookup: RevisionLookup,
    /// Update script runner
    updater: UpdateExecutor,
    /// Phonehome transport
    transport: Arc<dyn PhonehomeTransport>,
    /// Restart handler
    restart_handler: Arc<dyn RestartHandler>,
    /// Hostname and address source
    identity: Arc<dyn HostIdentity>,
    /// Used to queue scheduled reports to ourselves
    self_ref: WeakActorRef<Self>,
    /// Whether the scheduled chain has been started
    started: bool,
}

impl ClientActor {
    /// Get current phase
    #[must_use]
    pub fn phase(&self) -> ClientPhase {
        self.state.phase()
    }

    fn log_transition(&self, from: ClientPhase) {
        let to = self.state.phase();
        if from != to {
            info!(
                package = %self.config.package_name,
                from = %from,
                to = %to,
                "state transition"
            );
        }
    }

    async fn resolve_boot(&mut self) -> Result<String, CoreError> {
        if let Some(boot) = self.state.boot_revision() {
            return Ok(boot.to_string());
        }

        let from = self.state.phase();
        match self.lookup.lookup().await {
            Ok(revision) => {
                let boot = self.state.set_boot(revision).to_string();
                info!(package = %self.config.package_name, revision = %boot, "boot revision resolved");
                self.log_transition(from);
                Ok(boot)
            }
            Err(e) => {
                error!(
                    package = %self.config.package_name,
                    error = %e,
                    "failed to resolve boot revision"
                );
                Err(e)
            }
        }
    }

    fn build_report(&self) -> PhonehomeRequest {
        let identity = ClientIdentity::capture(&self.config.package_name, self.identity.as_ref());
        PhonehomeRequest::new(identity.package_name, identity.hostname)
            .with_git_hash(self.state.current_revision().map(ToString::to_string))
            .with_ip_list(identity.ip_list)
    }

    async fn phonehome(&mut self) -> Result<PhonehomeOutcome, CoreError> {
        let report = self.build_report();
        debug!(
            package = %report.package_name,
            hostname = %report.hostname,
            revision = ?report.git_hash,
            "sending phonehome"
        );

        let response = match self.transport.send(&report).await {
            Ok(response) => response,
            Err(e) => {
                error!(package = %self.config.package_name, error = %e, "phonehome failed");
                return Err(e);
            }
        };

        let from = self.state.phase();
        self.state
            .record_response(response.git_hash.clone(), response.force_restart);
        self.log_transition(from);

        let mut outcome = PhonehomeOutcome {
            target_revision: response.git_hash,
            update: None,
        };

        if self.state.update_available() && (self.config.auto_update || response.force_update) {
            if let Some(target) = self.state.target_revision().map(ToString::to_string) {
                outcome.update = Some(self.apply_update(target).await?);
            }
        }

        Ok(outcome)
    }

    async fn apply_update(&mut self, revision: String) -> Result<UpdateOutcome, CoreError> {
        let Some(reference) = self.state.boot_revision().map(ToString::to_string) else {
            error!(
                package = %self.config.package_name,
                revision = %revision,
                "cannot update before the boot revision is known"
            );
            return Err(CoreError::RevisionLookupFailure(
                "boot revision not resolved".to_string(),
            ));
        };

        let from = self.state.phase();
        self.state.begin_update();
        self.log_transition(from);

        let restart = self.config.auto_restart || self.state.force_restart();

        match self.updater.apply(&revision, &reference).await {
            Ok(_) => {
                let from = self.state.phase();
                self.state.finish_update(Some(revision.clone()));
                self.log_transition(from);
                info!(
                    package = %self.config.package_name,
                    revision = %revision,
                    restart,
                    "update applied"
                );

                if restart {
                    self.restart_handler.restart().await.map_err(|e| {
                        error!(error = %e, "restart handler failed");
                        e
                    })?;
                }

                Ok(UpdateOutcome {
                    revision,
                    restart_invoked: restart,
                    needs_restart: self.state.needs_restart(),
                })
            }
            Err(e) => {
                let from = self.state.phase();
                self.state.finish_update(None);
                self.log_transition(from);
                error!(
                    package = %self.config.package_name,
                    revision = %revision,
                    error = %e,
                    "update failed"
                );
                Err(e)
            }
        }
    }

    /// Queue a `ScheduledPhonehome` to ourselves after `delay`
    fn schedule_phonehome(&self, delay: Duration) {
        let actor = self.self_ref.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(actor) = actor.upgrade() {
                if let Err(e) = actor.tell(ScheduledPhonehome).await {
                    warn!(error = ?e, "failed to queue scheduled phonehome");
                }
            }
        });
    }
}

impl Actor for ClientActor {
    type Args = ClientActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(
            package = %args.config.package_name,
            id = %actor_ref.id(),
            "ClientActor starting"
        );

        let lookup_command = CommandSpec::from_argv(&args.config.revision_command)
            .map_err(|e| CoreError::ConfigError(e.to_string()))?
            .current_dir(&args.config.repo_dir);
        let lookup = RevisionLookup::new(args.runner.clone(), lookup_command);
        let updater = UpdateExecutor::new(
            args.runner,
            args.config.update_script(),
            args.config.repo_dir.clone(),
        );

        Ok(Self {
            config: args.config,
            state: RevisionState::new(),
            lookup,
            updater,
            transport: args.transport,
            restart_handler: args.restart_handler,
            identity: args.identity,
            self_ref: actor_ref.downgrade(),
            started: false,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(
            package = %self.config.package_name,
            reason = ?reason,
            "ClientActor stopping"
        );
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<Start> for ClientActor {
    type Reply = Result<String, CoreError>;

    async fn handle(&mut self, _msg: Start, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.resolve_boot().await;

        if !self.started {
            self.started = true;
            self.schedule_phonehome(Duration::ZERO);
        }

        result
    }
}

impl Message<ResolveBoot> for ClientActor {
    type Reply = Result<String, CoreError>;

    async fn handle(
        &mut self,
        _msg: ResolveBoot,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.resolve_boot().await
    }
}

impl Message<SendPhonehome> for ClientActor {
    type Reply = Result<PhonehomeOutcome, CoreError>;

    async fn handle(
        &mut self,
        _msg: SendPhonehome,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.phonehome().await
    }
}

impl Message<ScheduledPhonehome> for ClientActor {
    type Reply = ();

    async fn handle(
        &mut self,
        _msg: ScheduledPhonehome,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        // Failures are already logged; the next iteration is the retry.
        let _ = self.phonehome().await;

        if let Some(interval) = self.config.interval() {
            debug!(interval = ?interval, "scheduling next phonehome");
            self.schedule_phonehome(interval);
        }
    }
}

impl Message<RunUpdate> for ClientActor {
    type Reply = Result<UpdateOutcome, CoreError>;

    async fn handle(
        &mut self,
        _msg: RunUpdate,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if !self.state.update_available() {
            debug!(package = %self.config.package_name, "no update available");
            return Err(CoreError::NoUpdateAvailable);
        }

        match self.state.target_revision().map(ToString::to_string) {
            Some(target) => self.apply_update(target).await,
            None => Err(CoreError::NoUpdateAvailable),
        }
    }
}

impl Message<UpdateToRevision> for ClientActor {
    type Reply = Result<UpdateOutcome, CoreError>;

    async fn handle(
        &mut self,
        msg: UpdateToRevision,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.apply_update(msg.revision).await
    }
}

impl Message<GetStatus> for ClientActor {
    type Reply = ClientStatus;

    async fn handle(
        &mut self,
        _msg: GetStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        ClientStatus {
            package_name: self.config.package_name.clone(),
            phase: self.state.phase(),
            boot_revision: self.state.boot_revision().map(ToString::to_string),
            current_revision: self.state.current_revision().map(ToString::to_string),
            target_revision: self.state.target_revision().map(ToString::to_string),
            update_available: self.state.update_available(),
            needs_restart: self.state.needs_restart(),
            force_restart: self.state.force_restart(),
            last_response_at: self.state.last_response_at(),
        }
    }
}
