//! Planner session event loop.
//!
//! One tokio task owns every stateful component of a planning session and
//! is driven by [`SessionCommand`]s. Live subscriptions (plan, entitlement,
//! saved plans, identity) and commands are multiplexed in a single biased
//! `select!`, with snapshots polled first, so an edit always derives its
//! array from the newest snapshot this task has received. Edits are handled
//! one at a time, which is what makes the read-modify-write of each
//! sub-list safe within one session.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use carnival_shared::{FestivalId, PlanField, PlanTier, UserId};
use carnival_store::RealtimeStore;

use crate::checkout::CheckoutInitiator;
use crate::config::ClientConfig;
use crate::directory::PlanDirectory;
use crate::editors::{self, BudgetEditor, PackingEditor, ScheduleEditor};
use crate::entitlement::SubscriptionFlag;
use crate::error::{CheckoutError, EditError, SessionError};
use crate::events::{SessionCommand, SessionNotification, UserAlert};
use crate::identity::IdentitySession;
use crate::paths::AppPaths;
use crate::selector::ActivePlanSelector;
use crate::state::SessionView;
use crate::sync::{PendingWrite, PlanSnapshot, PlanSync};

/// Handles injected into a session.
pub struct SessionContext {
    pub identity: IdentitySession,
    pub store: Arc<dyn RealtimeStore>,
    pub checkout: Arc<CheckoutInitiator>,
    pub config: Arc<ClientConfig>,
}

/// Caller side of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    notifications: mpsc::UnboundedReceiver<SessionNotification>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn sender(&self) -> mpsc::Sender<SessionCommand> {
        self.commands.clone()
    }

    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Snapshot of the session state after every command sent before it.
    pub async fn inspect(&self) -> Result<SessionView, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Inspect(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn next_notification(&mut self) -> Option<SessionNotification> {
        self.notifications.recv().await
    }

    /// Notification already queued, without waiting.
    pub fn try_notification(&mut self) -> Option<SessionNotification> {
        self.notifications.try_recv().ok()
    }

    /// Stop the task and wait for it. Dropping the task's state closes every
    /// live subscription.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        // The task may already be gone; joining reports how it ended.
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        self.task.await?;
        Ok(())
    }
}

/// Spawn the planner session on the current tokio runtime.
pub fn spawn_session(ctx: SessionContext) -> SessionHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel::<SessionCommand>(ctx.config.command_buffer.max(1));
    let (notif_tx, notif_rx) = mpsc::unbounded_channel::<SessionNotification>();

    let paths = AppPaths::new(ctx.config.app_namespace.clone());
    let session = PlannerSession {
        identity: ctx.identity,
        uid: None,
        flag: SubscriptionFlag::new(ctx.store.clone(), paths.clone()),
        selector: ActivePlanSelector::new(ctx.store.clone(), paths.clone()),
        sync: PlanSync::new(ctx.store.clone(), paths.clone()),
        directory: PlanDirectory::new(ctx.store, paths),
        checkout: ctx.checkout,
        notif_tx,
    };

    let task = tokio::spawn(session.run(cmd_rx));
    SessionHandle {
        commands: cmd_tx,
        notifications: notif_rx,
        task,
    }
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

struct PlannerSession {
    identity: IdentitySession,
    uid: Option<UserId>,
    flag: SubscriptionFlag,
    selector: ActivePlanSelector,
    sync: PlanSync,
    directory: PlanDirectory,
    checkout: Arc<CheckoutInitiator>,
    notif_tx: mpsc::UnboundedSender<SessionNotification>,
}

impl PlannerSession {
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<SessionCommand>) {
        let mut identity_rx = self.identity.watch();
        let initial = identity_rx.borrow_and_update().clone();
        self.apply_identity(initial).await;

        info!("Planner session started");

        loop {
            tokio::select! {
                biased;

                // --- Plan snapshots ---
                Some(snapshot) = self.sync.next_snapshot(), if self.sync.is_subscribed() => {
                    self.on_plan_snapshot(snapshot);
                }

                // --- Entitlement ---
                Some(premium) = self.flag.next_value(), if self.flag.is_subscribed() => {
                    self.notify(SessionNotification::PremiumChanged(premium));
                }

                // --- Saved plans ---
                Some(plans) = self.directory.next_listing(), if self.directory.is_subscribed() => {
                    self.notify(SessionNotification::SavedPlansChanged(plans));
                }

                // --- Identity ---
                changed = identity_rx.changed() => {
                    if changed.is_err() {
                        warn!("Identity provider went away, stopping session");
                        break;
                    }
                    let uid = identity_rx.borrow_and_update().clone();
                    if uid != self.uid {
                        self.apply_identity(uid).await;
                    }
                }

                // --- Commands ---
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Shutdown) => {
                            info!("Session shutdown requested");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("Command channel closed, stopping session");
                            break;
                        }
                    }
                }
            }
        }

        debug!("Planner session stopped");
    }

    fn notify(&self, notification: SessionNotification) {
        // Nobody listening is fine; the session keeps running for Inspect.
        let _ = self.notif_tx.send(notification);
    }

    async fn apply_identity(&mut self, uid: Option<UserId>) {
        match &uid {
            Some(uid) => info!(uid = %uid, "Identity available"),
            None => info!("No identity"),
        }
        self.uid = uid.clone();

        self.flag.observe(uid.as_ref());
        self.directory.observe(uid.as_ref());

        if let Some(uid) = &uid {
            let outcome = self.selector.ensure_initialized(uid).await;
            debug!(?outcome, "Active plan checked after sign-in");
        }
        self.sync.observe(uid.as_ref(), self.selector.active());

        self.notify(SessionNotification::IdentityChanged(uid.clone()));
        if uid.is_none() {
            self.notify(SessionNotification::PremiumChanged(false));
            self.notify(SessionNotification::SavedPlansChanged(Vec::new()));
        }
    }

    fn on_plan_snapshot(&self, snapshot: PlanSnapshot) {
        let Some(key) = self.sync.key() else {
            return;
        };
        self.notify(SessionNotification::PlanUpdated {
            festival: key.festival.clone(),
            plan: snapshot.document().cloned(),
        });
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        if cmd.is_edit() {
            self.recover_plan().await;
        }
        match cmd {
            SessionCommand::SignIn => {
                if let Err(e) = self.identity.sign_in().await {
                    self.notify(SessionNotification::Alert(UserAlert::SignInFailed(
                        e.to_string(),
                    )));
                }
            }
            SessionCommand::SignOut => {
                // Failure is logged by the identity session; state is unchanged.
                let _ = self.identity.sign_out().await;
            }
            SessionCommand::Select { festival } => self.select(festival).await,
            SessionCommand::AddBudget(draft) => {
                let result = self
                    .signed_in()
                    .and_then(|_| editors::add::<BudgetEditor>(&self.sync, draft));
                self.finish_add(PlanField::Budget, result).await;
            }
            SessionCommand::RemoveBudget(id) => {
                let result = self
                    .signed_in()
                    .and_then(|_| editors::remove::<BudgetEditor>(&self.sync, &id));
                self.finish_write(PlanField::Budget, result).await;
            }
            SessionCommand::AddSchedule(draft) => {
                let result = self
                    .signed_in()
                    .and_then(|_| editors::add::<ScheduleEditor>(&self.sync, draft));
                self.finish_add(PlanField::Schedule, result).await;
            }
            SessionCommand::RemoveSchedule(id) => {
                let result = self
                    .signed_in()
                    .and_then(|_| editors::remove::<ScheduleEditor>(&self.sync, &id));
                self.finish_write(PlanField::Schedule, result).await;
            }
            SessionCommand::AddPacking(draft) => {
                let result = self
                    .signed_in()
                    .and_then(|_| editors::add::<PackingEditor>(&self.sync, draft));
                self.finish_add(PlanField::Packing, result).await;
            }
            SessionCommand::RemovePacking(id) => {
                let result = self
                    .signed_in()
                    .and_then(|_| editors::remove::<PackingEditor>(&self.sync, &id));
                self.finish_write(PlanField::Packing, result).await;
            }
            SessionCommand::TogglePacked(id) => {
                let result = self
                    .signed_in()
                    .and_then(|_| editors::toggle_packed(&self.sync, &id));
                self.finish_write(PlanField::Packing, result).await;
            }
            SessionCommand::StartCheckout(tier) => self.start_checkout(tier),
            SessionCommand::Inspect(reply) => {
                let _ = reply.send(self.view());
            }
            SessionCommand::Shutdown => {}
        }
    }

    /// Retry creating and watching the active plan when it never loaded,
    /// e.g. because the store was unreachable at selection time.
    async fn recover_plan(&mut self) {
        let Some(uid) = self.uid.clone() else {
            return;
        };
        if self.selector.active().is_none() || self.sync.current().is_some() {
            return;
        }

        let outcome = self.selector.ensure_initialized(&uid).await;
        debug!(?outcome, "Retrying plan load before edit");
        self.sync.observe(Some(&uid), self.selector.active());
        if let Some(snapshot) = self.sync.drain_ready() {
            self.on_plan_snapshot(snapshot);
        }
    }

    fn signed_in(&self) -> Result<(), EditError> {
        if self.uid.is_none() {
            self.notify(SessionNotification::Alert(UserAlert::SignInRequired));
            return Err(EditError::SignInRequired);
        }
        Ok(())
    }

    async fn select(&mut self, festival: FestivalId) {
        match self.selector.select(self.uid.as_ref(), &festival).await {
            Ok(outcome) => {
                debug!(festival = %festival, ?outcome, "Plan selected");
                self.sync.observe(self.uid.as_ref(), self.selector.active());
                self.notify(SessionNotification::ActivePlanChanged(festival));
            }
            Err(e) => {
                warn!(festival = %festival, error = %e, "Selection rejected");
                self.notify(SessionNotification::Alert(UserAlert::UnknownFestival(
                    festival.to_string(),
                )));
            }
        }
    }

    async fn finish_add(
        &self,
        field: PlanField,
        result: Result<(carnival_shared::ItemId, PendingWrite), EditError>,
    ) {
        let result = result.map(|(id, write)| {
            self.notify(SessionNotification::EntryAdded { field, id });
            write
        });
        self.finish_write(field, result).await;
    }

    /// Await the write of a completed edit. A failure leaves the mirror on
    /// the last confirmed snapshot.
    async fn finish_write(&self, field: PlanField, result: Result<PendingWrite, EditError>) {
        match result {
            Ok(write) => {
                if let Err(e) = write.await {
                    self.notify(SessionNotification::WriteFailed {
                        field,
                        error: e.to_string(),
                    });
                }
            }
            // Already surfaced as an alert.
            Err(EditError::SignInRequired) => {}
            Err(e) => {
                debug!(%field, error = %e, "Edit rejected");
                self.notify(SessionNotification::EditRejected {
                    field,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Runs off the loop so a slow callable never delays snapshots.
    fn start_checkout(&self, tier: PlanTier) {
        let checkout = self.checkout.clone();
        let uid = self.uid.clone();
        let notif_tx = self.notif_tx.clone();

        tokio::spawn(async move {
            let notification = match checkout.start_checkout(uid.as_ref(), tier).await {
                Ok(url) => SessionNotification::CheckoutRedirect { url },
                Err(CheckoutError::SignInRequired) => {
                    SessionNotification::Alert(UserAlert::SignInRequired)
                }
                Err(e) => SessionNotification::Alert(UserAlert::CheckoutFailed(e.to_string())),
            };
            let _ = notif_tx.send(notification);
        });
    }

    fn view(&self) -> SessionView {
        SessionView {
            identity: self.uid.clone(),
            premium: self.flag.is_premium(),
            active_plan: self.selector.active().cloned(),
            plan: self.sync.current().cloned(),
            saved_plans: self.directory.plans().to_vec(),
        }
    }
}
