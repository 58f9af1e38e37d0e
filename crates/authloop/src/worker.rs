//! Auth worker: an isolated Tokio task that owns one session snapshot.
//!
//! The worker is an actor. Everything that touches the session goes
//! through its command queue, one command at a time:
//!
//! ```text
//! AuthHandle ──┐
//! bus forwarders ──┤                        ┌─► endpoint.call()  ─┐
//! request tasks ──┼─► mpsc ─► AuthWorker ─┼─► bus.publish()      │
//! settle timers ──┘            ▲    │       └─► store.save()      │
//!                             │    └── check timer (every 30 s)  │
//!                             └──────── completions ─────────────┘
//! ```
//!
//! Requests, store writes and settle timers run as spawned tasks holding a
//! *weak* sender. Their completions re-enter the queue as ordinary
//! actions; if the worker is gone by then, they are dropped.

use std::sync::Arc;
use std::time::Duration;

use authloop_protocol::{AuthInfo, AuthRequest, LogoffRequest, LogonForm, LogonRequest, UserId, topics};
use authloop_session::{
    Action, AuthFailure, Effect, ModelConfig, Publication, SessionSnapshot, dispatch,
};
use authloop_tick::CheckTimer;
use authloop_transport::{AuthEndpoint, IdentityStore, MessageBus};
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

use crate::inbound::translate;
use crate::{AuthloopError, WorkerConfig};

/// Commands sent to the worker through its channel.
pub(crate) enum WorkerCommand {
    /// Read the remembered identity, then dispatch [`Action::Start`].
    Start,

    /// Fold an action into the session.
    Action(Action),

    /// Request a copy of the current snapshot.
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },

    /// Stop the worker.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running auth worker.
///
/// Cheap to clone. The worker stops when [`shutdown`](Self::shutdown) is
/// called or the last handle is dropped.
#[derive(Clone)]
pub struct AuthHandle {
    sender: mpsc::Sender<WorkerCommand>,
}

impl AuthHandle {
    async fn send(&self, cmd: WorkerCommand) -> Result<(), AuthloopError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| AuthloopError::Unavailable)
    }

    /// Dispatches any action.
    pub async fn dispatch(&self, action: Action) -> Result<(), AuthloopError> {
        self.send(WorkerCommand::Action(action)).await
    }

    /// Boots the session: reads the remembered identity, subscribes to the
    /// inbound topics and sends the first status probe.
    pub async fn start(&self) -> Result<(), AuthloopError> {
        self.send(WorkerCommand::Start).await
    }

    pub async fn set_user_id(&self, user_id: Option<UserId>) -> Result<(), AuthloopError> {
        self.dispatch(Action::SetUserId(user_id)).await
    }

    pub async fn sync(&self, auth: AuthInfo) -> Result<(), AuthloopError> {
        self.dispatch(Action::Sync(auth)).await
    }

    pub async fn logon(&self, request: LogonRequest) -> Result<(), AuthloopError> {
        self.dispatch(Action::Logon(request)).await
    }

    pub async fn logon_form(&self, form: LogonForm) -> Result<(), AuthloopError> {
        self.dispatch(Action::LogonForm(form)).await
    }

    pub async fn logoff(&self, request: LogoffRequest) -> Result<(), AuthloopError> {
        self.dispatch(Action::Logoff(request)).await
    }

    /// Marks the user as active; the next periodic check refreshes the
    /// server session.
    pub async fn keep_alive(&self) -> Result<(), AuthloopError> {
        self.dispatch(Action::KeepAlive).await
    }

    /// Runs a periodic check now, without waiting for the timer.
    pub async fn auth_check(&self) -> Result<(), AuthloopError> {
        self.dispatch(Action::AuthCheck).await
    }

    /// Returns a copy of the session as of every command sent before this
    /// call.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, AuthloopError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkerCommand::Snapshot { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| AuthloopError::Unavailable)
    }

    /// Tells the worker to stop.
    pub async fn shutdown(&self) -> Result<(), AuthloopError> {
        self.send(WorkerCommand::Shutdown).await
    }

    /// Returns `true` once the worker has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and spawning an auth worker.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use authloop::prelude::*;
///
/// # async fn run() -> Result<(), AuthloopError> {
/// let endpoint = HttpEndpoint::new(HttpEndpointConfig::new("https://example.com/zotonic-auth"))?;
/// let bus = Arc::new(LocalBus::default());
///
/// let auth = AuthWorkerBuilder::new()
///     .settle_delay(std::time::Duration::from_millis(50))
///     .spawn(endpoint, bus, MemoryStore::default());
/// auth.start().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthWorkerBuilder {
    config: WorkerConfig,
}

impl AuthWorkerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Time between periodic checks. Zero disables them.
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.config.check_interval = interval;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    pub fn channel_size(mut self, size: usize) -> Self {
        self.config.channel_size = size;
        self
    }

    pub fn initial_jitter(mut self, jitter: Duration) -> Self {
        self.config.initial_jitter = jitter;
        self
    }

    /// Spawns the worker task and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime. The session stays in
    /// `start` until [`AuthHandle::start`] is called.
    pub fn spawn<E, B, S>(self, endpoint: E, bus: Arc<B>, store: S) -> AuthHandle
    where
        E: AuthEndpoint,
        B: MessageBus,
        S: IdentityStore,
    {
        let config = self.config.validated();
        let (tx, rx) = mpsc::channel(config.channel_size);

        let worker = AuthWorker {
            snapshot: SessionSnapshot::new(),
            model: config.model(),
            timer: CheckTimer::new(config.timer()),
            endpoint: Arc::new(endpoint),
            bus,
            store: Arc::new(store),
            receiver: rx,
            loopback: tx.downgrade(),
            forwarders: Vec::new(),
        };

        tokio::spawn(worker.run());

        AuthHandle { sender: tx }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// The internal worker state. Runs inside a Tokio task.
struct AuthWorker<E, B, S> {
    snapshot: SessionSnapshot,
    model: ModelConfig,
    timer: CheckTimer,
    endpoint: Arc<E>,
    bus: Arc<B>,
    store: Arc<S>,
    receiver: mpsc::Receiver<WorkerCommand>,
    /// Handed to spawned tasks so completions can come back.
    loopback: mpsc::WeakSender<WorkerCommand>,
    /// Bus subscription forwarders, aborted when the worker stops.
    forwarders: Vec<AbortHandle>,
}

impl<E, B, S> AuthWorker<E, B, S>
where
    E: AuthEndpoint,
    B: MessageBus,
    S: IdentityStore,
{
    /// Processes commands and timer ticks until shutdown.
    async fn run(mut self) {
        info!("auth worker started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(WorkerCommand::Start) => {
                        let remembered = self.load_remembered().await;
                        self.apply(Action::Start { remembered });
                    }
                    Some(WorkerCommand::Action(action)) => self.apply(action),
                    Some(WorkerCommand::Snapshot { reply }) => {
                        let _ = reply.send(self.snapshot.clone());
                    }
                    Some(WorkerCommand::Shutdown) => {
                        info!("auth worker shutting down");
                        break;
                    }
                    None => {
                        debug!("all auth handles dropped");
                        break;
                    }
                },
                tick = self.timer.wait_for_tick() => {
                    trace!(tick = tick.tick, "periodic auth check");
                    self.apply(Action::AuthCheck);
                }
            }
        }

        for forwarder in &self.forwarders {
            forwarder.abort();
        }
        info!(status = %self.snapshot.status(), "auth worker stopped");
    }

    async fn load_remembered(&self) -> Option<UserId> {
        match self.store.load().await {
            Ok(user_id) => user_id,
            Err(e) => {
                warn!(error = %e, "could not read remembered identity");
                None
            }
        }
    }

    fn apply(&mut self, action: Action) {
        let effects = dispatch(&mut self.snapshot, action, &self.model);
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Subscribe => self.subscribe(),
            Effect::Request(request) => self.spawn_request(request),
            Effect::Publish(publication) => self.publish(&publication),
            Effect::RememberUserId(user_id) => self.spawn_remember(user_id),
            Effect::ScheduleSettle(delay) => self.spawn_settle(delay),
        }
    }

    fn subscribe(&mut self) {
        for topic in topics::INBOUND {
            let mut subscription = self.bus.subscribe(topic);
            let loopback = self.loopback.clone();
            let task = tokio::spawn(async move {
                while let Some(message) = subscription.recv().await {
                    match translate(&message) {
                        Ok(Some(action)) => {
                            if !feed(&loopback, action).await {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(topic = %message.topic, error = %e, "dropping malformed bus message");
                        }
                    }
                }
            });
            self.forwarders.push(task.abort_handle());
        }
        debug!(topics = topics::INBOUND.len(), "subscribed to inbound topics");
    }

    fn spawn_request(&self, request: AuthRequest) {
        let endpoint = Arc::clone(&self.endpoint);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let command = request.command();
            debug!(%command, "auth request sent");
            let action = match endpoint.call(&request).await {
                Ok(response) => Action::AuthResponse { command, response },
                Err(e) => {
                    warn!(%command, error = %e, "auth request failed");
                    Action::AuthError {
                        command,
                        failure: AuthFailure::transport(e.to_string()),
                    }
                }
            };
            feed(&loopback, action).await;
        });
    }

    fn publish(&self, publication: &Publication) {
        match publication.to_message() {
            Ok(message) => {
                let receivers = self.bus.publish(message);
                trace!(topic = publication.topic(), receivers, "published");
            }
            Err(e) => warn!(topic = publication.topic(), error = %e, "could not encode publication"),
        }
    }

    fn spawn_remember(&self, user_id: Option<UserId>) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.save(user_id).await {
                warn!(?user_id, error = %e, "could not remember identity");
            }
        });
    }

    fn spawn_settle(&self, delay: Duration) {
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            feed(&loopback, Action::AuthChanged).await;
        });
    }
}

/// Sends `action` back to the worker. Returns `false` if it is gone.
async fn feed(loopback: &mpsc::WeakSender<WorkerCommand>, action: Action) -> bool {
    let Some(sender) = loopback.upgrade() else {
        return false;
    };
    sender.send(WorkerCommand::Action(action)).await.is_ok()
}
