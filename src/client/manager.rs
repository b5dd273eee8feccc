// ABOUTME: Supplies sessions to senders according to the configured strategy
// ABOUTME: Serializes binds, heals broken sessions and tears everything down on clean

use super::config::Timeouts;
use super::error::{MessagingError, SmppError};
use super::keepalive;
use super::session::{Session, SessionState};
use super::strategy::SessionStrategy;
use super::types::BindCredentials;
use crate::retry::{RetryError, RetryExecutor};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owns the long-lived session (if any) and every task working on it
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    address: String,
    credentials: BindCredentials,
    timeouts: Timeouts,
    strategy: SessionStrategy,
    connect: RetryExecutor,
    /// The shared session for keep-alive and reuse strategies
    current: tokio::sync::Mutex<Option<Arc<Session>>>,
    /// Sessions bound by the always-new strategy that are still in use
    transient: Mutex<HashMap<u64, Arc<Session>>>,
    reconnecting: AtomicBool,
    closed: AtomicBool,
    next_id: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        address: impl Into<String>,
        credentials: BindCredentials,
        timeouts: Timeouts,
        strategy: SessionStrategy,
        connect: RetryExecutor,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                address: address.into(),
                credentials,
                timeouts,
                strategy,
                connect,
                current: tokio::sync::Mutex::new(None),
                transient: Mutex::new(HashMap::new()),
                reconnecting: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn strategy(&self) -> &SessionStrategy {
        &self.inner.strategy
    }

    /// Binds immediately when the keep-alive strategy asks for it. A failure
    /// is logged and the bind is attempted again on the first send.
    pub async fn start(&self) {
        if let SessionStrategy::KeepAlive(config) = &self.inner.strategy {
            if config.connect_at_startup {
                if let Err(e) = self.acquire().await {
                    warn!(error = %e, "connection at startup failed, will retry on first send");
                }
            }
        }
    }

    /// Returns a bound session ready for submitting
    pub async fn acquire(&self) -> Result<Arc<Session>, MessagingError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(MessagingError::Closed);
        }

        match &self.inner.strategy {
            SessionStrategy::AlwaysNew => {
                let session = self.inner.connect().await.map_err(MessagingError::Connection)?;
                self.inner
                    .transient_sessions()
                    .insert(session.id(), Arc::clone(&session));
                Ok(session)
            }
            SessionStrategy::KeepAlive(_) => {
                let mut current = self.inner.current.lock().await;
                if let Some(session) = current.as_ref().filter(|s| s.state().is_usable()) {
                    return Ok(Arc::clone(session));
                }
                let session = Inner::replace(&self.inner, &mut current).await?;
                Ok(session)
            }
            SessionStrategy::ReuseSession(config) => {
                let mut current = self.inner.current.lock().await;
                if let Some(session) = current.as_ref().filter(|s| s.state().is_usable()) {
                    if session.idle_for() < config.last_interaction_expiration {
                        return Ok(Arc::clone(session));
                    }
                    match session.enquire_link(config.probe_timeout).await {
                        Ok(()) => {
                            debug!(session_id = session.id(), "idle session still alive");
                            return Ok(Arc::clone(session));
                        }
                        Err(e) => {
                            info!(session_id = session.id(), error = %e, "idle session is broken, rebinding");
                        }
                    }
                }
                let session = Inner::replace(&self.inner, &mut current).await?;
                Ok(session)
            }
        }
    }

    /// Called after every segment of a message was accepted
    pub async fn message_sent(&self, session: &Arc<Session>) {
        if !self.inner.strategy.keeps_session() {
            self.release(session).await;
        }
    }

    /// Called when submitting failed on `session`
    pub async fn message_not_sent(&self, session: &Arc<Session>, error: &SmppError) {
        match &self.inner.strategy {
            SessionStrategy::AlwaysNew => self.release(session).await,
            SessionStrategy::KeepAlive(_) => {
                if error.requires_new_session() {
                    session.mark_closed();
                    Inner::reconnect_in_background(&self.inner);
                }
            }
            SessionStrategy::ReuseSession(_) => {
                if error.requires_new_session() {
                    session.mark_closed();
                    let mut current = self.inner.current.lock().await;
                    if current.as_ref().is_some_and(|s| s.id() == session.id()) {
                        current.take();
                    }
                    drop(current);
                    session.close().await;
                }
            }
        }
    }

    /// Unbinds and closes a session obtained from [`acquire`](Self::acquire)
    pub async fn release(&self, session: &Arc<Session>) {
        self.inner.transient_sessions().remove(&session.id());
        session.close().await;
    }

    /// Stops background work and closes every open session. Safe to call
    /// more than once.
    pub async fn clean(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            debug!("session manager already cleaned");
            return;
        }

        let tasks: Vec<_> = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for task in tasks {
            task.abort();
            let _ = task.await;
        }

        let current = self.inner.current.lock().await.take();
        if let Some(session) = current {
            session.close().await;
        }

        let transient: Vec<_> = self.inner.transient_sessions().drain().map(|(_, s)| s).collect();
        for session in transient {
            session.close().await;
        }
    }

    /// Snapshot of the shared session, if one is bound
    pub async fn current_session(&self) -> Option<Arc<Session>> {
        self.inner.current.lock().await.clone()
    }

    pub fn is_reconnecting(&self) -> bool {
        self.inner.reconnecting.load(Ordering::Acquire)
    }
}

impl Inner {
    fn transient_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Arc<Session>>> {
        self.transient.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn connect(&self) -> Result<Arc<Session>, RetryError<SmppError>> {
        let session = self
            .connect
            .execute("connect", move || {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                Session::open(id, &self.address, &self.credentials, self.timeouts.clone())
            })
            .await?;
        Ok(Arc::new(session))
    }

    /// Closes whatever is in `current` and binds a replacement. Callers hold
    /// the `current` lock, which serializes replacement binds.
    async fn replace(
        this: &Arc<Inner>,
        current: &mut Option<Arc<Session>>,
    ) -> Result<Arc<Session>, MessagingError> {
        if let Some(old) = current.take() {
            old.set_state(SessionState::Reconnecting);
            old.mark_closed();
            old.close().await;
        }

        let session = this.connect().await.map_err(MessagingError::Connection)?;
        if this.closed.load(Ordering::Acquire) {
            session.close().await;
            return Err(MessagingError::Closed);
        }

        if let SessionStrategy::KeepAlive(config) = &this.strategy {
            let manager = Arc::downgrade(this);
            let eager = config.reconnect_eagerly;
            let handle = keepalive::spawn(&session, config.clone(), move |session_id| {
                if eager {
                    if let Some(manager) = Weak::upgrade(&manager) {
                        debug!(session_id, "reconnecting eagerly");
                        Inner::reconnect_in_background(&manager);
                    }
                }
            });
            session.attach_keep_alive(handle);
        }

        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Binds a replacement session on a spawned task. At most one such task
    /// runs at a time.
    fn reconnect_in_background(this: &Arc<Inner>) {
        if this.closed.load(Ordering::Acquire) || this.reconnecting.swap(true, Ordering::AcqRel) {
            return;
        }

        let inner = Arc::clone(this);
        let handle = tokio::spawn(async move {
            let mut current = inner.current.lock().await;
            let healthy = current.as_ref().is_some_and(|s| s.state().is_usable());
            if !healthy {
                match Inner::replace(&inner, &mut current).await {
                    Ok(session) => info!(session_id = session.id(), "reconnected in background"),
                    Err(e) => warn!(error = %e, "background reconnection failed, will retry on next send"),
                }
            }
            drop(current);
            inner.reconnecting.store(false, Ordering::Release);
        });

        let mut tasks = this.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}
