//! FlowRunner – loads a session, applies one change and persists it again.
//!
//! Every mutation of a session goes through [`FlowRunner::modify`], which holds a
//! per-session lock for the whole load, change, save cycle. Two requests for the
//! same session are therefore applied one after the other and the second one
//! always sees the snapshot written by the first.
//!
//! Requests that call a collaborator should not hold the lock while waiting on
//! the network. The pattern is:
//!
//! ```rust,ignore
//! let ticket = runner.begin_request(&session_id, RequestKind::TradeIn).await?;
//! let offer = collaborator.quote(request).await?;
//! runner.modify(&session_id, |session| {
//!     if ticket.is_live() { /* write offer */ }
//!     Ok(())
//! }).await?;
//! ```

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    error::{BuyFlowError, Result},
    request::{RequestKind, RequestTicket},
    state::BuyFlowUpdate,
    storage::{Session, SessionStorage},
};

#[derive(Clone)]
pub struct FlowRunner {
    storage: Arc<dyn SessionStorage>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl FlowRunner {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Create and persist a fresh session.
    pub async fn create(&self) -> Result<Session> {
        let session = Session::new();
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, "Created buy-flow session");
        Ok(session)
    }

    pub async fn load(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| BuyFlowError::SessionNotFound(session_id.to_string()))
    }

    /// Run `change` against the stored session and save the result.
    ///
    /// `change` works on a private copy of the state, step and scratch
    /// documents; none of it is saved when `change` fails. Request tickets are
    /// shared counters and take effect as soon as they are issued.
    pub async fn modify<T, F>(&self, session_id: &str, change: F) -> Result<(Session, T)>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        // Unknown ids never get a lock entry.
        self.load(session_id).await?;

        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.modify_locked(session_id, change).await
        };
        drop(lock);

        if matches!(result, Err(BuyFlowError::SessionNotFound(_))) {
            self.locks
                .remove_if(session_id, |_, lock| Arc::strong_count(lock) == 1);
        }
        result
    }

    async fn modify_locked<T, F>(&self, session_id: &str, change: F) -> Result<(Session, T)>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        let mut session = self.load(session_id).await?;
        session.scratch = session.scratch.snapshot();
        let output = change(&mut session)?;
        session.updated_at = chrono::Utc::now();
        self.storage.save(session.clone()).await?;

        debug!(session_id = %session_id, step = ?session.current_step, "Session saved");
        Ok((session, output))
    }

    /// Apply one section update (or a full clear) to the session state.
    pub async fn apply(&self, session_id: &str, update: &BuyFlowUpdate) -> Result<Session> {
        let (session, ()) = self
            .modify(session_id, |session| {
                if matches!(update, BuyFlowUpdate::Clear) {
                    session.reset();
                } else {
                    session.state = session.state.apply(update);
                }
                Ok(())
            })
            .await?;
        Ok(session)
    }

    /// Start over: the session keeps its id, everything else is reset.
    pub async fn clear(&self, session_id: &str) -> Result<Session> {
        self.apply(session_id, &BuyFlowUpdate::Clear).await
    }

    /// Issue a ticket for an outbound request made on behalf of the session.
    pub async fn begin_request(&self, session_id: &str, kind: RequestKind) -> Result<RequestTicket> {
        let session = self.load(session_id).await?;
        Ok(session.requests.begin(kind))
    }
}
