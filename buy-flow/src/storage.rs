use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    context::{Scratch, scratch_keys},
    error::Result,
    request::{RequestKind, RequestTrackers},
    state::BuyFlowState,
    step::FlowStep,
};

/// One browsing session of the buy flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub state: BuyFlowState,
    pub current_step: FlowStep,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub scratch: Scratch,
    #[serde(skip)]
    pub requests: RequestTrackers,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: BuyFlowState::default(),
            current_step: FlowStep::default(),
            created_at: now,
            updated_at: now,
            scratch: Scratch::new(),
            requests: RequestTrackers::new(),
        }
    }

    /// Move forward to `step` unless the session is already past it.
    pub fn advance_to(&mut self, step: FlowStep) {
        let mut cursor = self.current_step.next();
        while let Some(ahead) = cursor {
            if ahead == step {
                self.current_step = step;
                return;
            }
            cursor = ahead.next();
        }
    }

    /// Follow the page's "back" link; stays put on the first page.
    pub fn step_back(&mut self) {
        if let Some(step) = self.current_step.previous() {
            self.current_step = step;
        }
    }

    /// Drop the accepted trade-in and any quote still in flight.
    pub fn remove_trade_in(&mut self) {
        self.state = self.state.remove_trade_in();
        self.scratch.remove(scratch_keys::TRADE_IN_OFFER);
        self.requests.invalidate(RequestKind::TradeIn);
    }

    /// Back to an empty buy flow: state, scratch documents and pending requests.
    pub fn reset(&mut self) {
        self.state = self.state.clear_buy_flow();
        self.current_step = FlowStep::default();
        self.scratch.clear();
        self.requests.invalidate_all();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of SessionStorage
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PlanDetailsPatch, set};

    #[tokio::test]
    async fn test_save_and_get_roundtrip_shares_scratch() {
        let storage = InMemorySessionStorage::new();
        let session = Session::new();
        let id = session.id.clone();
        session
            .scratch
            .set(scratch_keys::CART_DATA, serde_json::json!({ "id": "cart-1" }))
            .unwrap();

        storage.save(session).await.unwrap();
        let loaded = storage.get(&id).await.unwrap().expect("session saved");

        assert_eq!(loaded.current_step, FlowStep::PhoneSelection);
        assert!(loaded.scratch.get_raw(scratch_keys::CART_DATA).is_some());

        storage.delete(&id).await.unwrap();
        assert!(storage.get(&id).await.unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_advance_never_moves_back() {
        let mut session = Session::new();
        session.advance_to(FlowStep::Cart);
        session.advance_to(FlowStep::Plans);
        assert_eq!(session.current_step, FlowStep::Cart);
    }

    #[test]
    fn test_step_back_stops_at_first_page() {
        let mut session = Session::new();
        session.advance_to(FlowStep::Cart);
        session.step_back();
        assert_eq!(session.current_step, FlowStep::Plans);
        session.step_back();
        session.step_back();
        assert_eq!(session.current_step, FlowStep::PhoneSelection);
    }

    #[test]
    fn test_remove_trade_in_keeps_cart_ticket() {
        let mut session = Session::new();
        let cart = session.requests.begin(RequestKind::Cart);
        let quote = session.requests.begin(RequestKind::TradeIn);
        session.scratch.set(scratch_keys::TRADE_IN_OFFER, "offer").unwrap();

        session.remove_trade_in();

        assert!(cart.is_live());
        assert!(!quote.is_live());
        assert!(session.scratch.get_raw(scratch_keys::TRADE_IN_OFFER).is_none());
        assert!(!session.state.trade_in_details.has_trade_in);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        session.state = session.state.update_plan_details(&PlanDetailsPatch {
            plan_id: set("PLAN_A"),
            ..Default::default()
        });
        session.scratch.set(scratch_keys::USER_INFO, "dana").unwrap();
        session.advance_to(FlowStep::SignIn);
        let ticket = session.requests.begin(RequestKind::Cart);

        session.reset();

        assert_eq!(session.state, BuyFlowState::default());
        assert_eq!(session.current_step, FlowStep::PhoneSelection);
        assert!(session.scratch.is_empty());
        assert!(!ticket.is_live());
    }
}
