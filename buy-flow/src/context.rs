use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;

/// Well-known scratch keys
pub mod scratch_keys {
    /// Last cart response returned by the cart collaborator
    pub const CART_DATA: &str = "cartData";
    /// Result of the identity-protection step
    pub const IDENTITY_INFO: &str = "identityInfo";
    /// Sign-in outcome (never the password)
    pub const USER_INFO: &str = "userInfo";
    /// Trade-in offer currently shown to the customer
    pub const TRADE_IN_OFFER: &str = "tradeInOffer";
}

/// Loose per-session key/value storage that lives next to the buy-flow state.
///
/// Holds documents that are read back by later steps but are not part of the
/// state sections, such as the last cart response. Clones share the same map;
/// [`Scratch::snapshot`] makes a detached copy.
#[derive(Clone, Debug, Default)]
pub struct Scratch {
    data: Arc<DashMap<String, Value>>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Independent copy of the current entries; later writes to either side
    /// are not seen by the other.
    pub fn snapshot(&self) -> Self {
        Self {
            data: Arc::new(self.data.as_ref().clone()),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: impl serde::Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.into(), value);
        Ok(())
    }

    /// Typed read; a value that no longer matches `T` reads as absent.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.data.get(key).map(|v| v.clone())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
