//! Cancellable request tickets.
//!
//! A session hands out a [`RequestTicket`] before every outbound call. When the
//! result comes back it is only applied if the ticket is still live. Each kind
//! of call has its own counter: a newer request of the same kind, or an
//! invalidation of that kind (trade-in removed), turns older tickets stale.
//! Start over invalidates every kind.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outbound calls a session can have in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    Cart,
    TradeIn,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Cart => f.write_str("cart request"),
            RequestKind::TradeIn => f.write_str("trade-in quote"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    generation: Arc<AtomicU64>,
}

#[derive(Clone, Debug)]
pub struct RequestTicket {
    kind: RequestKind,
    generation: u64,
    tracker: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request; any ticket issued earlier becomes stale.
    pub fn begin(&self, kind: RequestKind) -> RequestTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        RequestTicket {
            kind,
            generation,
            tracker: self.generation.clone(),
        }
    }

    /// Make every outstanding ticket stale without starting a new request.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl RequestTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        self.tracker.load(Ordering::Acquire) == self.generation
    }
}

/// One tracker per [`RequestKind`]. Clones share the counters.
#[derive(Clone, Debug, Default)]
pub struct RequestTrackers {
    cart: RequestTracker,
    trade_in: RequestTracker,
}

impl RequestTrackers {
    pub fn new() -> Self {
        Self::default()
    }

    fn tracker(&self, kind: RequestKind) -> &RequestTracker {
        match kind {
            RequestKind::Cart => &self.cart,
            RequestKind::TradeIn => &self.trade_in,
        }
    }

    pub fn begin(&self, kind: RequestKind) -> RequestTicket {
        self.tracker(kind).begin(kind)
    }

    /// Stale every pending ticket of `kind`; other kinds are untouched.
    pub fn invalidate(&self, kind: RequestKind) {
        self.tracker(kind).invalidate();
    }

    pub fn invalidate_all(&self) {
        self.cart.invalidate();
        self.trade_in.invalidate();
    }
}
