pub mod cart;
pub mod catalog;
pub mod context;
pub mod error;
pub mod identity;
pub mod pricing;
pub mod request;
pub mod runner;
pub mod state;
pub mod step;
pub mod storage;
pub mod trade_in;
pub mod validation;

// Re-export commonly used types
pub use cart::{CartPayload, NumberChoice, PlanSelectionForm, PlanSubmission, prepare_plan_submission};
pub use catalog::{Phone, PhoneListItem, PlanCatalog, PlanOption};
pub use context::{Scratch, scratch_keys};
pub use error::{BuyFlowError, Result};
pub use identity::{IdentityForm, IdentityInfo, SignInForm, UserInfo};
pub use pricing::{CartSummary, CartView, LineItem, LineKind, assemble_cart_view};
pub use request::{RequestKind, RequestTicket, RequestTracker, RequestTrackers};
pub use runner::FlowRunner;
pub use state::{BuyFlowState, BuyFlowUpdate};
pub use step::FlowStep;
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use trade_in::{TradeInOffer, TradeInRequest};
