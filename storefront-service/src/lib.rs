pub mod collaborators;
pub mod config;
pub mod metadata;
pub mod models;
pub mod products;
pub mod service;

pub use config::Config;
pub use service::{AppState, build_router};
