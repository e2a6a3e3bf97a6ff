//! Web layer for the bridge risk engine.
//!
//! Provides HTTP endpoints for enumerating paths and analysing journeys.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
