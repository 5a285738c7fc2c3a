//! Web layer for the battery-swap front-end.
//!
//! Server-rendered pages for finding a station, reserving a swap,
//! following a booking and signing in.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
