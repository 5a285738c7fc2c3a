//! Battery-swap reservation front-end.
//!
//! A local web application that finds swap stations near the user,
//! reserves a swap, hands off to the payment gateway and lets the user
//! check in when they arrive.

pub mod api;
pub mod config;
pub mod directory;
pub mod domain;
pub mod geo;
pub mod map;
pub mod reservation;
pub mod session;
pub mod status;
pub mod store;
pub mod web;
