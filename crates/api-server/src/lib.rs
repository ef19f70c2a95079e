#![warn(clippy::unwrap_used)]

pub mod plans;
pub mod rest;
pub mod server;
pub mod store;

pub use rest::AppState;
pub use server::{router, ApiServer};
pub use store::PlanStore;
