//! UI layer: axum router, handlers, middleware and shutdown handling.

pub mod error;
mod handler;
pub mod middleware;
mod server;
mod signal;
pub mod state;

pub use server::{Dependencies, Server};
