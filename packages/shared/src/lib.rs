//! Utilities shared by the roomcast crates.

pub mod logger;
pub mod time;
