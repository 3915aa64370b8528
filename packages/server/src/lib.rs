//! Multi-room chat server.
//!
//! HTTP endpoints manage users, rooms and the request audit log; one
//! WebSocket endpoint per room fans every inbound message out to the other
//! live connections of that room.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
