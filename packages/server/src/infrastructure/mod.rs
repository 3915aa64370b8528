//! Infrastructure layer: concrete implementations of the domain's
//! collaborator traits.

pub mod auth;
pub mod dto;
pub mod message_pusher;
pub mod registry;
pub mod repository;
