//! HTTP and WebSocket handlers.

mod http;
mod room;
mod system_log;
mod user;
mod websocket;

pub use http::{debug_registry, health_check};
pub use room::{add_room_member, create_room, delete_room, get_room, is_room_admin, list_rooms};
pub use system_log::{list_logs, list_logs_by_user};
pub use user::{list_users, login, register_user};
pub use websocket::websocket_handler;
