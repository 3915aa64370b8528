//! Domain layer: value objects, entities, errors and the collaborator
//! interfaces the use cases depend on.

pub mod auth;
pub mod connection;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use auth::{Authenticator, PasswordHasher};
pub use connection::{ConnectionHandle, DeliveryPolicy, OutboundReceiver};
pub use entity::{
    AuthenticatedUser, ChatMessage, NewRoom, NewSystemLog, NewUser, Room, StoredMessage,
    SystemLog, User,
};
pub use error::{AuthError, DeliveryError, EncodeError, RepositoryError, ValueObjectError};
pub use message_pusher::{BroadcastReport, FrameEncoder, MessagePusher};
pub use registry::RoomRegistry;
pub use repository::{RoomRepository, SystemLogRepository, UserRepository};
pub use value_object::{ConnectionId, Email, Role, RoomId, UserId};

#[cfg(test)]
pub use message_pusher::{MockFrameEncoder, MockMessagePusher};
#[cfg(test)]
pub use registry::MockRoomRegistry;
#[cfg(test)]
pub use repository::{MockRoomRepository, MockSystemLogRepository, MockUserRepository};
