//! UseCase layer: one struct per application operation.
//!
//! Use cases depend only on the domain's collaborator traits; the concrete
//! implementations are wired in by the UI layer.

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod room;
pub mod send_message;
pub mod system_log;
pub mod user;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, RoomError, SendMessageError, SystemLogError, UserError};
pub use room::{
    AddRoomMemberUseCase, CheckRoomAdminUseCase, CreateRoomUseCase, DeleteRoomUseCase,
    GetRoomUseCase, ListRoomsUseCase,
};
pub use send_message::{EchoPolicy, MessagePolicy, SendMessageUseCase};
pub use system_log::{ListSystemLogsUseCase, RecordRequestUseCase, RequestRecord};
pub use user::{
    EnsureSuperAdminUseCase, ListUsersUseCase, LoginUseCase, RegisterUser, RegisterUserUseCase,
};
