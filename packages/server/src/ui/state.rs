//! Shared application state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    domain::{Authenticator, RoomRegistry},
    usecase::{
        AddRoomMemberUseCase, CheckRoomAdminUseCase, ConnectParticipantUseCase, CreateRoomUseCase,
        DeleteRoomUseCase, DisconnectParticipantUseCase, GetRoomUseCase, ListRoomsUseCase,
        ListSystemLogsUseCase, ListUsersUseCase, LoginUseCase, RecordRequestUseCase,
        RegisterUserUseCase, SendMessageUseCase,
    },
};

pub struct AppState {
    pub authenticator: Arc<dyn Authenticator>,
    pub registry: Arc<dyn RoomRegistry>,
    /// Capacity of each connection's outbound queue
    pub outbound_buffer: usize,
    /// Flips to `true` once the process starts shutting down
    pub shutdown: watch::Receiver<bool>,

    // WebSocket
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,

    // users
    pub register_user_usecase: Arc<RegisterUserUseCase>,
    pub login_usecase: Arc<LoginUseCase>,
    pub list_users_usecase: Arc<ListUsersUseCase>,

    // rooms
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_room_usecase: Arc<GetRoomUseCase>,
    pub list_rooms_usecase: Arc<ListRoomsUseCase>,
    pub delete_room_usecase: Arc<DeleteRoomUseCase>,
    pub check_room_admin_usecase: Arc<CheckRoomAdminUseCase>,
    pub add_room_member_usecase: Arc<AddRoomMemberUseCase>,

    // audit log
    pub record_request_usecase: Arc<RecordRequestUseCase>,
    pub list_system_logs_usecase: Arc<ListSystemLogsUseCase>,
}
