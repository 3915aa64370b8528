//! Server wiring and execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use roomcast_shared::time::{Clock, SystemClock};
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{
        Authenticator, PasswordHasher, RoomRegistry, RoomRepository, SystemLogRepository,
        UserRepository,
    },
    infrastructure::{
        dto::websocket::JsonFrameEncoder,
        message_pusher::WebSocketMessagePusher,
        registry::InMemoryRoomRegistry,
        repository::{InMemoryRoomRepository, InMemorySystemLogRepository, InMemoryUserRepository},
    },
    usecase::{
        AddRoomMemberUseCase, CheckRoomAdminUseCase, ConnectParticipantUseCase, CreateRoomUseCase,
        DeleteRoomUseCase, DisconnectParticipantUseCase, GetRoomUseCase, ListRoomsUseCase,
        ListSystemLogsUseCase, ListUsersUseCase, LoginUseCase, RecordRequestUseCase,
        RegisterUserUseCase, SendMessageUseCase,
    },
};

use super::{
    handler::{
        add_room_member, create_room, debug_registry, delete_room, get_room, health_check,
        is_room_admin, list_logs, list_logs_by_user, list_rooms, list_users, login, register_user,
        websocket_handler,
    },
    middleware::audit_requests,
    signal::shutdown_signal,
    state::AppState,
};

/// How often shutdown re-checks whether the registry has drained
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Collaborators the server is built from
pub struct Dependencies {
    pub users: Arc<dyn UserRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub system_logs: Arc<dyn SystemLogRepository>,
    pub authenticator: Arc<dyn Authenticator>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

impl Dependencies {
    /// In-memory storage; nothing survives a restart.
    pub fn in_memory(
        authenticator: Arc<dyn Authenticator>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            rooms: Arc::new(InMemoryRoomRepository::new()),
            system_logs: Arc::new(InMemorySystemLogRepository::new()),
            authenticator,
            password_hasher,
            clock: Arc::new(SystemClock),
        }
    }
}

/// Multi-room chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(&config, dependencies);
/// server.run(config.host.clone(), config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    registry: Arc<dyn RoomRegistry>,
    shutdown: watch::Sender<bool>,
    shutdown_grace: Duration,
}

impl Server {
    pub fn new(config: &ServerConfig, deps: Dependencies) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let registry: Arc<dyn RoomRegistry> = Arc::new(InMemoryRoomRegistry::new());
        let message_pusher = Arc::new(WebSocketMessagePusher::new(
            registry.clone(),
            config.delivery_policy(),
        ));

        let state = Arc::new(AppState {
            authenticator: deps.authenticator.clone(),
            registry: registry.clone(),
            outbound_buffer: config.outbound_buffer,
            shutdown: shutdown_rx,
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                deps.rooms.clone(),
                registry.clone(),
                config.require_membership,
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                registry.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                deps.rooms.clone(),
                message_pusher,
                Arc::new(JsonFrameEncoder),
                deps.clock.clone(),
                config.message_policy(),
            )),
            register_user_usecase: Arc::new(RegisterUserUseCase::new(
                deps.users.clone(),
                deps.password_hasher.clone(),
            )),
            login_usecase: Arc::new(LoginUseCase::new(
                deps.users.clone(),
                deps.password_hasher.clone(),
                deps.authenticator.clone(),
            )),
            list_users_usecase: Arc::new(ListUsersUseCase::new(deps.users.clone())),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(deps.rooms.clone())),
            get_room_usecase: Arc::new(GetRoomUseCase::new(deps.rooms.clone())),
            list_rooms_usecase: Arc::new(ListRoomsUseCase::new(deps.rooms.clone())),
            delete_room_usecase: Arc::new(DeleteRoomUseCase::new(
                deps.rooms.clone(),
                registry.clone(),
            )),
            check_room_admin_usecase: Arc::new(CheckRoomAdminUseCase::new(deps.rooms.clone())),
            add_room_member_usecase: Arc::new(AddRoomMemberUseCase::new(deps.rooms.clone())),
            record_request_usecase: Arc::new(RecordRequestUseCase::new(
                deps.system_logs.clone(),
                deps.clock.clone(),
            )),
            list_system_logs_usecase: Arc::new(ListSystemLogsUseCase::new(deps.system_logs)),
        });

        Self {
            state,
            registry,
            shutdown,
            shutdown_grace: config.shutdown_grace(),
        }
    }

    /// The live connection registry, for diagnostics
    pub fn registry(&self) -> Arc<dyn RoomRegistry> {
        self.registry.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/debug/registry", get(debug_registry))
            .route("/users", get(list_users))
            .route("/users/add", post(register_user))
            .route("/users/login", post(login))
            .route("/rooms", get(list_rooms).post(create_room))
            .route("/rooms/{room_id}", get(get_room).delete(delete_room))
            .route("/rooms/{room_id}/is-admin", get(is_room_admin))
            .route("/rooms/{room_id}/users", post(add_room_member))
            .route("/logs", get(list_logs))
            .route("/logs/user/{user_id}", get(list_logs_by_user))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                audit_requests,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind `host:port` and serve until Ctrl+C / SIGTERM.
    pub async fn run(self, host: String, port: u16) -> std::io::Result<()> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/{{room_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `signal` resolves, then drain every live
    /// connection before returning.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let Server {
            registry,
            shutdown,
            shutdown_grace,
            ..
        } = self;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!(
                    "Closing {} live connections",
                    registry.connection_count()
                );
                shutdown.send_replace(true);
                drain(registry.as_ref(), shutdown_grace).await;
            })
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait until the registry is empty, or give up after `grace`.
async fn drain(registry: &dyn RoomRegistry, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        while registry.connection_count() > 0 {
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    })
    .await;
    match drained {
        Ok(()) => tracing::info!("All connections drained"),
        Err(_) => tracing::warn!(
            "{} connections still registered after {:?}",
            registry.connection_count(),
            grace
        ),
    }
}
