//! WebSocket connection lifecycle
//!
//! `Admitting -> Active -> Draining -> Closed` for one connection:
//!
//! - Admitting: room id, bearer token and room checks run before the
//!   upgrade. Any failure is answered with an HTTP error and nothing is
//!   registered.
//! - Active: the connection is registered only inside the upgrade callback.
//!   The receive loop hands every decoded frame to `SendMessageUseCase` and
//!   awaits it before reading the next one.
//! - Draining: decode or read error, client close, process shutdown, the
//!   broadcast engine closing the handle, or the writer task exiting.
//! - Closed: `TeardownGuard` closes and deregisters on every exit path.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    domain::{AuthError, AuthenticatedUser, ConnectionHandle, OutboundReceiver, RoomId},
    infrastructure::dto::websocket::InboundFrame,
    ui::{error::ApiError, middleware::bearer_token, state::AppState},
    usecase::{DisconnectParticipantUseCase, SendMessageError},
};

/// How long teardown waits for the writer to flush its close frame
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Fallback for clients that cannot set an `Authorization` header
    pub token: Option<String>,
}

/// `GET /ws/{room_id}`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(raw_room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let room_id = RoomId::parse(&raw_room_id).map_err(|e| {
        tracing::warn!("Rejected connection: {}", e);
        ApiError::from(e)
    })?;

    let token = bearer_token(&headers)
        .or(query.token.as_deref())
        .ok_or(AuthError::MissingToken)?;
    let user = state.authenticator.authenticate(token).map_err(|e| {
        tracing::warn!("Rejected connection to room {}: {}", room_id, e);
        ApiError::from(e)
    })?;

    state
        .connect_participant_usecase
        .authorize(room_id, &user)
        .await
        .map_err(|e| {
            tracing::warn!(
                "Rejected connection of user {} to room {}: {}",
                user.user_id,
                room_id,
                e
            );
            ApiError::from(e)
        })?;

    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade to room {} failed: {}", room_id, e);
        })
        .on_upgrade(move |socket| handle_socket(socket, state, room_id, user)))
}

/// Runs teardown when the controller exits, however it exits.
struct TeardownGuard {
    connection: ConnectionHandle,
    usecase: Arc<DisconnectParticipantUseCase>,
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        self.usecase.execute(&self.connection);
    }
}

/// Why the receive loop stopped
#[derive(Debug)]
enum DrainReason {
    ClientClosed,
    ReadError,
    DecodeError,
    Shutdown,
    ClosedByServer,
    WriterExited,
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    user: AuthenticatedUser,
) {
    let (connection, outbound) =
        ConnectionHandle::open(room_id, user.user_id, state.outbound_buffer);
    if let Err(e) = state
        .connect_participant_usecase
        .execute(connection.clone())
        .await
    {
        tracing::warn!("Connection of user {} not registered: {}", user.user_id, e);
        return;
    }
    let teardown = TeardownGuard {
        connection: connection.clone(),
        usecase: state.disconnect_participant_usecase.clone(),
    };

    let (sink, mut stream) = socket.split();
    let mut writer = pusher_loop(outbound, sink, connection.clone());
    let mut writer_done = false;
    let mut shutdown = state.shutdown.clone();

    let reason = loop {
        tokio::select! {
            frame = stream.next() => {
                let decoded = match frame {
                    Some(Ok(Message::Text(text))) => InboundFrame::decode_text(text.as_str()),
                    Some(Ok(Message::Binary(bytes))) => InboundFrame::decode_binary(&bytes),
                    Some(Ok(Message::Close(_))) | None => break DrainReason::ClientClosed,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!("Read error on connection {}: {}", connection.id(), e);
                        break DrainReason::ReadError;
                    }
                };
                match decoded {
                    Ok(frame) => process_frame(&state, &connection, &user, frame).await,
                    Err(e) => {
                        tracing::warn!("Malformed frame on connection {}: {}", connection.id(), e);
                        break DrainReason::DecodeError;
                    }
                }
            }
            _ = wait_for_shutdown(&mut shutdown) => break DrainReason::Shutdown,
            _ = connection.closed() => break DrainReason::ClosedByServer,
            _ = &mut writer => {
                writer_done = true;
                break DrainReason::WriterExited;
            }
        }
    };

    tracing::debug!(
        "Connection {} (user {}) draining: {:?}",
        connection.id(),
        user.user_id,
        reason
    );
    drop(teardown);

    if !writer_done && tokio::time::timeout(WRITER_FLUSH_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
}

async fn process_frame(
    state: &AppState,
    connection: &ConnectionHandle,
    user: &AuthenticatedUser,
    frame: InboundFrame,
) {
    if let Some(claimed) = frame.user_id {
        if claimed != user.user_id.value() {
            tracing::warn!(
                "Frame on connection {} claims user {} but token is user {}; using token identity",
                connection.id(),
                claimed,
                user.user_id
            );
        }
    }

    match state
        .send_message_usecase
        .execute(connection, frame.content)
        .await
    {
        Ok(report) => tracing::debug!(
            "Room {}: message from user {} delivered to {}/{}",
            connection.room_id(),
            user.user_id,
            report.delivered,
            report.recipients
        ),
        Err(SendMessageError::NotMember(room_id)) => tracing::warn!(
            "Dropped message from user {}: not a member of room {}",
            user.user_id,
            room_id
        ),
        Err(e) => tracing::error!("Failed to send message from user {}: {}", user.user_id, e),
    }
}

/// Resolves once the shutdown flag is set; never if the sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Spawns the writer: drains the outbound queue into the socket until the
/// connection is closed, then sends a close frame.
fn pusher_loop(
    mut outbound: OutboundReceiver,
    mut sink: SplitSink<WebSocket, Message>,
    connection: ConnectionHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = outbound.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = sink.send(Message::Text(frame.into())).await {
                            tracing::debug!("Write error on connection {}: {}", connection.id(), e);
                            return;
                        }
                    }
                    None => break,
                },
                _ = connection.closed() => break,
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    })
}
