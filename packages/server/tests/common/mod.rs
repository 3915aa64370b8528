//! Shared helpers: an in-process server on an ephemeral port plus small
//! WebSocket / HTTP client wrappers.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use roomcast_server::{
    config::ServerConfig,
    domain::{Authenticator, NewRoom, Role, RoomId, RoomRegistry, RoomRepository, UserId},
    infrastructure::auth::{BcryptPasswordHasher, JwtAuthenticator},
    ui::{Dependencies, Server},
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Helper struct to manage an in-process server
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<dyn RoomRegistry>,
    pub rooms: Arc<dyn RoomRepository>,
    authenticator: Arc<dyn Authenticator>,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let authenticator: Arc<dyn Authenticator> = Arc::new(JwtAuthenticator::new(
            b"integration-test-secret",
            config.token_ttl(),
        ));
        let dependencies = Dependencies::in_memory(
            authenticator.clone(),
            Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
        );
        let rooms = dependencies.rooms.clone();
        let server = Server::new(&config, dependencies);
        let registry = server.registry();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = stopped.await;
        }));

        TestServer {
            addr,
            registry,
            rooms,
            authenticator,
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, room: &str) -> String {
        format!("ws://{}/ws/{}", self.addr, room)
    }

    pub fn token(&self, user_id: i64, role: Role) -> String {
        self.authenticator
            .issue_token(
                UserId::new(user_id).unwrap(),
                role,
                &format!("user{user_id}@example.com"),
            )
            .unwrap()
    }

    /// Create rooms until one with id `room_id` exists.
    pub async fn create_room_with_id(&self, room_id: i64, admin: i64) -> RoomId {
        loop {
            let room = self
                .rooms
                .create_room(NewRoom {
                    name: format!("room-{room_id}"),
                    description: None,
                    created_by: UserId::new(admin).unwrap(),
                })
                .await
                .unwrap();
            if room.id.value() >= room_id {
                return room.id;
            }
        }
    }

    pub async fn connect(&self, room: &str, token: &str) -> Result<WsClient, tungstenite::Error> {
        let mut request = self.ws_url(room).into_client_request()?;
        request.headers_mut().insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let (client, _) = connect_async(request).await?;
        Ok(client)
    }

    /// Connect and wait until the server has registered the connection.
    pub async fn join(&self, room_id: RoomId, token: &str) -> WsClient {
        let before = self.registry.room_size(room_id);
        let client = self
            .connect(&room_id.to_string(), token)
            .await
            .expect("connect");
        self.wait_for_room_size(room_id, before + 1).await;
        client
    }

    pub async fn wait_for_room_size(&self, room_id: RoomId, expected: usize) {
        let registry = self.registry.clone();
        tokio::time::timeout(RECV_TIMEOUT, async move {
            while registry.room_size(room_id) != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "room {} has {} connections, expected {}",
                room_id,
                self.registry.room_size(room_id),
                expected
            )
        });
    }

    /// Trigger the shutdown signal and wait for `serve` to return.
    pub async fn shutdown(mut self) -> std::io::Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let handle = self.handle.take().expect("server handle");
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.bcrypt_cost = 4;
    config.send_timeout_ms = 100;
    config.shutdown_grace_secs = 2;
    config.echo_to_sender = false;
    config.require_membership = false;
    config.persist_messages = false;
    config
}

pub async fn send_json(client: &mut WsClient, json: &str) {
    client.send(Message::text(json.to_string())).await.expect("send");
}

/// Next text frame, or `None` on close / timeout.
pub async fn recv_text(client: &mut WsClient) -> Option<String> {
    recv_text_within(client, RECV_TIMEOUT).await
}

pub async fn recv_text_within(client: &mut WsClient, within: Duration) -> Option<String> {
    tokio::time::timeout(within, async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text.to_string()),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Whether the server closes the connection within the receive timeout.
pub async fn closed_by_server(client: &mut WsClient) -> bool {
    tokio::time::timeout(RECV_TIMEOUT, async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    })
    .await
    .unwrap_or(false)
}
