//! Connection handle
//!
//! One live WebSocket connection as seen by the registry and the broadcaster.
//! The lifecycle controller that opened the connection owns it; every clone
//! handed to the registry is only a write capability onto the bounded
//! outbound queue plus the shared liveness flag.

use std::{sync::Arc, time::Duration};

use tokio::sync::{
    mpsc::{self, error::SendTimeoutError, error::TrySendError},
    watch,
};

use super::{
    error::DeliveryError,
    value_object::{ConnectionId, RoomId, UserId},
};

/// Receiving half of a connection's outbound queue
pub type OutboundReceiver = mpsc::Receiver<String>;

/// How long a broadcast may wait on one recipient's outbound queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Never wait: a full queue counts as a failed delivery
    DropWhenFull,
    /// Wait at most this long for queue space
    WaitUpTo(Duration),
}

impl DeliveryPolicy {
    /// `0` means [`DeliveryPolicy::DropWhenFull`].
    pub fn from_millis(timeout_ms: u64) -> Self {
        if timeout_ms == 0 {
            DeliveryPolicy::DropWhenFull
        } else {
            DeliveryPolicy::WaitUpTo(Duration::from_millis(timeout_ms))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    room_id: RoomId,
    user_id: UserId,
    outbound: mpsc::Sender<String>,
    closed: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Open a new connection bound to `room_id` for its whole lifetime.
    ///
    /// `capacity` bounds the outbound queue (minimum 1).
    pub fn open(room_id: RoomId, user_id: UserId, capacity: usize) -> (Self, OutboundReceiver) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let (closed, _) = watch::channel(false);
        let handle = Self {
            id: ConnectionId::generate(),
            room_id,
            user_id,
            outbound,
            closed: Arc::new(closed),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_alive(&self) -> bool {
        !*self.closed.borrow()
    }

    /// Mark the connection closed. Returns `true` only for the call that
    /// actually flipped the flag.
    pub fn close(&self) -> bool {
        !self.closed.send_replace(true)
    }

    /// Resolves once the connection has been closed by anyone.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // the sender lives in `self`, so `wait_for` cannot observe a dropped channel
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Enqueue one frame for this connection's writer.
    pub async fn deliver(&self, frame: String, policy: DeliveryPolicy) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::Closed);
        }
        match policy {
            DeliveryPolicy::DropWhenFull => self.outbound.try_send(frame).map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Closed,
            }),
            DeliveryPolicy::WaitUpTo(timeout) => self
                .outbound
                .send_timeout(frame, timeout)
                .await
                .map_err(|e| match e {
                    SendTimeoutError::Timeout(_) => DeliveryError::TimedOut,
                    SendTimeoutError::Closed(_) => DeliveryError::Closed,
                }),
        }
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}
