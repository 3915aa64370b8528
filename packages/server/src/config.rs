//! Server configuration
//!
//! Every option can be given as a command-line flag or through the
//! environment variable named next to it.

use std::time::Duration;

use clap::Parser;

use crate::{
    domain::DeliveryPolicy,
    usecase::{EchoPolicy, MessagePolicy},
};

#[derive(Parser, Debug, Clone)]
#[command(name = "roomcast-server")]
#[command(about = "Multi-room chat server with WebSocket broadcast", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// PostgreSQL connection string; in-memory storage when absent
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Secret used to sign and verify bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens in seconds
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 86_400)]
    pub token_ttl_secs: u64,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = 12)]
    pub bcrypt_cost: u32,

    /// Outbound frames buffered per connection before it counts as slow
    #[arg(long, env = "OUTBOUND_BUFFER", default_value_t = 64)]
    pub outbound_buffer: usize,

    /// How long a broadcast waits on a full connection buffer (0 = drop immediately)
    #[arg(long, env = "SEND_TIMEOUT_MS", default_value_t = 250)]
    pub send_timeout_ms: u64,

    /// Deliver a sender's messages back to the sending connection
    #[arg(long, env = "ECHO_TO_SENDER")]
    pub echo_to_sender: bool,

    /// Only room members (or room admins) may join and post in a room
    #[arg(long, env = "REQUIRE_MEMBERSHIP")]
    pub require_membership: bool,

    /// Store every broadcast message
    #[arg(long, env = "PERSIST_MESSAGES")]
    pub persist_messages: bool,

    /// E-mail of the super-admin account created at startup
    #[arg(long, env = "SUPERADMIN_EMAIL")]
    pub superadmin_email: Option<String>,

    /// Password of the super-admin account created at startup
    #[arg(long, env = "SUPERADMIN_PASSWORD", hide_env_values = true)]
    pub superadmin_password: Option<String>,

    /// Seconds to wait for live connections to drain on shutdown
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::parse_from(["roomcast-server"])
    }
}

impl ServerConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy::from_millis(self.send_timeout_ms)
    }

    pub fn message_policy(&self) -> MessagePolicy {
        MessagePolicy {
            echo: if self.echo_to_sender {
                EchoPolicy::IncludeSender
            } else {
                EchoPolicy::ExcludeSender
            },
            require_membership: self.require_membership,
            persist: self.persist_messages,
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
