//! Multi-room chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin roomcast-server
//! cargo run --bin roomcast-server -- --host 0.0.0.0 --port 3000
//! DATABASE_URL=postgres://localhost/roomcast JWT_SECRET=... cargo run --bin roomcast-server
//! ```

use std::sync::Arc;

use clap::Parser;
use roomcast_server::{
    config::ServerConfig,
    domain::{Authenticator, PasswordHasher},
    infrastructure::{
        auth::{BcryptPasswordHasher, JwtAuthenticator},
        repository::{
            PostgresRoomRepository, PostgresSystemLogRepository, PostgresUserRepository, postgres,
        },
    },
    ui::{Dependencies, Server},
    usecase::EnsureSuperAdminUseCase,
};
use roomcast_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::parse();

    // Initialize dependencies in order:
    // 1. Auth collaborators
    // 2. Repositories
    // 3. Super-admin seeding
    // 4. Server

    // 1. Auth collaborators
    let secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!(
                "JWT_SECRET not set; using a random per-process secret (tokens will not survive a restart)"
            );
            format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
        }
    };
    let authenticator: Arc<dyn Authenticator> =
        Arc::new(JwtAuthenticator::new(secret.as_bytes(), config.token_ttl()));
    let password_hasher: Arc<dyn PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost));

    // 2. Repositories
    let dependencies = match &config.database_url {
        Some(url) => match postgres::connect(url).await {
            Ok(pool) => Dependencies {
                users: Arc::new(PostgresUserRepository::new(pool.clone())),
                rooms: Arc::new(PostgresRoomRepository::new(pool.clone())),
                system_logs: Arc::new(PostgresSystemLogRepository::new(pool)),
                authenticator,
                password_hasher,
                clock: Arc::new(SystemClock),
            },
            Err(e) => {
                tracing::error!("Failed to initialise database: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            Dependencies::in_memory(authenticator, password_hasher)
        }
    };

    // 3. Super-admin seeding
    if let (Some(email), Some(password)) = (&config.superadmin_email, &config.superadmin_password)
    {
        let seed = EnsureSuperAdminUseCase::new(
            dependencies.users.clone(),
            dependencies.password_hasher.clone(),
        );
        match seed.execute(email, password).await {
            Ok(true) => {}
            Ok(false) => tracing::info!("Super-admin account {} already exists", email),
            Err(e) => {
                tracing::error!("Failed to create super-admin account: {}", e);
                std::process::exit(1);
            }
        }
    }

    // 4. Create and run the server
    let server = Server::new(&config, dependencies);
    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
