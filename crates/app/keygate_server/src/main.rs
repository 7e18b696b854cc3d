//! Keygate API server binary.
//!
//! Serves the auth and API key RPC services over HTTP, backed by PostgreSQL.

use std::sync::Arc;

use clap::Parser;
use keygate_api::config::ApiConfig;
use keygate_core::auth::identity::GoogleTokenInfoOracle;
use keygate_core::auth::session::SigningSecret;
use keygate_core::store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "keygate_server", about = "Keygate API server")]
struct Args {
    /// Google OAuth client ID (expected audience of ID tokens).
    #[arg(long, env = "GOOGLE_CLIENT_ID", default_value = "")]
    google_client_id: String,

    /// Session signing secret, standard base64. Random per process if unset.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Session token lifetime in seconds.
    #[arg(long, env = "SESSION_TTL_SECS")]
    session_ttl_secs: Option<i64>,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/keygate"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep users and keys in memory instead of PostgreSQL (development only).
    #[arg(long, default_value_t = false)]
    in_memory: bool,

    /// Print a fresh base64 signing secret and exit.
    #[arg(long, default_value_t = false)]
    generate_secret: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if args.generate_secret {
        println!("{}", SigningSecret::generate()?.to_base64());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| {
                    tracing_subscriber::EnvFilter::try_new(
                        "info,keygate_api=debug,keygate_core=debug",
                    )
                })?,
        )
        .init();

    let config = ApiConfig::new(
        format!("0.0.0.0:{}", args.port),
        args.google_client_id,
        args.jwt_secret.as_deref(),
        args.session_ttl_secs,
    )?;

    let store: Arc<dyn CredentialStore> = if args.in_memory {
        warn!("using in-memory credential store - users and keys are lost on exit");
        Arc::new(MemoryCredentialStore::new())
    } else {
        info!(
            max_connections = args.max_connections,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        keygate_core::migrate::migrate(&pool).await?;
        Arc::new(PgCredentialStore::new(pool))
    };

    let state = keygate_api::AppState::new(
        config.clone(),
        store,
        Arc::new(GoogleTokenInfoOracle::new()),
    );
    let app = keygate_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
