use std::sync::Arc;

use auth::Authenticator;
use auth::TokenSigner;
use bookstore_service::config::Config;
use bookstore_service::credentials::ports::AuthServicePort;
use bookstore_service::credentials::service::AuthService;
use bookstore_service::inbound::http::router::create_router;
use bookstore_service::repositories::InMemoryIdentityRepository;
use bookstore_service::repositories::InMemoryRefreshTokenRepository;
use bookstore_service::repositories::PostgresIdentityRepository;
use bookstore_service::repositories::PostgresRefreshTokenRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookstore_service=debug,auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "bookstore-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_configured = config.database.url.is_some(),
        http_port = config.server.http_port,
        access_token_ttl_minutes = config.jwt.access_token_ttl_minutes,
        refresh_token_ttl_days = config.jwt.refresh_token_ttl_days,
        "Configuration loaded"
    );

    let signer = TokenSigner::from_pem_files(
        &config.jwt.private_key_path,
        &config.jwt.public_key_path,
    )?;
    tracing::info!(
        private_key_path = %config.jwt.private_key_path,
        public_key_path = %config.jwt.public_key_path,
        "Signing keys loaded"
    );

    let authenticator = Arc::new(Authenticator::new(signer, config.jwt.token_lifetimes()));

    let auth_service: Arc<dyn AuthServicePort> = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            Arc::new(AuthService::new(
                Arc::new(PostgresIdentityRepository::new(pg_pool.clone())),
                Arc::new(PostgresRefreshTokenRepository::new(pg_pool)),
                Arc::clone(&authenticator),
            ))
        }
        None => {
            tracing::warn!("No database configured, credentials are kept in memory");

            let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new());
            Arc::new(AuthService::new(
                Arc::new(InMemoryIdentityRepository::new(Arc::clone(&refresh_tokens))),
                refresh_tokens,
                Arc::clone(&authenticator),
            ))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, authenticator);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited successfully");

    Ok(())
}
