use std::net::SocketAddr;
use std::sync::Arc;

use auth::JwtHandler;
use sqlx::postgres::PgPoolOptions;
use staff_service::config::Config;
use staff_service::domain::auth::service::AuthService;
use staff_service::domain::session::service::SessionRegistry;
use staff_service::domain::two_factor::service::TwoFactorService;
use staff_service::inbound::http::router::create_router;
use staff_service::inbound::http::router::AppState;
use staff_service::outbound::email::PostmarkEmailSender;
use staff_service::outbound::repositories::PostgresCredentialRepository;
use staff_service::outbound::repositories::PostgresLoginAttemptRepository;
use staff_service::outbound::repositories::PostgresPasswordHistoryRepository;
use staff_service::outbound::repositories::PostgresRecoveryTokenRepository;
use staff_service::outbound::repositories::PostgresSessionRepository;
use staff_service::outbound::repositories::PostgresTwoFactorConfigRepository;
use staff_service::outbound::repositories::PostgresTwoFactorRateLimitRepository;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staff_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "staff-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        token_ttl_seconds = config.jwt.ttl_seconds,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let codec = Arc::new(JwtHandler::new(config.jwt.secret.as_bytes()));
    let mailer = Arc::new(PostmarkEmailSender::new(&config.email));

    let credentials = Arc::new(PostgresCredentialRepository::new(pg_pool.clone()));
    let sessions = Arc::new(PostgresSessionRepository::new(pg_pool.clone()));
    let attempts = Arc::new(PostgresLoginAttemptRepository::new(pg_pool.clone()));
    let history = Arc::new(PostgresPasswordHistoryRepository::new(pg_pool.clone()));
    let recovery_tokens = Arc::new(PostgresRecoveryTokenRepository::new(pg_pool.clone()));
    let two_factor_configs = Arc::new(PostgresTwoFactorConfigRepository::new(pg_pool.clone()));
    let two_factor_quotas = Arc::new(PostgresTwoFactorRateLimitRepository::new(pg_pool));

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&credentials),
        Arc::clone(&sessions),
        attempts,
        history,
        recovery_tokens,
        Arc::clone(&mailer),
        Arc::clone(&codec),
        config.jwt.ttl_seconds,
    ));
    let two_factor = Arc::new(TwoFactorService::new(
        two_factor_configs,
        two_factor_quotas,
        Arc::clone(&mailer),
    ));
    let session_registry = Arc::new(SessionRegistry::new(Arc::clone(&sessions)));

    let state = AppState {
        auth_service,
        two_factor,
        sessions: session_registry,
        credentials,
        codec,
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let application = create_router(state);
    axum::serve(
        http_listener,
        application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
