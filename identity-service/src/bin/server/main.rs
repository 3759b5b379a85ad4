use std::sync::Arc;

use auth::KeyManager;
use auth::TokenCodec;
use identity_service::config::Config;
use identity_service::domain::identity::dispatch::Dispatcher;
use identity_service::domain::identity::ports::AuthenticationPort;
use identity_service::domain::identity::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::PostgresPrincipalRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        keys_directory = %config.keys.directory,
        issuer = %config.oidc.issuer,
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

    let key_manager = Arc::new(KeyManager::with_key_size(
        &config.keys.directory,
        config.keys.size,
    ));
    key_manager.ensure_keys()?;

    let token_codec = Arc::new(TokenCodec::from_key_manager(
        &key_manager,
        config.token.ttls(),
    )?);

    let repository = Arc::new(PostgresPrincipalRepository::new(pg_pool));
    let engine: Arc<dyn AuthenticationPort> = Arc::new(AuthService::new(repository, token_codec));
    let dispatcher = Arc::new(Dispatcher::for_engine(engine));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(dispatcher, key_manager, config.oidc.issuer.clone());

    axum::serve(http_listener, http_application).await?;

    Ok(())
}
