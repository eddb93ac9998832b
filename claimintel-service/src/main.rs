use axum::{
    http::{HeaderValue, Request},
    middleware::{Next, from_fn},
};
use claim_flow::{
    ClaimManager, ClaimRepository, InMemoryClaimRepository, InMemoryNotificationRepository,
    NotificationRepository, OpenRouterFlows, PostgresClaimRepository,
    PostgresNotificationRepository, demo::demo_claims, storage_postgres,
};
use claimintel_service::{AppState, Config, build_router};
use std::sync::Arc;
use tracing::{Instrument, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured JSON tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "claimintel_service=debug,claim_flow=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Tags every request with a fresh correlation ID and runs it inside an `http_request` span
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn create_storage(
    config: &Config,
) -> (Arc<dyn ClaimRepository>, Arc<dyn NotificationRepository>) {
    let Some(database_url) = config.database_url.as_deref() else {
        info!("Using in-memory storage (set DATABASE_URL to use PostgreSQL)");
        return (
            Arc::new(InMemoryClaimRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
        );
    };

    info!("Using PostgreSQL storage");
    match storage_postgres::connect(database_url).await {
        Ok(pool) => (
            Arc::new(PostgresClaimRepository::new(pool.clone())),
            Arc::new(PostgresNotificationRepository::new(pool)),
        ),
        Err(e) => {
            error!(
                "Failed to connect to PostgreSQL: {}. Falling back to in-memory storage.",
                e
            );
            (
                Arc::new(InMemoryClaimRepository::new()),
                Arc::new(InMemoryNotificationRepository::new()),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let mut ai = OpenRouterFlows::new(config.openrouter_api_key.clone())
        .with_model(config.openrouter_model.clone());
    if let Some(base_url) = &config.openrouter_base_url {
        ai = ai.with_base_url(base_url.clone());
    }
    info!(
        model = %ai.model(),
        text_transport = ?ai.text_transport(),
        "Configured AI flows"
    );

    let (claims, notifications) = create_storage(&config).await;
    let manager = Arc::new(ClaimManager::new(claims, notifications, Arc::new(ai)));

    if config.seed_demo_data {
        if let Err(e) = manager.seed(demo_claims()).await {
            warn!(error = %e, "Failed to seed demo claims");
        }
    }

    let app = build_router(AppState { manager }, config.max_request_bytes)
        .layer(from_fn(correlation_id_middleware));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("ClaimIntel service running on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
