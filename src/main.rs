use careers_backend::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    routes,
    services::notification_service::{LogNotifier, Notifier, PushGatewayNotifier},
    store::{postgres::PgStore, Store},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    init_config()?;
    let config = get_config()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let notifier: Arc<dyn Notifier> = match &config.push_gateway_url {
        Some(url) => {
            info!(%url, "delivering notifications through push gateway");
            Arc::new(PushGatewayNotifier::new(
                url.clone(),
                config.push_gateway_secret.clone(),
            )?)
        }
        None => {
            info!("PUSH_GATEWAY_URL not set, notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let app_state = AppState::new(store, notifier, config.engine_settings(), &config.jwt_secret);

    {
        let state = app_state.clone();
        let expiry = chrono::Duration::days(config.project_expiry_days);
        tokio::spawn(async move {
            loop {
                let cutoff = chrono::Utc::now() - expiry;
                if let Err(e) = state.project_service.find_and_expire(cutoff).await {
                    tracing::error!(error = ?e, "project expiry sweep failed");
                }
                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
            }
        });
    }

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = state.event_service.send_reminders(chrono::Utc::now()).await {
                    tracing::error!(error = ?e, "event reminder sweep failed");
                }
                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
            }
        });
    }

    let app = routes::router(app_state, config.public_rps)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
