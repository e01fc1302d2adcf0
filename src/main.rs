use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use predictwatch::api::router::create_router;
use predictwatch::config::{self, AppConfig, DetectorSettings};
use predictwatch::db::{self, settings_repo};
use predictwatch::feed::FeedClient;
use predictwatch::metrics::init_metrics;
use predictwatch::services::monitor::Monitor;
use predictwatch::services::notifier::Notifier;
use predictwatch::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let app_config = AppConfig::from_env()?;
    let addr = format!("{}:{}", app_config.host, app_config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&app_config.database_url).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = init_metrics();

    // Runtime settings: defaults merged with whatever the last run
    // persisted. A bad persisted value falls back to the defaults.
    let initial = match settings_repo::load_settings(&pool, DetectorSettings::default()).await {
        Ok(loaded) => loaded.validated().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Persisted settings invalid; using defaults");
            DetectorSettings::default()
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load persisted settings; using defaults");
            DetectorSettings::default()
        }
    };
    tracing::info!(
        whale_threshold = %initial.whale_threshold,
        min_coordinated = initial.min_coordinated_wallets,
        poll_interval = initial.poll_interval_secs,
        "Runtime settings loaded"
    );

    let settings = config::shared_settings(initial);
    let pause_flag = Arc::new(AtomicBool::new(false));

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let feed = FeedClient::new(
        http.clone(),
        app_config.feed_base_url.clone(),
        app_config.feed_api_key.clone(),
    );

    let notifier = if app_config.has_telegram() {
        Some(Arc::new(Notifier::new(
            http,
            app_config.telegram_bot_token.clone().unwrap(),
            app_config.telegram_chat_id.clone().unwrap(),
        )))
    } else {
        tracing::warn!("Telegram credentials not set — alerts will be stored but not delivered");
        None
    };

    // Shutdown: signal observed by the monitor at its sleep point, so a
    // batch in flight always completes.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let monitor = Monitor::new(
        pool.clone(),
        feed,
        settings.clone(),
        pause_flag.clone(),
        notifier.clone(),
        app_config.alert_retention_days,
        Duration::from_millis(app_config.notify_pacing_ms),
    );
    tokio::spawn(monitor.run(shutdown_rx));

    let state = AppState {
        db: pool,
        config: app_config,
        settings,
        pause_flag,
        metrics_handle,
        notifier,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
