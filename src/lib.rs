pub mod api;
pub mod config;
pub mod db;
pub mod detectors;
pub mod errors;
pub mod feed;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::{AppConfig, SharedSettings};
use crate::services::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub settings: SharedSettings,
    pub pause_flag: Arc<AtomicBool>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub notifier: Option<Arc<Notifier>>,
}
