use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use orderscope_core::{
    build_dashboard, load_dataset_cached, DashboardConfig, DashboardOptions, DashboardView,
    DatasetPaths, StatusSelection,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct AppState {
    paths: DatasetPaths,
    options: DashboardOptions,
}

impl AppState {
    pub fn new(paths: DatasetPaths, options: DashboardOptions) -> Self {
        Self { paths, options }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Comma-separated statuses. Absent selects everything; present but empty selects
    /// nothing.
    statuses: Option<String>,
    #[serde(default)]
    show_raw: bool,
}

impl DashboardQuery {
    fn into_config(self) -> DashboardConfig {
        let selected_statuses = match self.statuses {
            None => StatusSelection::All,
            Some(list) => StatusSelection::only(
                list.split(',')
                    .map(str::trim)
                    .filter(|status| !status.is_empty()),
            ),
        };
        DashboardConfig {
            selected_statuses,
            show_raw: self.show_raw,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusesResponse {
    statuses: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/statuses", get(statuses))
        .route("/api/dashboard", get(dashboard))
        .with_state(Arc::new(state))
}

pub async fn serve(settings: &Settings) -> Result<()> {
    let state = AppState::new(settings.dataset_paths(), settings.dashboard.clone());
    let listener = TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn statuses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusesResponse>, StatusCode> {
    run_pipeline(state, |state| {
        let dataset = load_dataset_cached(&state.paths)?;
        Ok(StatusesResponse {
            statuses: dataset.distinct_statuses()?,
        })
    })
    .await
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, StatusCode> {
    let config = query.into_config();
    run_pipeline(state, move |state| {
        let dataset = load_dataset_cached(&state.paths)?;
        build_dashboard(&dataset, &config, &state.options)
    })
    .await
}

/// Loading and the polars work are blocking, so each request runs on the blocking pool.
async fn run_pipeline<T, F>(state: Arc<AppState>, work: F) -> Result<Json<T>, StatusCode>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> orderscope_core::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(state.as_ref()))
        .await
        .map_err(|err| {
            error!("pipeline task panicked: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .map_err(|err| {
            error!("pipeline failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
