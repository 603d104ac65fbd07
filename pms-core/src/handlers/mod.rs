//! HTTP surface consumed by the dashboard front-end.

pub mod health;
pub mod projects;
pub mod reports;
pub mod users;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::AppConfig;
use crate::workspace::Workspace;

/// Application state shared with every handler.
#[derive(Clone)]
pub struct AppState {
    /// Cached collections and the store behind them
    pub workspace: Arc<Workspace>,
    pub config: Arc<AppConfig>,
}

/// `?page=` on paginated listings. Missing means the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

impl PageQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

/// Creates the main application router.
///
/// Everything under `/api` requires a bearer token; `/health` routes are
/// public.
///
/// # Arguments
///
/// * `state` - The application state containing the workspace and config
///
/// # Returns
///
/// Returns a configured Axum Router.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/session", get(users::session))
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/projects/export", get(projects::export_projects))
        .route("/api/projects/next-id", get(projects::next_id))
        .route("/api/projects/options", get(projects::form_options))
        .route("/api/projects/preview", post(projects::preview_project))
        .route(
            "/api/projects/:doc_id",
            put(projects::update_project).delete(projects::delete_project),
        )
        .route("/api/warranty", get(reports::warranty_listing))
        .route("/api/warranty/notices", get(reports::warranty_notices))
        .route("/api/stats/:year", get(reports::year_stats))
        .route("/api/status", get(reports::sync_status))
        .route("/api/users", get(users::list_users))
        .route("/api/users/invite", post(users::invite_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::jwt_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/store", get(health::store_health_check))
        .merge(api)
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
