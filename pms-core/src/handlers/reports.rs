use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use serde::Serialize;

use super::{AppState, PageQuery};
use crate::error::AppError;
use crate::models::{Project, ProjectYear};
use crate::query::{paginate, Page};
use crate::stats::{self, RankEntry, YearStats};
use crate::warranty::{self, WarrantyNotice, WarrantyStatus};
use crate::workspace::SyncStatus;

/// A warranted project with its evaluation at request time.
#[derive(Debug, Serialize)]
pub struct WarrantyRow {
    #[serde(flatten)]
    pub project: Project,
    pub warranty: WarrantyStatus,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: YearStats,
    pub split_data: [RankEntry; 2],
}

/// `GET /api/warranty`
pub async fn warranty_listing(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<Page<WarrantyRow>> {
    let projects = state.workspace.projects().await;
    let listing = warranty::warranty_listing(&projects);
    let now = Utc::now();

    let page = paginate(&listing, query.page()).map(|p| WarrantyRow {
        warranty: WarrantyStatus::evaluate(p.warranty_end, now),
        project: p.clone(),
    });
    Json(page)
}

/// `GET /api/warranty/notices`
pub async fn warranty_notices(State(state): State<AppState>) -> Json<Vec<WarrantyNotice>> {
    let notices = state.workspace.notices().await;
    Json(notices.as_ref().clone())
}

/// `GET /api/stats/:year`
pub async fn year_stats(
    State(state): State<AppState>,
    Path(year): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let year = ProjectYear::parse(&year)?;
    let projects = state.workspace.projects().await;
    let stats = stats::year_stats(&projects, &year);

    Ok(Json(StatsResponse {
        split_data: stats.split_data(),
        stats,
    }))
}

/// `GET /api/status`
pub async fn sync_status(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(state.workspace.status().await)
}
