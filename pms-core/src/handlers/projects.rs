use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::export::{projects_csv, EXPORT_FILE_NAME};
use crate::models::project::{ENGINEERS, OTHER_ENGINEER, PAYMENT_BANKS, PROJECT_YEARS};
use crate::models::{Project, ProjectId, ProjectInput, ProjectStatus};
use crate::query::{ListView, Page, ProjectFilter};
use crate::workspace::DraftPreview;

/// Listing parameters: `?search=&engineer=&status=&page=`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub engineer: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<ProjectStatus>,
    pub page: Option<usize>,
}

/// An empty `status=` means no status filter, like an empty `engineer=`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<ProjectStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            let value: serde::de::value::StrDeserializer<'_, D::Error> =
                raw.trim().into_deserializer();
            ProjectStatus::deserialize(value).map(Some)
        }
        _ => Ok(None),
    }
}

/// Choices offered by the project form.
#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub years: &'static [&'static str],
    pub engineers: &'static [&'static str],
    pub other_engineer: &'static str,
    pub payment_banks: &'static [&'static str],
}

impl ListQuery {
    fn filter(&self) -> ProjectFilter {
        ProjectFilter {
            search: self.search.clone().unwrap_or_default(),
            engineer: self.engineer.clone().filter(|e| !e.is_empty()),
            status: self.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    /// Record being edited, if any
    pub doc_id: Option<Uuid>,
}

/// `GET /api/projects`
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Page<Project>> {
    let projects = state.workspace.projects().await;

    let filter = query.filter();
    let mut view = ListView::default();
    view.set_search(filter.search);
    view.set_engineer(filter.engineer);
    view.set_status(filter.status);
    view.go_to(query.page.unwrap_or(1), &projects);

    Json(view.render(&projects))
}

/// `GET /api/projects/export`
///
/// CSV of the filtered listing in listing order.
pub async fn export_projects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let projects = state.workspace.projects().await;
    let filtered = query.filter().apply(&projects);
    info!("Exporting {} projects", filtered.len());

    let csv = projects_csv(filtered);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response()
}

/// `POST /api/projects`
pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let project = state.workspace.create_project(input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// `PUT /api/projects/:doc_id`
pub async fn update_project(
    State(state): State<AppState>,
    Path(doc_id): Path<Uuid>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, AppError> {
    let project = state.workspace.update_project(doc_id, input).await?;
    Ok(Json(project))
}

/// `DELETE /api/projects/:doc_id`
pub async fn delete_project(
    State(state): State<AppState>,
    Path(doc_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.workspace.delete_project(doc_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/projects/options`
pub async fn form_options() -> Json<FormOptions> {
    Json(FormOptions {
        years: &PROJECT_YEARS,
        engineers: &ENGINEERS,
        other_engineer: OTHER_ENGINEER,
        payment_banks: &PAYMENT_BANKS,
    })
}

/// `GET /api/projects/next-id`
pub async fn next_id(State(state): State<AppState>) -> Json<serde_json::Value> {
    let id: ProjectId = state.workspace.next_id().await;
    Json(serde_json::json!({ "id": id }))
}

/// `POST /api/projects/preview`
pub async fn preview_project(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<DraftPreview>, AppError> {
    let preview = state.workspace.preview(input, query.doc_id).await?;
    Ok(Json(preview))
}
