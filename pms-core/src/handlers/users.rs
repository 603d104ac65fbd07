use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};

use super::{AppState, PageQuery};
use crate::auth::{require_admin, CurrentUser};
use crate::error::AppError;
use crate::models::user::InviteUser;
use crate::models::User;
use crate::query::{paginate, Page};
use crate::workspace::Invitation;

/// `GET /api/session`
///
/// The caller as resolved by the auth middleware, role included.
pub async fn session(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

/// `GET /api/users` (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<User>>, AppError> {
    require_admin(&user)?;
    let users = state.workspace.users().await;
    Ok(Json(paginate(users.as_slice(), query.page())))
}

/// `POST /api/users/invite` (admin only)
pub async fn invite_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<InviteUser>,
) -> Result<(StatusCode, Json<Invitation>), AppError> {
    require_admin(&user)?;
    let invitation = state.workspace.invite_user(&body.email).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}
