//! `GET /api/lab-results/:user_id` — a user's laboratory results, newest
//! test first. Unknown users are a 404; a known user with no results gets
//! an empty list.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{lab_results_for_user, user_exists};
use crate::models::LabResult;

pub async fn lab_results(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<LabResult>>, ApiError> {
    let conn = ctx.open_db()?;
    if !user_exists(&conn, user_id)? {
        return Err(ApiError::NotFound(format!("User {user_id} bulunamadı")));
    }

    Ok(Json(lab_results_for_user(&conn, user_id)?))
}
