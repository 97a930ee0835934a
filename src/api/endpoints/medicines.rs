//! `GET /api/medicines/:user_id` — the medicines a user has saved or
//! ordered, joined with the catalogue entry for each.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{medicines_for_user, user_exists};
use crate::models::UserMedicineDetail;

pub async fn medicines(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UserMedicineDetail>>, ApiError> {
    let conn = ctx.open_db()?;
    if !user_exists(&conn, user_id)? {
        return Err(ApiError::NotFound(format!("User {user_id} bulunamadı")));
    }

    Ok(Json(medicines_for_user(&conn, user_id)?))
}
