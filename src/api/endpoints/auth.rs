//! Simulated sign-in endpoints.
//!
//! `POST /login` — staff sign-in against a fixed demo credential table
//! `POST /edevlet-login` — simulated e-Devlet citizen sign-in
//! `POST /enabiz-login` — simulated e-Nabız citizen sign-in
//!
//! All of this is demo plumbing: plaintext credentials, no sessions, no
//! rate limiting. Every failure mode returns the same message so the
//! endpoints leak nothing about which part was wrong.

use axum::extract::State;
use axum::Json;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::patient;
use crate::db::DatabaseError;
use crate::models::User;

const STAFF_CREDENTIALS: [(&str, &str); 4] = [
    ("doktor1", "1234"),
    ("hemsire2", "abcd"),
    ("admin3", "admin"),
    ("danisman4", "9876"),
];

const STAFF_LOGIN_FAILED: &str = "❌ Kullanıcı adı veya şifre hatalı.";
const PORTAL_LOGIN_FAILED: &str = "❌ TC Kimlik No veya şifre hatalı.";

#[derive(Deserialize)]
pub struct StaffLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct StaffLoginResponse {
    pub success: bool,
    pub username: String,
}

/// `POST /login` — staff sign-in against the embedded demo table.
pub async fn login(
    Json(req): Json<StaffLoginRequest>,
) -> Result<Json<StaffLoginResponse>, ApiError> {
    if !verify_staff(&req.username, &req.password) {
        return Err(ApiError::Unauthorized(STAFF_LOGIN_FAILED.into()));
    }

    tracing::info!(username = %req.username, "staff login");
    Ok(Json(StaffLoginResponse {
        success: true,
        username: req.username,
    }))
}

#[derive(Deserialize)]
pub struct PortalLoginRequest {
    #[serde(default)]
    pub tc_no: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct PortalLoginResponse {
    pub success: bool,
    pub user: User,
}

/// `POST /edevlet-login` — citizen sign-in by national identity number.
pub async fn edevlet_login(
    State(ctx): State<ApiContext>,
    Json(req): Json<PortalLoginRequest>,
) -> Result<Json<PortalLoginResponse>, ApiError> {
    portal_login(&ctx, req)
}

/// `POST /enabiz-login` — same contract as the e-Devlet route; the portals
/// differ only in branding.
pub async fn enabiz_login(
    State(ctx): State<ApiContext>,
    Json(req): Json<PortalLoginRequest>,
) -> Result<Json<PortalLoginResponse>, ApiError> {
    portal_login(&ctx, req)
}

fn portal_login(
    ctx: &ApiContext,
    req: PortalLoginRequest,
) -> Result<Json<PortalLoginResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let user = verify_portal(&conn, req.tc_no.trim(), req.password.trim())?;

    tracing::info!(user_id = user.id, "portal login");
    Ok(Json(PortalLoginResponse {
        success: true,
        user,
    }))
}

fn verify_staff(username: &str, password: &str) -> bool {
    STAFF_CREDENTIALS
        .iter()
        .any(|(u, p)| *u == username && *p == password)
}

/// The account must exist and both fields must be filled in. The password
/// value itself is never compared; the portal this simulates accepted any
/// non-empty password for a known citizen.
fn verify_portal(
    conn: &Connection,
    tc_no: &str,
    password: &str,
) -> Result<User, ApiError> {
    if tc_no.is_empty() || password.is_empty() {
        return Err(ApiError::Unauthorized(PORTAL_LOGIN_FAILED.into()));
    }
    match patient::get_user_by_tc(conn, tc_no) {
        Ok(user) => Ok(user),
        Err(DatabaseError::NotFound { .. }) => {
            Err(ApiError::Unauthorized(PORTAL_LOGIN_FAILED.into()))
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::seed_demo_data;
    use crate::db::sqlite::open_memory_database;

    fn seeded() -> Connection {
        let conn = open_memory_database().unwrap();
        seed_demo_data(&conn).unwrap();
        conn
    }

    #[test]
    fn staff_table_accepts_exact_pairs_only() {
        assert!(verify_staff("doktor1", "1234"));
        assert!(verify_staff("admin3", "admin"));
        assert!(!verify_staff("doktor1", "4321"));
        assert!(!verify_staff("doktor9", "1234"));
        assert!(!verify_staff("", ""));
    }

    #[test]
    fn portal_accepts_known_citizen_with_any_password() {
        let conn = seeded();

        let user = verify_portal(&conn, "12345678903", "tamamen-yanlis").unwrap();
        assert_eq!(user.name, "Kullanıcı 3");
        assert_eq!(user.tc_no, "12345678903");
    }

    #[test]
    fn portal_rejects_empty_fields_and_unknown_ids() {
        let conn = seeded();

        let empty_pw = verify_portal(&conn, "12345678901", "").unwrap_err();
        assert!(matches!(empty_pw, ApiError::Unauthorized(_)));

        let empty_tc = verify_portal(&conn, "", "sifre123").unwrap_err();
        assert!(matches!(empty_tc, ApiError::Unauthorized(_)));

        let unknown = verify_portal(&conn, "99999999999", "sifre123").unwrap_err();
        match unknown {
            ApiError::Unauthorized(msg) => assert_eq!(msg, PORTAL_LOGIN_FAILED),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn serialized_portal_response_never_leaks_the_password() {
        let conn = seeded();
        let user = verify_portal(&conn, "12345678901", "sifre123").unwrap();

        let body = serde_json::to_string(&PortalLoginResponse {
            success: true,
            user,
        })
        .unwrap();
        assert!(body.contains("12345678901"));
        assert!(!body.contains("sifre123"));
    }
}
