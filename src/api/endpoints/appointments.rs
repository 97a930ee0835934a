//! Appointment booking endpoints, used by the booking screens.
//!
//! - `GET /api/departments`
//! - `GET /api/hospitals/:department_id`
//! - `GET /api/doctors/:department_id/:hospital_id`
//! - `GET /api/available-dates/:doctor_id`
//! - `GET /api/available-times/:doctor_id/:date`
//! - `POST /api/appointments`
//! - `GET /api/appointments/:patient`
//!
//! List endpoints serialize the catalogue models as-is. A booking conflict
//! is a 409, not a generic client error.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{
    appointments_for_patient, doctors_for, get_doctor, hospitals_for_department,
    insert_appointment, list_departments, NewAppointment,
};
use crate::flow::slots;
use crate::models::{AppointmentDetail, Department, Doctor, Hospital};

/// `GET /api/departments` — every bookable department.
pub async fn departments(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(list_departments(&conn)?))
}

/// `GET /api/hospitals/:department_id` — hospitals with at least one doctor
/// in the department. Unknown departments yield an empty list.
pub async fn hospitals(
    State(ctx): State<ApiContext>,
    Path(department_id): Path<String>,
) -> Result<Json<Vec<Hospital>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(hospitals_for_department(&conn, &department_id)?))
}

/// `GET /api/doctors/:department_id/:hospital_id`
pub async fn doctors(
    State(ctx): State<ApiContext>,
    Path((department_id, hospital_id)): Path<(String, i64)>,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(doctors_for(&conn, &department_id, hospital_id)?))
}

/// `GET /api/available-dates/:doctor_id` — bookable dates in the coming
/// window. Unlike the listings above, an unknown doctor here is a 404.
pub async fn available_dates(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
    let conn = ctx.open_db()?;
    get_doctor(&conn, doctor_id)?;

    let today = Utc::now().date_naive();
    Ok(Json(slots::available_dates(&conn, doctor_id, today)?))
}

/// `GET /api/available-times/:doctor_id/:date` — free slots on a date.
pub async fn available_times(
    State(ctx): State<ApiContext>,
    Path((doctor_id, date)): Path<(i64, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    let date = parse_date(&date)?;
    let conn = ctx.open_db()?;
    get_doctor(&conn, doctor_id)?;

    Ok(Json(slots::available_times(
        &conn,
        doctor_id,
        date,
        ctx.state.config.slot_mode,
    )?))
}

#[derive(Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_name: Option<String>,
    pub department_id: Option<String>,
    pub hospital_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Serialize)]
pub struct CreateAppointmentResponse {
    pub success: bool,
    pub appointment_id: i64,
    pub message: &'static str,
}

/// `POST /api/appointments` — conflict-checked insert. A taken slot comes
/// back as 409 with the Turkish slot-taken message in the body.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<Json<CreateAppointmentResponse>, ApiError> {
    let patient_name = required(req.patient_name, "patient_name")?;
    let department_id = required(req.department_id, "department_id")?;
    let hospital_id = required(req.hospital_id, "hospital_id")?;
    let doctor_id = required(req.doctor_id, "doctor_id")?;
    let date = parse_date(&required(req.date, "date")?)?;
    let time = required(req.time, "time")?;
    if NaiveTime::parse_from_str(&time, "%H:%M").is_err() {
        return Err(ApiError::BadRequest(format!("geçersiz saat biçimi: {time}")));
    }

    let conn = ctx.open_db()?;
    let appointment_id = insert_appointment(
        &conn,
        &NewAppointment {
            patient_name,
            department_id,
            hospital_id,
            doctor_id,
            date,
            time,
        },
    )?;

    tracing::info!(appointment_id, doctor_id, "appointment booked over the API");
    Ok(Json(CreateAppointmentResponse {
        success: true,
        appointment_id,
        message: "Randevu başarıyla oluşturuldu",
    }))
}

/// `GET /api/appointments/:patient` — the patient's active bookings with
/// display names joined in.
pub async fn for_patient(
    State(ctx): State<ApiContext>,
    Path(patient): Path<String>,
) -> Result<Json<Vec<AppointmentDetail>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(appointments_for_patient(&conn, &patient)?))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("{field} gerekli")))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("geçersiz tarih biçimi: {raw}")))
}
