use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentDetail, AppointmentStatus};

/// Shown to the user when the requested slot already has an active booking.
pub const SLOT_TAKEN: &str = "Bu saat dolu";

/// Insert payload. `time` must be an HH:MM slot label.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_name: String,
    pub department_id: String,
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
}

/// Insert an appointment, rejecting a double booking of the same
/// (doctor, date, time) while an active row exists. The partial unique
/// index backs the explicit check, so a racing insert still fails cleanly.
pub fn insert_appointment(conn: &Connection, new: &NewAppointment) -> Result<i64, DatabaseError> {
    if NaiveTime::parse_from_str(&new.time, "%H:%M").is_err() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "geçersiz saat biçimi: {}",
            new.time
        )));
    }

    let taken: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND date = ?2 AND time = ?3 AND status = 'active'",
        params![new.doctor_id, new.date, new.time],
        |row| row.get(0),
    )?;
    if taken > 0 {
        return Err(DatabaseError::ConstraintViolation(SLOT_TAKEN.into()));
    }

    let result = conn.execute(
        "INSERT INTO appointments
             (patient_name, department_id, hospital_id, doctor_id, date, time, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active', ?7)",
        params![
            new.patient_name,
            new.department_id,
            new.hospital_id,
            new.doctor_id,
            new.date,
            new.time,
            Utc::now().to_rfc3339(),
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::ConstraintViolation(SLOT_TAKEN.into()))
        }
        Err(other) => Err(DatabaseError::Sqlite(other)),
    }
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Appointment, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_name, department_id, hospital_id, doctor_id, date, time, status, created_at
         FROM appointments WHERE id = ?1",
    )?;
    stmt.query_row(params![id], map_appointment_row).map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        },
        other => DatabaseError::Sqlite(other),
    })
}

fn map_appointment_row(row: &rusqlite::Row<'_>) -> Result<Appointment, rusqlite::Error> {
    let status: String = row.get(7)?;
    let status: AppointmentStatus = status.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unknown appointment status: {status}").into(),
        )
    })?;
    Ok(Appointment {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        department_id: row.get(2)?,
        hospital_id: row.get(3)?,
        doctor_id: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        status,
        created_at: row.get(8)?,
    })
}

/// Active booking times for a doctor on a date, for slot subtraction.
pub fn booked_times(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT time FROM appointments
         WHERE doctor_id = ?1 AND date = ?2 AND status = 'active'
         ORDER BY time",
    )?;
    let rows = stmt.query_map(params![doctor_id, date], |row| row.get(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Count of active appointments for a doctor on a date (day-capacity check).
pub fn count_active_on_day(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND date = ?2 AND status = 'active'",
        params![doctor_id, date],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// A patient's active appointments joined with display fields.
pub fn appointments_for_patient(
    conn: &Connection,
    patient_name: &str,
) -> Result<Vec<AppointmentDetail>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.patient_name, dep.name, h.name, d.name, a.date, a.time, a.status,
                a.created_at
         FROM appointments a
         JOIN departments dep ON dep.id = a.department_id
         JOIN hospitals h ON h.id = a.hospital_id
         JOIN doctors d ON d.id = a.doctor_id
         WHERE a.patient_name = ?1 AND a.status = 'active'
         ORDER BY a.date, a.time",
    )?;
    let rows = stmt.query_map(params![patient_name], |row| {
        let status: String = row.get(7)?;
        let status: AppointmentStatus = status.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                format!("unknown appointment status: {status}").into(),
            )
        })?;
        Ok(AppointmentDetail {
            id: row.get(0)?,
            patient_name: row.get(1)?,
            department_name: row.get(2)?,
            hospital_name: row.get(3)?,
            doctor_name: row.get(4)?,
            date: row.get(5)?,
            time: row.get(6)?,
            status,
            created_at: row.get(8)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
