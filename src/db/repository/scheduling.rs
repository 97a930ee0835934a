use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Department, Doctor, Hospital};

pub fn list_departments(conn: &Connection) -> Result<Vec<Department>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, icon FROM departments ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            icon: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_department(conn: &Connection, id: &str) -> Result<Department, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, icon FROM departments WHERE id = ?1")?;
    stmt.query_row(params![id], |row| {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            icon: row.get(2)?,
        })
    })
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Department".into(),
            id: id.into(),
        },
        other => DatabaseError::Sqlite(other),
    })
}

/// Hospitals offering a department: those with at least one doctor in it.
pub fn hospitals_for_department(
    conn: &Connection,
    department_id: &str,
) -> Result<Vec<Hospital>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT h.id, h.name, h.location, h.distance_km, h.rating
         FROM hospitals h
         JOIN doctors d ON d.hospital_id = h.id
         WHERE d.department_id = ?1
         ORDER BY h.id",
    )?;
    let rows = stmt.query_map(params![department_id], |row| {
        Ok(Hospital {
            id: row.get(0)?,
            name: row.get(1)?,
            location: row.get(2)?,
            distance_km: row.get(3)?,
            rating: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn doctors_for(
    conn: &Connection,
    department_id: &str,
    hospital_id: i64,
) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, experience_years, rating, department_id, hospital_id
         FROM doctors
         WHERE department_id = ?1 AND hospital_id = ?2
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![department_id, hospital_id], |row| {
        Ok(Doctor {
            id: row.get(0)?,
            name: row.get(1)?,
            experience_years: row.get(2)?,
            rating: row.get(3)?,
            department_id: row.get(4)?,
            hospital_id: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Doctor, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, experience_years, rating, department_id, hospital_id
         FROM doctors WHERE id = ?1",
    )?;
    stmt.query_row(params![id], |row| {
        Ok(Doctor {
            id: row.get(0)?,
            name: row.get(1)?,
            experience_years: row.get(2)?,
            rating: row.get(3)?,
            department_id: row.get(4)?,
            hospital_id: row.get(5)?,
        })
    })
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        },
        other => DatabaseError::Sqlite(other),
    })
}
