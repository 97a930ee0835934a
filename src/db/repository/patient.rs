//! Lookups for portal users and their health records.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{LabResult, Medicine, User, UserMedicineDetail};

pub fn get_user(conn: &Connection, id: i64) -> Result<User, DatabaseError> {
    conn.query_row(
        "SELECT id, tc_no, name, email, password FROM users WHERE id = ?1",
        params![id],
        map_user_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "User".into(),
            id: id.to_string(),
        },
        other => DatabaseError::Sqlite(other),
    })
}

pub fn get_user_by_tc(conn: &Connection, tc_no: &str) -> Result<User, DatabaseError> {
    conn.query_row(
        "SELECT id, tc_no, name, email, password FROM users WHERE tc_no = ?1",
        params![tc_no],
        map_user_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "User".into(),
            id: tc_no.to_string(),
        },
        other => DatabaseError::Sqlite(other),
    })
}

pub fn user_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        tc_no: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
    })
}

/// Lab results for a user, newest test first.
pub fn lab_results_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, test_type, test_name, value, unit, status, reference_range, test_date
         FROM lab_results
         WHERE user_id = ?1
         ORDER BY test_date DESC, id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(LabResult {
            id: row.get(0)?,
            user_id: row.get(1)?,
            test_type: row.get(2)?,
            test_name: row.get(3)?,
            value: row.get(4)?,
            unit: row.get(5)?,
            status: row.get(6)?,
            reference_range: row.get(7)?,
            test_date: row.get(8)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Medicines the user has saved, joined with the catalogue entry.
pub fn medicines_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<UserMedicineDetail>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.name, m.active_ingredient, m.manufacturer, m.price, m.prescription,
                m.stock, m.usage_note, m.warning, m.indication,
                um.favorited, um.ordered, um.added_at
         FROM user_medicines um
         JOIN medicines m ON m.id = um.medicine_id
         WHERE um.user_id = ?1
         ORDER BY um.added_at DESC, m.id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(UserMedicineDetail {
            medicine: Medicine {
                id: row.get(0)?,
                name: row.get(1)?,
                active_ingredient: row.get(2)?,
                manufacturer: row.get(3)?,
                price: row.get(4)?,
                prescription: row.get(5)?,
                stock: row.get(6)?,
                usage_note: row.get(7)?,
                warning: row.get(8)?,
                indication: row.get(9)?,
            },
            favorited: row.get(10)?,
            ordered: row.get(11)?,
            added_at: row.get(12)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
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
    fn looks_up_user_by_national_id() {
        let conn = seeded();

        let user = get_user_by_tc(&conn, "12345678901").unwrap();
        assert_eq!(user.name, "Kullanıcı 1");
        assert_eq!(user.email, "kullanici1@ornek.com");

        let err = get_user_by_tc(&conn, "00000000000").unwrap_err();
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "User");
                assert_eq!(id, "00000000000");
            }
            other => panic!("Expected NotFound, got: {other}"),
        }
    }

    #[test]
    fn looks_up_user_by_id() {
        let conn = seeded();

        let user = get_user(&conn, 2).unwrap();
        assert_eq!(user.tc_no, "12345678902");
        assert!(user_exists(&conn, 2).unwrap());
        assert!(!user_exists(&conn, 99).unwrap());
    }

    #[test]
    fn lists_lab_results_newest_first() {
        let conn = seeded();

        let results = lab_results_for_user(&conn, 1).unwrap();
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].test_date >= pair[1].test_date);
        }
        assert!(results.iter().any(|r| r.test_name == "Hemoglobin"));

        assert!(lab_results_for_user(&conn, 99).unwrap().is_empty());
    }

    #[test]
    fn lists_saved_medicines_with_flags() {
        let conn = seeded();

        let saved = medicines_for_user(&conn, 1).unwrap();
        assert_eq!(saved.len(), 2);
        let parol = saved
            .iter()
            .find(|d| d.medicine.name == "Parol")
            .expect("Parol linked to user 1");
        assert!(parol.favorited);
        assert!(!parol.ordered);
        assert!(!parol.medicine.prescription);

        let none = medicines_for_user(&conn, 5).unwrap();
        assert!(none.is_empty());
    }
}
