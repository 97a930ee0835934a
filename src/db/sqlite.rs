use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

/// Open a SQLite connection to the given path and apply the schema
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConstraintViolation(format!(
                    "cannot create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    apply_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    apply_schema(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Apply the full schema. Every statement is idempotent, so this runs on
/// every open.
pub fn apply_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(include_str!("schema.sql"))?;
    Ok(())
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        // departments, hospitals, doctors, appointments, users, lab_results,
        // medicines, user_medicines (+ sqlite_sequence once AUTOINCREMENT is used)
        let count = count_tables(&conn).unwrap();
        assert!(count >= 8, "Expected at least 8 tables, got {count}");
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = open_memory_database().unwrap();
        assert!(apply_schema(&conn).is_ok());
        assert!(apply_schema(&conn).is_ok());
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn active_slot_index_blocks_duplicates() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO departments (id, name) VALUES ('kardiyoloji', 'Kardiyoloji');
             INSERT INTO hospitals (id, name, location) VALUES (1, 'H', 'L');
             INSERT INTO doctors (id, name, department_id, hospital_id)
                 VALUES (7, 'Dr', 'kardiyoloji', 1);
             INSERT INTO appointments (patient_name, department_id, hospital_id, doctor_id,
                 date, time, status, created_at)
                 VALUES ('a', 'kardiyoloji', 1, 7, '2025-08-15', '09:00', 'active', 'now');",
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO appointments (patient_name, department_id, hospital_id, doctor_id,
                 date, time, status, created_at)
                 VALUES ('b', 'kardiyoloji', 1, 7, '2025-08-15', '09:00', 'active', 'now')",
            [],
        );
        assert!(dup.is_err(), "Second active row for the slot must fail");

        // A cancelled row does not block the slot.
        conn.execute(
            "INSERT INTO appointments (patient_name, department_id, hospital_id, doctor_id,
                 date, time, status, created_at)
                 VALUES ('c', 'kardiyoloji', 1, 7, '2025-08-15', '09:00', 'cancelled', 'now')",
            [],
        )
        .unwrap();
    }
}
