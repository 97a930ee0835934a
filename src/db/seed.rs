//! Demo seed data: an Ankara hospital roster, demo patients with lab
//! results, and a small medicine catalogue. Loaded behind the `seed_demo`
//! config flag; every insert is `OR IGNORE`, so reseeding an existing
//! database is a no-op.

use chrono::Utc;
use rusqlite::{params, Connection};

use super::DatabaseError;

pub fn seed_demo_data(conn: &Connection) -> Result<(), DatabaseError> {
    seed_departments(conn)?;
    seed_hospitals(conn)?;
    seed_doctors(conn)?;
    seed_users(conn)?;
    seed_lab_results(conn)?;
    seed_medicines(conn)?;
    Ok(())
}

fn seed_departments(conn: &Connection) -> Result<(), DatabaseError> {
    let departments = [
        ("kardiyoloji", "Kardiyoloji", "❤️"),
        ("ortopedi", "Ortopedi", "🦴"),
        ("noroloji", "Nöroloji", "🧠"),
        ("dahiliye", "Dahiliye", "🩺"),
        ("goz", "Göz Hastalıkları", "👁️"),
        ("kulak", "Kulak Burun Boğaz", "👂"),
    ];
    for (id, name, icon) in departments {
        conn.execute(
            "INSERT OR IGNORE INTO departments (id, name, icon) VALUES (?1, ?2, ?3)",
            params![id, name, icon],
        )?;
    }
    Ok(())
}

fn seed_hospitals(conn: &Connection) -> Result<(), DatabaseError> {
    let hospitals = [
        (1, "Ankara Şehir Hastanesi", "Bilkent, Ankara", 2.5, 4.8),
        (2, "Hacettepe Üniversitesi Hastanesi", "Sıhhiye, Ankara", 3.2, 4.9),
        (3, "Gazi Üniversitesi Hastanesi", "Beşevler, Ankara", 4.1, 4.7),
        (4, "Ankara Üniversitesi Hastanesi", "Cebeci, Ankara", 3.8, 4.6),
    ];
    for (id, name, location, distance_km, rating) in hospitals {
        conn.execute(
            "INSERT OR IGNORE INTO hospitals (id, name, location, distance_km, rating)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, location, distance_km, rating],
        )?;
    }
    Ok(())
}

fn seed_doctors(conn: &Connection) -> Result<(), DatabaseError> {
    let doctors = [
        (1, "Prof. Dr. Mehmet Kardiyak", 25, 4.9, "kardiyoloji", 1),
        (2, "Doç. Dr. Ayşe Kalp", 15, 4.8, "kardiyoloji", 1),
        (3, "Uz. Dr. Ali Damar", 12, 4.7, "kardiyoloji", 2),
        (4, "Prof. Dr. Fatma Ritim", 20, 4.8, "kardiyoloji", 2),
        (5, "Prof. Dr. Fatma Kemik", 20, 4.8, "ortopedi", 1),
        (6, "Doç. Dr. Emre Eklem", 18, 4.9, "ortopedi", 2),
        (7, "Uz. Dr. Zeynep Kas", 10, 4.6, "ortopedi", 3),
        (8, "Prof. Dr. Ahmet Omurga", 22, 4.7, "ortopedi", 1),
        (9, "Prof. Dr. Selim Beyin", 28, 4.9, "noroloji", 2),
        (10, "Doç. Dr. Elif Sinir", 16, 4.8, "noroloji", 3),
        (11, "Uz. Dr. Can Refleks", 14, 4.7, "noroloji", 4),
        (12, "Prof. Dr. Hasan İç", 25, 4.8, "dahiliye", 1),
        (13, "Doç. Dr. Merve Genel", 18, 4.7, "dahiliye", 2),
        (14, "Uz. Dr. Kemal Sistem", 12, 4.6, "dahiliye", 3),
    ];
    for (id, name, experience_years, rating, department_id, hospital_id) in doctors {
        conn.execute(
            "INSERT OR IGNORE INTO doctors
                 (id, name, experience_years, rating, department_id, hospital_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, name, experience_years, rating, department_id, hospital_id],
        )?;
    }
    Ok(())
}

fn seed_users(conn: &Connection) -> Result<(), DatabaseError> {
    for i in 1..=5 {
        conn.execute(
            "INSERT OR IGNORE INTO users (tc_no, name, email, password)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                format!("1234567890{i}"),
                format!("Kullanıcı {i}"),
                format!("kullanici{i}@ornek.com"),
                "sifre123",
            ],
        )?;
    }
    Ok(())
}

fn seed_lab_results(conn: &Connection) -> Result<(), DatabaseError> {
    // Fixed assignment instead of the usual random demo spread, so tests
    // can rely on what each user sees.
    let results = [
        (1, "Hemogram", "Hemoglobin", "14.2", "g/dL", "Normal", "12-16"),
        (1, "Biyokimya", "Glukoz", "110", "mg/dL", "Uyarı", "70-99"),
        (2, "Biyokimya", "Kolesterol", "190", "mg/dL", "Normal", "125-200"),
        (2, "Hemogram", "Trombosit", "250", "10^3/uL", "Normal", "150-400"),
        (3, "Biyokimya", "Üre", "35", "mg/dL", "Normal", "10-50"),
    ];
    let today = Utc::now().date_naive().to_string();
    for (user_id, test_type, test_name, value, unit, status, range) in results {
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM lab_results WHERE user_id = ?1 AND test_name = ?2",
            params![user_id, test_name],
            |row| row.get(0),
        )?;
        if exists == 0 {
            conn.execute(
                "INSERT INTO lab_results
                     (user_id, test_type, test_name, value, unit, status, reference_range, test_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![user_id, test_type, test_name, value, unit, status, range, today],
            )?;
        }
    }
    Ok(())
}

fn seed_medicines(conn: &Connection) -> Result<(), DatabaseError> {
    let medicines = [
        (
            1,
            "Parol",
            "Parasetamol",
            "ABC İlaç",
            15.0,
            false,
            100,
            "Ağrı kesici ve ateş düşürücü olarak kullanılır.",
            "Hamilelikte dikkatli kullanılmalı.",
            "Baş ağrısı, ateş, kas ağrıları",
        ),
        (
            2,
            "Amoksilin",
            "Amoksisilin",
            "XYZ İlaç",
            25.0,
            true,
            40,
            "Bakteriyel enfeksiyonlarda kullanılır.",
            "Alerjik reaksiyon riski vardır.",
            "Üst solunum yolu enfeksiyonları, idrar yolu enfeksiyonları",
        ),
    ];
    for (id, name, ingredient, manufacturer, price, prescription, stock, usage, warning, indication) in
        medicines
    {
        conn.execute(
            "INSERT OR IGNORE INTO medicines
                 (id, name, active_ingredient, manufacturer, price, prescription, stock,
                  usage_note, warning, indication)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                name,
                ingredient,
                manufacturer,
                price,
                prescription as i32,
                stock,
                usage,
                warning,
                indication,
            ],
        )?;
    }

    let now = Utc::now().to_rfc3339();
    let links = [(1, 1, true, false), (1, 2, false, true), (2, 2, true, true), (3, 1, false, false)];
    for (user_id, medicine_id, favorited, ordered) in links {
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_medicines WHERE user_id = ?1 AND medicine_id = ?2",
            params![user_id, medicine_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            conn.execute(
                "INSERT INTO user_medicines (user_id, medicine_id, favorited, ordered, added_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, medicine_id, favorited as i32, ordered as i32, now],
            )?;
        }
    }
    Ok(())
}
