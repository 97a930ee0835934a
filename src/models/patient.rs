use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered patient. `tc_no` is the national identity number used by
/// the simulated e-Devlet / e-Nabız logins. The password never serializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub tc_no: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// One laboratory result row. `status` carries the display value shown to
/// the patient ("Normal", "Yüksek", ...), not a coded flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub id: i64,
    pub user_id: i64,
    pub test_type: String,
    pub test_name: String,
    pub value: String,
    pub unit: String,
    pub status: String,
    pub reference_range: String,
    pub test_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub active_ingredient: String,
    pub manufacturer: String,
    pub price: f64,
    pub prescription: bool,
    pub stock: i64,
    pub usage_note: String,
    pub warning: String,
    pub indication: String,
}

/// Link row between a user and a medicine they saved or ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMedicine {
    pub id: i64,
    pub user_id: i64,
    pub medicine_id: i64,
    pub favorited: bool,
    pub ordered: bool,
    pub added_at: DateTime<Utc>,
}

/// A user's medicine joined with the catalogue entry, as listed to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMedicineDetail {
    pub medicine: Medicine,
    pub favorited: bool,
    pub ordered: bool,
    pub added_at: DateTime<Utc>,
}
