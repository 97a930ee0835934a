use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// A medical department. The id is a stable slug ("kardiyoloji"), not a
/// numeric key, so corpus answers can reference departments by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub distance_km: f64,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub experience_years: i64,
    pub rating: f64,
    pub department_id: String,
    pub hospital_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Active,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(DatabaseError::InvalidEnum {
                field: "AppointmentStatus".into(),
                value: s.into(),
            }),
        }
    }
}

/// A booked appointment. `time` is a slot label from the fixed template
/// ("09:20"), validated as HH:MM at the insert boundary and stored as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_name: String,
    pub department_id: String,
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// An appointment joined with its display fields, as listed to patients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetail {
    pub id: i64,
    pub patient_name: String,
    pub department_name: String,
    pub hospital_name: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            AppointmentStatus::Active,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ] {
            assert_eq!(AppointmentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_invalid_enum() {
        let err = AppointmentStatus::from_str("pending").unwrap_err();
        match err {
            DatabaseError::InvalidEnum { field, value } => {
                assert_eq!(field, "AppointmentStatus");
                assert_eq!(value, "pending");
            }
            other => panic!("Expected InvalidEnum, got: {other}"),
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&AppointmentStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }
}
