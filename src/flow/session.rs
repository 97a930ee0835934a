//! Per-session conversational state.
//!
//! Each flow state carries exactly the selections that are valid in it, so a
//! session can never reach time selection without a chosen doctor. The store
//! hands out one shared state cell per session id; request handlers lock the
//! cell for the duration of a turn.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

use super::FlowError;
use crate::models::{Department, Doctor, Hospital};

/// Where a session stands in the appointment flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    Idle,
    DepartmentSuggested {
        department: String,
        urgent: bool,
    },
    HospitalSelection {
        department: Department,
        hospitals: Vec<Hospital>,
    },
    DoctorSelection {
        department: Department,
        hospital: Hospital,
        doctors: Vec<Doctor>,
    },
    DateSelection {
        department: Department,
        hospital: Hospital,
        doctor: Doctor,
    },
    TimeSelection {
        department: Department,
        hospital: Hospital,
        doctor: Doctor,
        date: NaiveDate,
        slots: Vec<String>,
    },
    Confirmation {
        department: Department,
        hospital: Hospital,
        doctor: Doctor,
        date: NaiveDate,
        time: String,
    },
}

impl FlowState {
    /// Wire name of the state, as reported in chat responses.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::DepartmentSuggested { .. } => "DEPARTMENT_SUGGESTED",
            Self::HospitalSelection { .. } => "HOSPITAL_SELECTION",
            Self::DoctorSelection { .. } => "DOCTOR_SELECTION",
            Self::DateSelection { .. } => "DATE_SELECTION",
            Self::TimeSelection { .. } => "TIME_SELECTION",
            Self::Confirmation { .. } => "CONFIRMATION",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub state: FlowState,
    pub patient_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            state: FlowState::Idle,
            patient_name: None,
            updated_at: Utc::now(),
        }
    }
}

impl SessionState {
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// All live sessions, keyed by the opaque per-browser session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state cell for a session, created on first sight.
    pub fn entry(&self, session_id: &str) -> Result<Arc<Mutex<SessionState>>, FlowError> {
        let mut sessions = self.sessions.lock().map_err(|_| FlowError::LockPoisoned)?;
        Ok(sessions.entry(session_id.to_string()).or_default().clone())
    }

    /// Drops sessions untouched for longer than `max_age`. A session whose
    /// cell is currently locked belongs to an in-flight request and is kept.
    pub fn purge_older_than(&self, max_age: chrono::Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(_) => return 0,
        };
        let before = sessions.len();
        sessions.retain(|_, cell| match cell.try_lock() {
            Ok(state) => state.updated_at >= cutoff,
            Err(_) => true,
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_start_idle() {
        let session = SessionState::default();
        assert!(session.state.is_idle());
        assert_eq!(session.state.name(), "IDLE");
        assert!(session.patient_name.is_none());
    }

    #[test]
    fn entry_returns_the_same_cell_for_the_same_id() {
        let store = SessionStore::new();
        let first = store.entry("abc").unwrap();
        let second = store.entry("abc").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sessions_are_isolated_by_id() {
        let store = SessionStore::new();
        let a = store.entry("a").unwrap();
        a.lock().unwrap().state = FlowState::DepartmentSuggested {
            department: "kardiyoloji".into(),
            urgent: false,
        };

        let b = store.entry("b").unwrap();
        assert!(b.lock().unwrap().state.is_idle());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn state_names_match_the_wire_format() {
        let dept = Department {
            id: "kardiyoloji".into(),
            name: "Kardiyoloji".into(),
            icon: "❤️".into(),
        };
        let state = FlowState::HospitalSelection {
            department: dept,
            hospitals: Vec::new(),
        };
        assert_eq!(state.name(), "HOSPITAL_SELECTION");
    }

    #[test]
    fn touch_advances_the_timestamp() {
        let mut session = SessionState::default();
        let before = session.updated_at;
        session.touch();
        assert!(session.updated_at >= before);
    }

    #[test]
    fn purge_drops_stale_sessions_only() {
        let store = SessionStore::new();
        let stale = store.entry("eski").unwrap();
        stale.lock().unwrap().updated_at = Utc::now() - chrono::Duration::hours(2);
        store.entry("taze").unwrap();

        let dropped = store.purge_older_than(chrono::Duration::hours(1));
        assert_eq!(dropped, 1);
        assert_eq!(store.len(), 1);
        assert!(store.entry("taze").unwrap().lock().unwrap().state.is_idle());
    }

    #[test]
    fn purge_keeps_sessions_locked_by_a_request() {
        let store = SessionStore::new();
        let cell = store.entry("mesgul").unwrap();
        let mut guard = cell.lock().unwrap();
        guard.updated_at = Utc::now() - chrono::Duration::hours(2);

        let dropped = store.purge_older_than(chrono::Duration::hours(1));
        assert_eq!(dropped, 0);
        drop(guard);
        assert_eq!(store.len(), 1);
    }
}
