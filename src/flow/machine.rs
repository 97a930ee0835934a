//! The appointment state machine.
//!
//! One `AppointmentFlow` drives a single conversational turn: `try_start`
//! decides whether a fresh answer should open the booking dialogue, and
//! `advance` feeds an utterance to whatever state the session is in. Every
//! transition either lands in a well-defined next state or resets the
//! session to idle; an error can never leave a session stuck mid-flow.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

use super::intent::{self, turkish_fold, IntentClassifier};
use super::session::{FlowState, SessionState};
use super::{slots, FlowError};
use crate::config::SlotMode;
use crate::db::repository::{
    doctors_for, hospitals_for_department, insert_appointment, list_departments, NewAppointment,
};
use crate::db::DatabaseError;
use crate::models::{Department, Doctor, Hospital};

/// Returned whenever a transition fails; the session is reset to idle first.
pub const GENERIC_FAILURE: &str =
    "⚠️ Randevu işlemi sırasında bir sorun oluştu. Lütfen tekrar deneyin.";

/// Booking name used when the session never supplied a patient name.
pub const GUEST_PATIENT: &str = "Misafir";

const NO_ACTIVE_FLOW: &str = "Şu anda aktif bir randevu işlemi yok.";

const CANCELLED: &str = "Randevu işlemi iptal edildi. Başka bir konuda yardımcı olabilirim. 🌿";

const CHANGE_DEPARTMENT: &str =
    "Anladım. Farklı bir bölüm önerebilmem için belirtilerinizi tekrar yazar mısınız?";

const CONFIRM_REPROMPT: &str =
    "Randevu almak istiyorsanız \"evet\", istemiyorsanız \"hayır\" yazmanız yeterli.";

const BOOKING_REPROMPT: &str =
    "Randevuyu onaylamak için \"evet\", iptal etmek için \"hayır\" yazın.";

pub struct AppointmentFlow<'a> {
    conn: &'a Connection,
    intent: &'a dyn IntentClassifier,
    slot_mode: SlotMode,
    today: NaiveDate,
}

impl<'a> AppointmentFlow<'a> {
    pub fn new(conn: &'a Connection, intent: &'a dyn IntentClassifier, slot_mode: SlotMode) -> Self {
        Self {
            conn,
            intent,
            slot_mode,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin "today" for date resolution instead of the wall clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Opens the booking dialogue when an idle session shows strong
    /// appointment intent and the answer names a department. Returns the
    /// confirmation prompt to append to the answer, or `None` when the flow
    /// does not start.
    pub fn try_start(
        &self,
        session: &mut SessionState,
        utterance: &str,
        answer: &str,
    ) -> Option<String> {
        if !session.state.is_idle() {
            return None;
        }
        let score = self.intent.classify(utterance, answer);
        if !score.should_start() {
            return None;
        }
        let department = self.intent.extract_department(answer)?;
        tracing::info!(%department, urgent = score.urgent, "starting appointment flow");

        let prompt = if score.urgent {
            format!(
                "🚨 Durumunuz acil görünüyor. {department} bölümünden hemen randevu oluşturalım mı? (Evet/Hayır)"
            )
        } else {
            format!("📅 {department} bölümünden randevu almak ister misiniz? (Evet/Hayır)")
        };
        session.state = FlowState::DepartmentSuggested {
            department,
            urgent: score.urgent,
        };
        session.touch();
        Some(prompt)
    }

    /// Feeds one utterance to the session's current state and returns the
    /// reply. On any transition error the session resets to idle and the
    /// user gets a generic failure message.
    pub fn advance(&self, session: &mut SessionState, utterance: &str) -> String {
        let state = std::mem::take(&mut session.state);
        let patient = session
            .patient_name
            .clone()
            .unwrap_or_else(|| GUEST_PATIENT.to_string());

        match self.step(state, &patient, utterance) {
            Ok((next, reply)) => {
                session.state = next;
                session.touch();
                reply
            }
            Err(e) => {
                // `take` already left the session idle.
                tracing::error!("appointment flow transition failed: {e}");
                session.touch();
                GENERIC_FAILURE.to_string()
            }
        }
    }

    fn step(
        &self,
        state: FlowState,
        patient: &str,
        utterance: &str,
    ) -> Result<(FlowState, String), FlowError> {
        match state {
            FlowState::Idle => Ok((FlowState::Idle, NO_ACTIVE_FLOW.into())),
            FlowState::DepartmentSuggested { department, urgent } => {
                self.on_department_suggested(department, urgent, utterance)
            }
            FlowState::HospitalSelection {
                department,
                hospitals,
            } => self.on_hospital_selection(department, hospitals, utterance),
            FlowState::DoctorSelection {
                department,
                hospital,
                doctors,
            } => self.on_doctor_selection(department, hospital, doctors, utterance),
            FlowState::DateSelection {
                department,
                hospital,
                doctor,
            } => self.on_date_selection(department, hospital, doctor, utterance),
            FlowState::TimeSelection {
                department,
                hospital,
                doctor,
                date,
                slots,
            } => self.on_time_selection(department, hospital, doctor, date, slots, utterance),
            FlowState::Confirmation {
                department,
                hospital,
                doctor,
                date,
                time,
            } => self.on_confirmation(department, hospital, doctor, date, time, patient, utterance),
        }
    }

    fn on_department_suggested(
        &self,
        department: String,
        urgent: bool,
        utterance: &str,
    ) -> Result<(FlowState, String), FlowError> {
        // "farklı bölüm olur mu" contains an affirmative word, so the change
        // check has to run first.
        if intent::wants_change(utterance) {
            return Ok((FlowState::Idle, CHANGE_DEPARTMENT.into()));
        }
        if intent::is_negative(utterance) {
            return Ok((FlowState::Idle, CANCELLED.into()));
        }
        if intent::is_affirmative(utterance) {
            let Some(matched) = self.match_department(&department)? else {
                let reply = format!(
                    "Üzgünüm, \"{department}\" bölümü sistemimizde bulunamadı. \
                     Belirtilerinizi tekrar yazarsanız yeni bir öneri yapabilirim."
                );
                return Ok((FlowState::Idle, reply));
            };
            let hospitals = hospitals_for_department(self.conn, &matched.id)?;
            if hospitals.is_empty() {
                let reply = format!(
                    "Üzgünüm, şu anda {} bölümü için uygun hastane bulunamadı. \
                     Daha sonra tekrar deneyebilirsiniz.",
                    matched.name
                );
                return Ok((FlowState::Idle, reply));
            }
            let reply = render_hospital_list(&matched, &hospitals);
            return Ok((
                FlowState::HospitalSelection {
                    department: matched,
                    hospitals,
                },
                reply,
            ));
        }
        Ok((
            FlowState::DepartmentSuggested { department, urgent },
            CONFIRM_REPROMPT.into(),
        ))
    }

    fn on_hospital_selection(
        &self,
        department: Department,
        hospitals: Vec<Hospital>,
        utterance: &str,
    ) -> Result<(FlowState, String), FlowError> {
        let Some(picked) = select_from(&hospitals, utterance, |h| &h.name) else {
            let reply = format!(
                "Lütfen listeden bir hastane seçin (numarasını yazmanız yeterli):\n\n{}",
                hospital_lines(&hospitals)
            );
            return Ok((
                FlowState::HospitalSelection {
                    department,
                    hospitals,
                },
                reply,
            ));
        };

        let hospital = hospitals[picked].clone();
        let doctors = doctors_for(self.conn, &department.id, hospital.id)?;
        if doctors.is_empty() {
            let reply = format!(
                "Üzgünüm, {} için {} bölümünde doktor bulunamadı. \
                 Lütfen başka bir hastane seçin:\n\n{}",
                hospital.name,
                department.name,
                hospital_lines(&hospitals)
            );
            return Ok((
                FlowState::HospitalSelection {
                    department,
                    hospitals,
                },
                reply,
            ));
        }
        let reply = render_doctor_list(&hospital, &doctors);
        Ok((
            FlowState::DoctorSelection {
                department,
                hospital,
                doctors,
            },
            reply,
        ))
    }

    fn on_doctor_selection(
        &self,
        department: Department,
        hospital: Hospital,
        doctors: Vec<Doctor>,
        utterance: &str,
    ) -> Result<(FlowState, String), FlowError> {
        let Some(picked) = select_from(&doctors, utterance, |d| &d.name) else {
            let reply = format!(
                "Lütfen listeden bir doktor seçin (numarasını yazmanız yeterli):\n\n{}",
                doctor_lines(&doctors)
            );
            return Ok((
                FlowState::DoctorSelection {
                    department,
                    hospital,
                    doctors,
                },
                reply,
            ));
        };

        let doctor = doctors[picked].clone();
        let reply = format!(
            "👨‍⚕️ {} seçildi.\n\n📅 Hangi gün gelmek istersiniz? \
             (\"bugün\", \"yarın\" ya da \"bu hafta\" yazabilirsiniz)",
            doctor.name
        );
        Ok((
            FlowState::DateSelection {
                department,
                hospital,
                doctor,
            },
            reply,
        ))
    }

    fn on_date_selection(
        &self,
        department: Department,
        hospital: Hospital,
        doctor: Doctor,
        utterance: &str,
    ) -> Result<(FlowState, String), FlowError> {
        let date = slots::resolve_date(utterance, self.today);
        let times = slots::available_times(self.conn, doctor.id, date, self.slot_mode)?;
        if times.is_empty() {
            let reply = format!(
                "Üzgünüm, {} için uygun saat kalmamış. Başka bir gün deneyin \
                 (\"bugün\", \"yarın\", \"bu hafta\").",
                format_date(date)
            );
            return Ok((
                FlowState::DateSelection {
                    department,
                    hospital,
                    doctor,
                },
                reply,
            ));
        }
        let reply = render_slot_list(date, &times);
        Ok((
            FlowState::TimeSelection {
                department,
                hospital,
                doctor,
                date,
                slots: times,
            },
            reply,
        ))
    }

    fn on_time_selection(
        &self,
        department: Department,
        hospital: Hospital,
        doctor: Doctor,
        date: NaiveDate,
        slots: Vec<String>,
        utterance: &str,
    ) -> Result<(FlowState, String), FlowError> {
        let Some(picked) = select_from(&slots, utterance, |s| s.as_str()) else {
            let reply = format!("Lütfen listeden bir saat seçin:\n\n{}", slot_lines(&slots));
            return Ok((
                FlowState::TimeSelection {
                    department,
                    hospital,
                    doctor,
                    date,
                    slots,
                },
                reply,
            ));
        };

        let time = slots[picked].clone();
        let reply = render_summary(&department, &hospital, &doctor, date, &time);
        Ok((
            FlowState::Confirmation {
                department,
                hospital,
                doctor,
                date,
                time,
            },
            reply,
        ))
    }

    fn on_confirmation(
        &self,
        department: Department,
        hospital: Hospital,
        doctor: Doctor,
        date: NaiveDate,
        time: String,
        patient: &str,
        utterance: &str,
    ) -> Result<(FlowState, String), FlowError> {
        if intent::is_negative(utterance) {
            return Ok((FlowState::Idle, CANCELLED.into()));
        }
        if intent::is_affirmative(utterance) {
            let new = NewAppointment {
                patient_name: patient.to_string(),
                department_id: department.id.clone(),
                hospital_id: hospital.id,
                doctor_id: doctor.id,
                date,
                time: time.clone(),
            };
            return match insert_appointment(self.conn, &new) {
                Ok(id) => {
                    tracing::info!(appointment_id = id, doctor = %doctor.name, "appointment booked");
                    let reply = format!(
                        "✅ Randevunuz oluşturuldu!\n\n📋 Randevu No: {id}\n🏥 {}\n👨‍⚕️ {}\n📅 {} - {}\n\nGeçmiş olsun! 🌿",
                        hospital.name,
                        doctor.name,
                        format_date(date),
                        time
                    );
                    Ok((FlowState::Idle, reply))
                }
                Err(DatabaseError::ConstraintViolation(_)) => {
                    let reply = format!(
                        "Üzgünüm, {time} saati az önce doldu. \
                         Yeni bir randevu için tekrar yazabilirsiniz."
                    );
                    Ok((FlowState::Idle, reply))
                }
                Err(other) => Err(FlowError::Database(other)),
            };
        }
        Ok((
            FlowState::Confirmation {
                department,
                hospital,
                doctor,
                date,
                time,
            },
            BOOKING_REPROMPT.into(),
        ))
    }

    /// Resolves an extracted department name against the known departments:
    /// by id, by folded display name, or by containment either way.
    fn match_department(&self, extracted: &str) -> Result<Option<Department>, FlowError> {
        let extracted = extracted.trim();
        let departments = list_departments(self.conn)?;
        Ok(departments.into_iter().find(|d| {
            let folded_name = turkish_fold(&d.name);
            d.id == extracted
                || folded_name == extracted
                || folded_name.contains(extracted)
                || extracted.contains(&d.id)
        }))
    }
}

/// Numeric-then-substring selection. A number is 1-based and bounds-checked;
/// out of range means no selection, without falling through to text
/// matching. Otherwise the item is picked when its name appears in the
/// utterance or any utterance word of three or more characters appears in
/// the name.
fn select_from<T>(items: &[T], utterance: &str, name: impl Fn(&T) -> &str) -> Option<usize> {
    let folded = turkish_fold(utterance);
    let trimmed = folded.trim();

    if let Ok(number) = trimmed.parse::<usize>() {
        return (number >= 1 && number <= items.len()).then(|| number - 1);
    }

    for (i, item) in items.iter().enumerate() {
        if trimmed.contains(&turkish_fold(name(item))) {
            return Some(i);
        }
    }
    for (i, item) in items.iter().enumerate() {
        let folded_name = turkish_fold(name(item));
        let matched = trimmed
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word.len() >= 3 && folded_name.contains(word));
        if matched {
            return Some(i);
        }
    }
    None
}

fn hospital_lines(hospitals: &[Hospital]) -> String {
    hospitals
        .iter()
        .enumerate()
        .map(|(i, h)| {
            format!(
                "{}. 🏥 {} ({}, {} km, ⭐ {})",
                i + 1,
                h.name,
                h.location,
                h.distance_km,
                h.rating
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn doctor_lines(doctors: &[Doctor]) -> String {
    doctors
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                "{}. 👨‍⚕️ {} ({} yıl deneyim, ⭐ {})",
                i + 1,
                d.name,
                d.experience_years,
                d.rating
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn slot_lines(slots: &[String]) -> String {
    slots
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. 🕐 {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_hospital_list(department: &Department, hospitals: &[Hospital]) -> String {
    format!(
        "{} {} bölümü için uygun hastaneler:\n\n{}\n\nLütfen numarasını yazarak hastane seçin.",
        department.icon,
        department.name,
        hospital_lines(hospitals)
    )
}

fn render_doctor_list(hospital: &Hospital, doctors: &[Doctor]) -> String {
    format!(
        "🏥 {} doktorları:\n\n{}\n\nLütfen numarasını yazarak doktor seçin.",
        hospital.name,
        doctor_lines(doctors)
    )
}

fn render_slot_list(date: NaiveDate, slots: &[String]) -> String {
    format!(
        "📅 {} için uygun saatler:\n\n{}\n\nLütfen numara ya da saat yazarak seçin.",
        format_date(date),
        slot_lines(slots)
    )
}

fn render_summary(
    department: &Department,
    hospital: &Hospital,
    doctor: &Doctor,
    date: NaiveDate,
    time: &str,
) -> String {
    format!(
        "📋 Randevu özeti:\n\n🏥 Hastane: {}\n👨‍⚕️ Doktor: {}\n{} Bölüm: {}\n📅 Tarih: {}\n🕐 Saat: {}\n\nOnaylıyor musunuz? (Evet/Hayır)",
        hospital.name,
        doctor.name,
        department.icon,
        department.name,
        format_date(date),
        time
    )
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::appointments_for_patient;
    use crate::db::seed::seed_demo_data;
    use crate::db::sqlite::open_memory_database;
    use crate::flow::intent::KeywordIntent;

    const CARDIOLOGY_ANSWER: &str =
        "🔍 Ön Değerlendirme: Göğüs ağrısı\n🏥 Başvuru Birimi: Kardiyoloji\n📝 Açıklama: ...";

    fn seeded() -> Connection {
        let conn = open_memory_database().unwrap();
        seed_demo_data(&conn).unwrap();
        conn
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Tuesday, the day after the pinned "today".
    fn tomorrow() -> NaiveDate {
        date(2025, 8, 12)
    }

    /// A flow pinned to Monday 2025-08-11 so "yarın" always lands on a
    /// bookable Tuesday.
    fn flow<'a>(conn: &'a Connection, intent: &'a KeywordIntent) -> AppointmentFlow<'a> {
        AppointmentFlow::new(conn, intent, SlotMode::Booked).with_today(date(2025, 8, 11))
    }

    #[test]
    fn strong_intent_with_department_starts_the_flow() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();

        let prompt = flow
            .try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();
        assert!(prompt.contains("kardiyoloji"));
        assert_eq!(session.state.name(), "DEPARTMENT_SUGGESTED");
        match &session.state {
            FlowState::DepartmentSuggested { department, urgent } => {
                assert_eq!(department, "kardiyoloji");
                assert!(!urgent);
            }
            other => panic!("Expected DepartmentSuggested, got {other:?}"),
        }
    }

    #[test]
    fn no_department_in_answer_means_no_flow() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();

        let prompt = flow.try_start(&mut session, "randevu istiyorum", "Bol su için ve dinlenin.");
        assert!(prompt.is_none());
        assert!(session.state.is_idle());
    }

    #[test]
    fn weak_intent_does_not_start() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();

        assert!(flow
            .try_start(&mut session, "teşekkürler", CARDIOLOGY_ANSWER)
            .is_none());
        assert!(session.state.is_idle());
    }

    #[test]
    fn mid_flow_sessions_are_not_restarted() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();

        assert!(flow
            .try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .is_none());
    }

    #[test]
    fn full_booking_path_persists_an_appointment() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();

        let reply = flow.advance(&mut session, "evet");
        assert!(reply.contains("Ankara Şehir Hastanesi"));
        assert!(reply.contains("Hacettepe Üniversitesi Hastanesi"));
        assert_eq!(session.state.name(), "HOSPITAL_SELECTION");

        let reply = flow.advance(&mut session, "2");
        assert!(reply.contains("Uz. Dr. Ali Damar"));
        assert_eq!(session.state.name(), "DOCTOR_SELECTION");
        match &session.state {
            FlowState::DoctorSelection { hospital, .. } => {
                assert_eq!(hospital.id, 2);
            }
            other => panic!("Expected DoctorSelection, got {other:?}"),
        }

        let reply = flow.advance(&mut session, "1");
        assert!(reply.contains("Hangi gün"));
        assert_eq!(session.state.name(), "DATE_SELECTION");

        let reply = flow.advance(&mut session, "yarın");
        assert!(reply.contains("09:00"));
        assert_eq!(session.state.name(), "TIME_SELECTION");
        match &session.state {
            FlowState::TimeSelection { date, slots, .. } => {
                assert_eq!(*date, tomorrow());
                assert_eq!(slots.len(), 21);
            }
            other => panic!("Expected TimeSelection, got {other:?}"),
        }

        let reply = flow.advance(&mut session, "1");
        assert!(reply.contains("Randevu özeti"));
        assert!(reply.contains("Hacettepe"));
        assert!(reply.contains("Kardiyoloji"));
        assert!(reply.contains("12.08.2025"));
        assert!(reply.contains("09:00"));
        assert_eq!(session.state.name(), "CONFIRMATION");

        let reply = flow.advance(&mut session, "evet");
        assert!(reply.contains("Randevu No"), "got: {reply}");
        assert!(session.state.is_idle());

        let booked = appointments_for_patient(&conn, GUEST_PATIENT).unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].doctor_name, "Uz. Dr. Ali Damar");
        assert_eq!(booked[0].date, tomorrow());
        assert_eq!(booked[0].time, "09:00");
    }

    #[test]
    fn out_of_range_number_reprompts_without_moving() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        // Orthopedics sits in three hospitals.
        flow.try_start(
            &mut session,
            "randevu istiyorum",
            "🏥 Başvuru Birimi: Ortopedi",
        )
        .unwrap();
        flow.advance(&mut session, "evet");
        match &session.state {
            FlowState::HospitalSelection { hospitals, .. } => assert_eq!(hospitals.len(), 3),
            other => panic!("Expected HospitalSelection, got {other:?}"),
        }

        let reply = flow.advance(&mut session, "99");
        assert_eq!(session.state.name(), "HOSPITAL_SELECTION");
        assert!(reply.contains("Lütfen listeden bir hastane seçin"));

        flow.advance(&mut session, "2");
        match &session.state {
            FlowState::DoctorSelection { hospital, .. } => assert_eq!(hospital.id, 2),
            other => panic!("Expected DoctorSelection, got {other:?}"),
        }
    }

    #[test]
    fn hospital_can_be_picked_by_name() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();
        flow.advance(&mut session, "evet");

        flow.advance(&mut session, "hacettepe olsun");
        match &session.state {
            FlowState::DoctorSelection { hospital, .. } => {
                assert_eq!(hospital.name, "Hacettepe Üniversitesi Hastanesi");
            }
            other => panic!("Expected DoctorSelection, got {other:?}"),
        }
    }

    #[test]
    fn time_can_be_picked_literally() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();
        flow.advance(&mut session, "evet");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "yarın");

        flow.advance(&mut session, "13:00 bana uyar");
        match &session.state {
            FlowState::Confirmation { time, .. } => assert_eq!(time, "13:00"),
            other => panic!("Expected Confirmation, got {other:?}"),
        }
    }

    #[test]
    fn negative_answer_cancels_the_flow() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();

        let reply = flow.advance(&mut session, "hayır");
        assert_eq!(reply, CANCELLED);
        assert!(session.state.is_idle());
    }

    #[test]
    fn change_request_resets_for_new_symptoms() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();

        let reply = flow.advance(&mut session, "farklı bölüm olur mu");
        assert_eq!(reply, CHANGE_DEPARTMENT);
        assert!(session.state.is_idle());
    }

    #[test]
    fn unclear_confirmation_reprompts_in_place() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();

        let reply = flow.advance(&mut session, "belki daha sonra");
        assert_eq!(reply, CONFIRM_REPROMPT);
        assert_eq!(session.state.name(), "DEPARTMENT_SUGGESTED");
    }

    #[test]
    fn unknown_department_apologizes_and_resets() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", "Başvuru Birimi: Üroloji")
            .unwrap();

        let reply = flow.advance(&mut session, "evet");
        assert!(reply.contains("bulunamadı"));
        assert!(session.state.is_idle());
    }

    #[test]
    fn store_failure_mid_flow_resets_to_idle() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();

        conn.execute_batch("PRAGMA foreign_keys=OFF; DROP TABLE hospitals;")
            .unwrap();
        let reply = flow.advance(&mut session, "evet");
        assert_eq!(reply, GENERIC_FAILURE);
        assert!(session.state.is_idle());
    }

    #[test]
    fn slot_taken_during_confirmation_resets_gently() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();
        flow.advance(&mut session, "evet");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "yarın");
        flow.advance(&mut session, "1");
        assert_eq!(session.state.name(), "CONFIRMATION");

        // Someone grabs the slot between summary and confirmation.
        let racing = NewAppointment {
            patient_name: "Başka Hasta".into(),
            department_id: "kardiyoloji".into(),
            hospital_id: 1,
            doctor_id: 1,
            date: tomorrow(),
            time: "09:00".into(),
        };
        insert_appointment(&conn, &racing).unwrap();

        let reply = flow.advance(&mut session, "evet");
        assert!(reply.contains("doldu"), "got: {reply}");
        assert!(session.state.is_idle());
        assert!(appointments_for_patient(&conn, GUEST_PATIENT).unwrap().is_empty());
    }

    #[test]
    fn booked_slots_disappear_from_the_listing() {
        let conn = seeded();
        let taken = NewAppointment {
            patient_name: "Erken Gelen".into(),
            department_id: "kardiyoloji".into(),
            hospital_id: 1,
            doctor_id: 1,
            date: date(2025, 8, 12),
            time: "09:00".into(),
        };
        insert_appointment(&conn, &taken).unwrap();

        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();
        flow.advance(&mut session, "evet");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "yarın");

        match &session.state {
            FlowState::TimeSelection { slots, .. } => {
                assert_eq!(slots.len(), 20);
                assert!(!slots.contains(&"09:00".to_string()));
                assert_eq!(slots[0], "09:20");
            }
            other => panic!("Expected TimeSelection, got {other:?}"),
        }
    }

    #[test]
    fn session_patient_name_is_used_for_the_booking() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();
        session.patient_name = Some("Ayşe Yılmaz".into());
        flow.try_start(&mut session, "randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();
        flow.advance(&mut session, "evet");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "bugün");
        flow.advance(&mut session, "1");
        flow.advance(&mut session, "tamam");

        let booked = appointments_for_patient(&conn, "Ayşe Yılmaz").unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].date, date(2025, 8, 11));
    }

    #[test]
    fn urgent_intent_gets_the_urgent_prompt() {
        let conn = seeded();
        let intent = KeywordIntent;
        let flow = flow(&conn, &intent);
        let mut session = SessionState::default();

        let prompt = flow
            .try_start(&mut session, "acil randevu istiyorum", CARDIOLOGY_ANSWER)
            .unwrap();
        assert!(prompt.contains("🚨"));
        match &session.state {
            FlowState::DepartmentSuggested { urgent, .. } => assert!(urgent),
            other => panic!("Expected DepartmentSuggested, got {other:?}"),
        }
    }
}
