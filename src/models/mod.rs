pub mod patient;
pub mod scheduling;

pub use patient::{LabResult, Medicine, User, UserMedicine, UserMedicineDetail};
pub use scheduling::{
    Appointment, AppointmentDetail, AppointmentStatus, Department, Doctor, Hospital,
};
