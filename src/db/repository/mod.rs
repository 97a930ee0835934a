pub mod appointment;
pub mod patient;
pub mod scheduling;

pub use appointment::*;
pub use patient::*;
pub use scheduling::*;
