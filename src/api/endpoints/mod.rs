pub mod appointments;
pub mod auth;
pub mod chat;
pub mod health;
pub mod labs;
pub mod medicines;
