//! Conversational appointment booking.
//!
//! A per-session state machine walks the user from a department suggestion
//! (picked up from the assistant's answer) through hospital, doctor, date and
//! time selection to a confirmed booking. `intent` decides when to start the
//! flow, `session` holds the per-browser state, `slots` resolves dates and
//! free times against the scheduling store, and `machine` drives the turns.

pub mod intent;
pub mod machine;
pub mod session;
pub mod slots;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("scheduling store error: {0}")]
    Database(#[from] DatabaseError),

    #[error("session lock poisoned")]
    LockPoisoned,
}
