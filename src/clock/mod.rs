//! Logical time for aerochat
//!
//! - `Timestamp`: totally ordered logical time carried on every event
//! - `LamportClock`: the server's single stamping counter
//! - `ObservedClock`: client-side max-seen tracker for causal candidates

mod lamport;
mod timestamp;

pub use lamport::{LamportClock, ObservedClock};
pub use timestamp::Timestamp;
