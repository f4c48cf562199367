//! Timestamp - Totally ordered logical time
//!
//! A Lamport timestamp as carried on every stamped event:
//! - Independent of wall-clock time
//! - Strictly increasing across successive stamps on one clock
//! - Zero means "absent" (server-synthesized events carry no candidate)

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical-clock value.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The absent candidate. No stamped event ever carries this value.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Largest candidate accepted from a client.
    ///
    /// Half the `u64` range stays in reserve, so a client cannot push the
    /// clock to the point where the next stamp overflows.
    pub const MAX_CANDIDATE: Timestamp = Timestamp(u64::MAX >> 1);

    /// Creates a timestamp with the given value.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// True for the absent candidate.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
