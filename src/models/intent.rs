//! Trip intent resolved from a conversation

use serde::{Deserialize, Serialize};

/// Destination and length of stay the user is asking about
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TripIntent {
    /// Bare city name, `None` when no usable destination was found
    pub destination_city: Option<String>,
    /// Number of days, 0 when unresolved
    pub stay_duration_days: u32,
}

impl TripIntent {
    /// Intent that cannot drive a retrieval
    #[must_use]
    pub fn unresolved() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(destination_city: impl Into<String>, stay_duration_days: u32) -> Self {
        Self {
            destination_city: Some(destination_city.into()),
            stay_duration_days,
        }
    }

    #[must_use]
    pub fn has_destination(&self) -> bool {
        self.destination_city.is_some()
    }
}
