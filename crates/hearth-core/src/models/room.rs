use std::cmp::{Ordering, Reverse};

use serde::Serialize;

/// A joined room under one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub room_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub topic: String,
    /// Timestamp of the latest event, for recency ordering.
    pub last_event_ts: u64,
}

impl Room {
    pub fn new(room_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            display_name: display_name.into(),
            avatar_url: None,
            topic: String::new(),
            last_event_ts: 0,
        }
    }
}

impl Ord for Room {
    // Most recently active first, then name, then id.
    fn cmp(&self, other: &Self) -> Ordering {
        (
            Reverse(self.last_event_ts),
            self.display_name.to_lowercase(),
            &self.room_id,
        )
            .cmp(&(
                Reverse(other.last_event_ts),
                other.display_name.to_lowercase(),
                &other.room_id,
            ))
    }
}

impl PartialOrd for Room {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
