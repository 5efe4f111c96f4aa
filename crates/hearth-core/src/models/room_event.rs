use std::cmp::{Ordering, Reverse};

use serde::Serialize;

/// A timeline event in one room, under one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomEvent {
    pub event_id: String,
    pub sender_id: String,
    pub date_ts: u64,
    pub content: String,
}

impl Ord for RoomEvent {
    // Newest first.
    fn cmp(&self, other: &Self) -> Ordering {
        (Reverse(self.date_ts), &self.event_id).cmp(&(Reverse(other.date_ts), &other.event_id))
    }
}

impl PartialOrd for RoomEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
