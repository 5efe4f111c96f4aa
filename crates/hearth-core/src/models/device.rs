use std::cmp::Ordering;

use serde::Serialize;

/// One device of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub device_id: String,
    pub display_name: String,
    pub trusted: bool,
    pub last_seen_ts: u64,
}

impl Ord for Device {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.display_name.to_lowercase(), &self.device_id)
            .cmp(&(other.display_name.to_lowercase(), &other.device_id))
    }
}

impl PartialOrd for Device {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
