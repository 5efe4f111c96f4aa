use std::cmp::Ordering;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Uploading,
    Done,
    Error,
}

/// A file upload in progress in one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upload {
    pub id: String,
    pub filepath: String,
    pub total_size: u64,
    pub uploaded: u64,
    pub status: UploadStatus,
    pub started_ts: u64,
}

impl Ord for Upload {
    // Oldest upload first, so the queue order is visible.
    fn cmp(&self, other: &Self) -> Ordering {
        (self.started_ts, &self.id).cmp(&(other.started_ts, &other.id))
    }
}

impl PartialOrd for Upload {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
