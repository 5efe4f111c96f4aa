use std::cmp::{Ordering, Reverse};

use serde::Serialize;

/// Membership of one user in one room, under one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub user_id: String,
    pub display_name: String,
    pub power_level: i64,
    pub typing: bool,
}

impl Ord for Member {
    // Admins and moderators before plain members, then by name.
    fn cmp(&self, other: &Self) -> Ordering {
        (
            Reverse(self.power_level),
            self.display_name.to_lowercase(),
            &self.user_id,
        )
            .cmp(&(
                Reverse(other.power_level),
                other.display_name.to_lowercase(),
                &other.user_id,
            ))
    }
}

impl PartialOrd for Member {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
