use std::cmp::Ordering;

use serde::Serialize;

/// A logged-in account, shown as a section header in the main pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Account {
    /// A fresh account entry; the display name defaults to the user id until
    /// the profile is fetched.
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            display_name: user_id.clone(),
            user_id,
            avatar_url: None,
        }
    }
}

impl Ord for Account {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.display_name.to_lowercase(), &self.user_id)
            .cmp(&(other.display_name.to_lowercase(), &other.user_id))
    }
}

impl PartialOrd for Account {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_display_name_then_id() {
        let mut a = Account::new("@zed:example.org");
        a.display_name = "Alice".into();
        let b = Account::new("@bob:example.org");

        assert!(a < b, "display name wins over user id");
    }
}
