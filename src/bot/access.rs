use std::collections::BTreeSet;
use tracing::warn;

/// The users allowed to talk to the bot. An empty list denies everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    allowed: BTreeSet<i64>,
}

impl AccessList {
    pub fn new(user_ids: impl IntoIterator<Item = i64>) -> Self {
        let allowed: BTreeSet<i64> = user_ids.into_iter().collect();
        if allowed.is_empty() {
            warn!("The list of allowed users is empty, every message will be denied");
        }
        Self { allowed }
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        if self.allowed.is_empty() {
            warn!("Access denied for user {user_id}: the allowed user list is empty");
            return false;
        }
        let allowed = self.allowed.contains(&user_id);
        if !allowed {
            warn!("Access denied for user {user_id}: not in the allowed list");
        }
        allowed
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
