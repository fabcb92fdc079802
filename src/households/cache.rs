use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Process-lifetime cache of user identities already verified to belong to a
/// household, so the guard check can skip the membership lookup after the
/// first hit. Invalidation is explicit: leaveHousehold calls `reset`.
#[derive(Clone, Default)]
pub struct GuardCache {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl GuardCache {
    pub fn mark(&self, user_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.to_string());
    }

    pub fn is_marked(&self, user_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(user_id)
    }

    pub fn reset(&self, user_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_reset() {
        let cache = GuardCache::default();
        assert!(!cache.is_marked("u1"));

        cache.mark("u1");
        assert!(cache.is_marked("u1"));
        assert!(!cache.is_marked("u2"));

        cache.reset("u1");
        assert!(!cache.is_marked("u1"));
    }

    #[test]
    fn test_reset_unknown_user_is_noop() {
        let cache = GuardCache::default();
        cache.reset("nobody");
        assert!(!cache.is_marked("nobody"));
    }
}
