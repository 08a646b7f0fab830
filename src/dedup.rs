//! Message-id de-duplication cache
//!
//! Cross-posted articles show up in every group that carries them. The
//! scoring engine consults an opaque cache: an id already recorded under a
//! different newsgroup short-circuits straight to the kill score. The cache
//! itself is a host concern; [`HashIdCache`] is the trivial map-backed
//! implementation most hosts want.

use std::collections::HashMap;

/// Outcome of a message-id lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStatus {
    /// First time this id has been seen
    Unseen,
    /// Already recorded under the same newsgroup (a reload, not a crosspost)
    SeenHere,
    /// Already recorded under a different newsgroup
    SeenElsewhere,
}

/// Opaque message-id lookup consumed by the evaluator
pub trait MessageIdCache {
    /// Record `message_id` under `group` and report whether it was already
    /// known
    fn check(&mut self, message_id: &str, group: &str) -> IdStatus;

    /// Forget everything
    fn clear(&mut self);
}

/// Map-backed message-id cache
///
/// Remembers the first newsgroup each id was seen under.
#[must_use]
#[derive(Debug, Default)]
pub struct HashIdCache {
    seen: HashMap<String, String>,
}

impl HashIdCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl MessageIdCache for HashIdCache {
    fn check(&mut self, message_id: &str, group: &str) -> IdStatus {
        if message_id.is_empty() {
            return IdStatus::Unseen;
        }
        match self.seen.get(message_id) {
            Some(first) if first == group => IdStatus::SeenHere,
            Some(_) => IdStatus::SeenElsewhere,
            None => {
                self.seen
                    .insert(message_id.to_string(), group.to_string());
                IdStatus::Unseen
            }
        }
    }

    fn clear(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_is_unseen() {
        let mut cache = HashIdCache::new();
        assert_eq!(cache.check("<a@b>", "comp.lang.rust"), IdStatus::Unseen);
    }

    #[test]
    fn test_same_group_is_seen_here() {
        let mut cache = HashIdCache::new();
        cache.check("<a@b>", "comp.lang.rust");
        assert_eq!(cache.check("<a@b>", "comp.lang.rust"), IdStatus::SeenHere);
    }

    #[test]
    fn test_crosspost_is_seen_elsewhere() {
        let mut cache = HashIdCache::new();
        cache.check("<a@b>", "comp.lang.rust");
        assert_eq!(cache.check("<a@b>", "alt.test"), IdStatus::SeenElsewhere);
    }

    #[test]
    fn test_empty_id_never_matches() {
        let mut cache = HashIdCache::new();
        assert_eq!(cache.check("", "a"), IdStatus::Unseen);
        assert_eq!(cache.check("", "b"), IdStatus::Unseen);
        assert!(cache.is_empty());
    }
}
