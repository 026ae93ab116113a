//! Tag Index Module
//!
//! Many-to-many relation between tag names and cache keys. The index never
//! owns values; the store consults it to find which keys to drop and keeps
//! it in sync on every removal.

use std::collections::{BTreeSet, HashMap};

// == Tag Index ==
#[derive(Debug, Default)]
pub struct TagIndex {
    /// tag -> keys carrying it
    by_tag: HashMap<String, BTreeSet<String>>,
    /// key -> tags it carries
    by_key: HashMap<String, BTreeSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Attach ==
    /// Adds `key` to each tag's key set. Blank tags are skipped.
    pub fn attach<S: AsRef<str>>(&mut self, key: &str, tags: &[S]) {
        for tag in tags.iter().map(AsRef::as_ref) {
            if tag.is_empty() {
                continue;
            }
            self.by_tag
                .entry(tag.to_string())
                .or_default()
                .insert(key.to_string());
            self.by_key
                .entry(key.to_string())
                .or_default()
                .insert(tag.to_string());
        }
    }

    // == Detach ==
    /// Removes `key` from every tag referencing it, dropping emptied tags.
    pub fn detach(&mut self, key: &str) {
        let Some(tags) = self.by_key.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(&tag);
                }
            }
        }
    }

    // == Take Tag ==
    /// Removes a tag and returns the keys it referenced.
    ///
    /// The keys keep their other tags; callers delete them through the store,
    /// which detaches them from the rest of the index.
    pub fn take_tag(&mut self, tag: &str) -> Vec<String> {
        let keys = self.by_tag.remove(tag).unwrap_or_default();
        for key in &keys {
            if let Some(tags) = self.by_key.get_mut(key) {
                tags.remove(tag);
                if tags.is_empty() {
                    self.by_key.remove(key);
                }
            }
        }
        keys.into_iter().collect()
    }

    // == Matching Keys ==
    /// Tracked keys matching `pattern`.
    ///
    /// A trailing `*` turns the pattern into a prefix match; anything else
    /// must match the whole key.
    pub fn matching_keys(&self, pattern: &str) -> Vec<String> {
        match pattern.strip_suffix('*') {
            Some(prefix) => self
                .by_key
                .keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect(),
            None => self
                .by_key
                .get_key_value(pattern)
                .map(|(key, _)| vec![key.clone()])
                .unwrap_or_default(),
        }
    }

    // == Accessors ==
    pub fn keys_for(&self, tag: &str) -> Vec<String> {
        self.by_tag
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn tags_for(&self, key: &str) -> Vec<String> {
        self.by_key
            .get(key)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    pub fn tracked_key_count(&self) -> usize {
        self.by_key.len()
    }

    pub fn clear(&mut self) {
        self.by_tag.clear();
        self.by_key.clear();
    }
}
