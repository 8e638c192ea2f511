// src/cache/local.rs
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: Value,
    expires_at: Instant,
    tags: Vec<String>,
}

/// Fast in-process cache layer. Entries expire lazily on read; a zero TTL
/// write behaves as a delete so an expired-on-arrival value is never served.
pub struct LocalCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    tag_index: RwLock<HashMap<String, HashSet<String>>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tag_index: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but has expired; drop it.
        self.remove(key);
        None
    }

    pub fn set(&self, key: &str, value: Value, ttl: Duration, tags: &[String]) {
        if ttl.is_zero() {
            self.remove(key);
            return;
        }

        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
            tags: tags.to_vec(),
        };

        self.entries.write().unwrap().insert(key.to_string(), entry);

        if !tags.is_empty() {
            let mut index = self.tag_index.write().unwrap();
            for tag in tags {
                index
                    .entry(tag.clone())
                    .or_default()
                    .insert(key.to_string());
            }
        }
    }

    pub fn remove(&self, key: &str) {
        let removed = self.entries.write().unwrap().remove(key);
        if let Some(entry) = removed {
            if !entry.tags.is_empty() {
                let mut index = self.tag_index.write().unwrap();
                for tag in &entry.tags {
                    if let Some(keys) = index.get_mut(tag) {
                        keys.remove(key);
                        if keys.is_empty() {
                            index.remove(tag);
                        }
                    }
                }
            }
        }
    }

    /// Remove every key written with the given tag, and no others.
    pub fn invalidate_by_tag(&self, tag: &str) {
        let keys: Vec<String> = {
            let index = self.tag_index.read().unwrap();
            match index.get(tag) {
                Some(keys) => keys.iter().cloned().collect(),
                None => return,
            }
        };

        for key in keys {
            self.remove(&key);
        }
        self.tag_index.write().unwrap().remove(tag);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
        self.tag_index.write().unwrap().clear();
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new()
    }
}
