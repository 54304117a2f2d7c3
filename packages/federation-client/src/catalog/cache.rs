//! In-memory option cache keyed by field type.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

use crate::types::FieldType;

#[derive(Debug, Clone)]
struct CacheEntry {
    options: Vec<String>,
    /// Values added locally; survive a refetch.
    added: Vec<String>,
    /// `None` for entries seeded by a local addition, which never count as fresh.
    fetched_at: Option<Instant>,
}

#[derive(Debug)]
pub struct OptionCache {
    ttl: Duration,
    entries: RwLock<HashMap<FieldType, CacheEntry>>,
}

impl OptionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Options fetched within the freshness window.
    pub fn get_fresh(&self, field_type: FieldType) -> Option<Vec<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&field_type)?;
        let fetched_at = entry.fetched_at?;
        (fetched_at.elapsed() < self.ttl).then(|| entry.options.clone())
    }

    /// Whatever is cached, fresh or not.
    pub fn get(&self, field_type: FieldType) -> Option<Vec<String>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&field_type)
            .map(|e| e.options.clone())
    }

    /// Store a fetched list, keeping earlier local additions. Returns the
    /// list as stored.
    pub fn put(&self, field_type: FieldType, options: Vec<String>) -> Vec<String> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let added = entries
            .get(&field_type)
            .map(|e| e.added.clone())
            .unwrap_or_default();

        let mut options = options;
        let mut resort = false;
        for value in &added {
            if !options.contains(value) {
                options.push(value.clone());
                resort = true;
            }
        }
        if resort {
            sort_options(&mut options);
        }

        entries.insert(
            field_type,
            CacheEntry {
                options: options.clone(),
                added,
                fetched_at: Some(Instant::now()),
            },
        );
        options
    }

    /// Append `value` (already trimmed) and re-sort. Seeds the entry with
    /// `seed` when nothing is cached. Returns false if already present.
    pub fn add(&self, field_type: FieldType, value: &str, seed: &[&str]) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(field_type).or_insert_with(|| CacheEntry {
            options: seed.iter().map(|s| s.to_string()).collect(),
            added: Vec::new(),
            fetched_at: None,
        });

        if entry.options.iter().any(|o| o == value) {
            return false;
        }
        entry.options.push(value.to_string());
        entry.added.push(value.to_string());
        sort_options(&mut entry.options);
        true
    }

    /// Drop the fetched state for one key; local additions are kept.
    pub fn invalidate(&self, field_type: FieldType) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(&field_type) {
            entry.fetched_at = None;
        }
    }
}

/// Alphabetical, ignoring case.
pub fn sort_options(options: &mut [String]) {
    options.sort_by_cached_key(|o| o.to_lowercase());
}

/// Predefined entries first, then remote entries not already present.
/// Blank entries are dropped and values compared after trimming.
pub fn merge_options(predefined: &[&str], remote: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(predefined.len() + remote.len());
    let candidates = predefined
        .iter()
        .map(|s| s.trim())
        .chain(remote.iter().map(|s| s.trim()));
    for value in candidates {
        if !value.is_empty() && !merged.iter().any(|m| m == value) {
            merged.push(value.to_string());
        }
    }
    merged
}
