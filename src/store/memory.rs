use std::collections::HashMap;
use std::ops::Bound;

use log::trace;

use crate::skip_list::SkipList;
use crate::store::Store;
use crate::{Error, Result};

#[cfg(test)]
mod tests;

/// Hashes and sorted sets held in process. Sorted-set entries are
/// `(score, member)` pairs: a member can sit at several scores, adding an
/// identical pair twice keeps one copy.
#[derive(Debug, Default)]
pub struct MemoryStore {
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, SkipList<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash_len(&self, key: &str) -> usize {
        self.hashes.get(key).map_or(0, |h| h.len())
    }

    pub fn hash_field(&self, key: &str, field: &str) -> Option<&str> {
        self.hashes
            .get(key)
            .and_then(|h| h.get(field))
            .map(String::as_str)
    }

    pub fn set_len(&self, key: &str) -> usize {
        self.sets.get(key).map_or(0, |s| s.len())
    }

    /// Entries of sorted set `key` in score order.
    pub fn entries(&self, key: &str) -> Vec<(f64, String)> {
        match self.sets.get(key) {
            Some(set) => set.iter().map(|(s, m)| (s, m.clone())).collect(),
            None => Vec::new(),
        }
    }

    /// Number of entries of sorted set `key` with a score in `[min, max]`,
    /// bounds written as for [`Store::zrem_range_by_score`].
    pub fn count_by_score(&self, key: &str, min: &str, max: &str) -> Result<usize> {
        let range = (parse_bound(min)?, parse_bound(max)?);
        Ok(self.sets.get(key).map_or(0, |s| s.count_in_range(range)))
    }
}

impl Store for MemoryStore {
    fn hset(&mut self, key: &str, field: &str, value: i64) -> Result<()> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hget(&mut self, key: &str, field: &str) -> Result<String> {
        self.hash_field(key, field)
            .map(str::to_string)
            .ok_or_else(|| Error::FieldMissing {
                key: key.to_string(),
                field: field.to_string(),
            })
    }

    fn zadd(&mut self, key: &str, score: f64, member: &str) -> Result<()> {
        if score.is_nan() {
            return Err(Error::InvalidScore(score.to_string()));
        }
        let set = self.sets.entry(key.to_string()).or_default();
        let member = member.to_string();
        if !set.contains(&member, score) {
            set.insert(member, score);
        }
        Ok(())
    }

    fn zrem_range_by_score(&mut self, key: &str, min: &str, max: &str) -> Result<usize> {
        let range = (parse_bound(min)?, parse_bound(max)?);
        let removed = match self.sets.get_mut(key) {
            Some(set) => set.delete_range_by_score(range),
            None => 0,
        };
        if self.sets.get(key).is_some_and(|s| s.is_empty()) {
            self.sets.remove(key);
        }
        trace!("{}: removed {} in [{}, {}]", key, removed, min, max);
        Ok(removed)
    }
}

/// Parses one end of a score range: `1.5`, `(1.5`, `-inf`, `+inf`.
pub fn parse_bound(text: &str) -> Result<Bound<f64>> {
    let (exclusive, number) = match text.strip_prefix('(') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let score: f64 = number
        .parse()
        .map_err(|_| Error::InvalidScore(text.to_string()))?;
    if score.is_nan() {
        return Err(Error::InvalidScore(text.to_string()));
    }
    Ok(if exclusive {
        Bound::Excluded(score)
    } else {
        Bound::Included(score)
    })
}
