//! The four hash / sorted-set commands the benchmark issues, behind one
//! trait so the runner works against a live server or an in-process map.

use crate::Result;

pub mod memory;
pub mod remote;

pub use self::memory::MemoryStore;
pub use self::remote::RedisStore;

pub trait Store {
    /// Sets `field` of hash `key` to `value`, replacing any previous value.
    fn hset(&mut self, key: &str, field: &str, value: i64) -> Result<()>;

    /// Reads `field` of hash `key`. A missing field is
    /// [`Error::FieldMissing`](crate::Error::FieldMissing).
    fn hget(&mut self, key: &str, field: &str) -> Result<String>;

    /// Adds `member` at `score` to sorted set `key`.
    fn zadd(&mut self, key: &str, score: f64, member: &str) -> Result<()>;

    /// Removes every entry of sorted set `key` whose score lies in
    /// `[min, max]`. Bounds use the textual score syntax of the server:
    /// plain decimals, a leading `(` for an exclusive bound, `-inf`, `+inf`.
    fn zrem_range_by_score(&mut self, key: &str, min: &str, max: &str) -> Result<usize>;

    /// Writes the hash field and the sorted-set entry for one record as one
    /// transaction where the backend supports it. The default sends the two
    /// writes in sequence and stops at the first failure.
    fn hset_zadd(
        &mut self,
        hash_key: &str,
        field: &str,
        set_key: &str,
        score: i64,
        member: &str,
    ) -> Result<()> {
        self.hset(hash_key, field, score)?;
        self.zadd(set_key, score as f64, member)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn hset(&mut self, key: &str, field: &str, value: i64) -> Result<()> {
        (**self).hset(key, field, value)
    }

    fn hget(&mut self, key: &str, field: &str) -> Result<String> {
        (**self).hget(key, field)
    }

    fn zadd(&mut self, key: &str, score: f64, member: &str) -> Result<()> {
        (**self).zadd(key, score, member)
    }

    fn zrem_range_by_score(&mut self, key: &str, min: &str, max: &str) -> Result<usize> {
        (**self).zrem_range_by_score(key, min, max)
    }

    fn hset_zadd(
        &mut self,
        hash_key: &str,
        field: &str,
        set_key: &str,
        score: i64,
        member: &str,
    ) -> Result<()> {
        (**self).hset_zadd(hash_key, field, set_key, score, member)
    }
}
