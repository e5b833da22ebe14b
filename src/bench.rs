//! Insert and re-score phases over a loaded set of records.
//!
//! Every record is handled on its own: a failed store call is logged, counted
//! and the loop moves to the next record. Nothing here aborts a phase.

use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, error, info};

use crate::loader;
use crate::record::Record;
use crate::store::Store;


/// The two keys the benchmark writes, derived from one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    pub hash: String,
    pub set: String,
}

impl Keys {
    pub fn new(prefix: &str) -> Keys {
        Keys {
            hash: format!("{}:hash", prefix),
            set: format!("{}:list", prefix),
        }
    }
}

/// Wall clock scores in nanoseconds since the epoch, strictly increasing
/// across calls even when the clock does not move or steps back.
///
/// Sorted sets keep scores as `f64`, which at current epoch nanoseconds only
/// resolves steps of 256. Each score is also kept distinct from the previous
/// one after that conversion.
#[derive(Debug, Default)]
pub struct ScoreClock {
    last: i64,
}

impl ScoreClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_score(&mut self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as i64);
        let mut next = now.max(self.last + 1);
        while next as f64 <= self.last as f64 {
            next += 1;
        }
        self.last = next;
        next
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    pub records: usize,
    pub failed: usize,
}

impl fmt::Display for PhaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records, {} failed", self.records, self.failed)
    }
}

pub struct Bench<S> {
    store: S,
    keys: Keys,
    records: Vec<Record>,
    clock: ScoreClock,
    atomic_insert: bool,
}

impl<S: Store> Bench<S> {
    pub fn new(store: S, keys: Keys) -> Self {
        info!("redis key : {}", keys.hash);
        info!("redis key : {}", keys.set);
        Bench {
            store,
            keys,
            records: Vec::new(),
            clock: ScoreClock::new(),
            atomic_insert: false,
        }
    }

    /// Send each record's two writes as one transaction instead of two
    /// independent commands.
    pub fn atomic_insert(mut self, atomic: bool) -> Self {
        self.atomic_insert = atomic;
        self
    }

    /// Replaces the records with the rows of the csv at `path`. A file that
    /// cannot be read leaves the benchmark with no records.
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> usize {
        self.records = match loader::load_csv(path.as_ref()) {
            Ok(records) => records,
            Err(err) => {
                error!("failed to read csv {}: {}", path.as_ref().display(), err);
                Vec::new()
            }
        };
        self.records.len()
    }

    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes every record: hash field `ticker` gets a fresh score, and the
    /// record's volume is added to the sorted set at that score.
    pub fn insert(&mut self) -> PhaseStats {
        let mut stats = PhaseStats::default();
        for record in &self.records {
            let score = self.clock.next_score();
            let ok = if self.atomic_insert {
                insert_atomic(&mut self.store, &self.keys, record, score)
            } else {
                insert_record(&mut self.store, &self.keys, record, score)
            };
            stats.records += 1;
            if !ok {
                stats.failed += 1;
            }
        }
        info!("insert: {}", stats);
        stats
    }

    /// Moves every record's sorted-set entry to the score currently stored
    /// under its ticker.
    pub fn update(&mut self) -> PhaseStats {
        let mut stats = PhaseStats::default();
        for record in &self.records {
            stats.records += 1;
            if !update_record(&mut self.store, &self.keys, record) {
                stats.failed += 1;
            }
        }
        info!("update: {}", stats);
        stats
    }
}

// both writes are attempted even when the first one fails
fn insert_record<S: Store + ?Sized>(
    store: &mut S,
    keys: &Keys,
    record: &Record,
    score: i64,
) -> bool {
    let mut ok = true;
    if let Err(err) = store.hset(&keys.hash, &record.ticker, score) {
        error!("err hset {}: {}", record.ticker, err);
        ok = false;
    }
    if let Err(err) = store.zadd(&keys.set, score as f64, &record.member()) {
        error!("err zadd {}: {}", record.ticker, err);
        ok = false;
    }
    if ok {
        debug!("inserted {} at {}", record.ticker, score);
    }
    ok
}

fn insert_atomic<S: Store + ?Sized>(
    store: &mut S,
    keys: &Keys,
    record: &Record,
    score: i64,
) -> bool {
    match store.hset_zadd(&keys.hash, &record.ticker, &keys.set, score, &record.member()) {
        Ok(()) => {
            debug!("inserted {} at {}", record.ticker, score);
            true
        }
        Err(err) => {
            error!("err hset+zadd {}: {}", record.ticker, err);
            false
        }
    }
}

/// Reads the ticker's score back from the hash, drops whatever the sorted set
/// holds at that score and adds the record's volume there again.
fn update_record<S: Store + ?Sized>(store: &mut S, keys: &Keys, record: &Record) -> bool {
    let score = match store.hget(&keys.hash, &record.ticker) {
        Ok(score) => score,
        Err(err) => {
            error!("err hget {}: {}", record.ticker, err);
            return false;
        }
    };

    if let Err(err) = store.zrem_range_by_score(&keys.set, &score, &score) {
        error!("err zremrangebyscore {} at {}: {}", record.ticker, score, err);
        return false;
    }

    let parsed: f64 = match score.parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            error!("err parse score {:?} of {}: {}", score, record.ticker, err);
            return false;
        }
    };

    if let Err(err) = store.zadd(&keys.set, parsed, &record.member()) {
        error!("err zadd {}: {}", record.ticker, err);
        return false;
    }
    debug!("updated {} at {}", record.ticker, score);
    true
}
