use log::debug;
use redis::Commands;

use crate::store::Store;
use crate::{Error, Result};

/// A single blocking connection to a redis server.
pub struct RedisStore {
    con: redis::Connection,
}

impl RedisStore {
    /// Connects to `addr` (`host:port`) and checks the server answers.
    pub fn connect(addr: &str) -> Result<RedisStore> {
        let client = redis::Client::open(format!("redis://{}/", addr))?;
        let mut con = client.get_connection()?;
        let pong: String = redis::cmd("PING").query(&mut con)?;
        debug!("connected to {}: {}", addr, pong);
        Ok(RedisStore { con })
    }
}

impl Store for RedisStore {
    fn hset(&mut self, key: &str, field: &str, value: i64) -> Result<()> {
        let _: () = self.con.hset(key, field, value)?;
        Ok(())
    }

    fn hget(&mut self, key: &str, field: &str) -> Result<String> {
        let value: Option<String> = self.con.hget(key, field)?;
        value.ok_or_else(|| Error::FieldMissing {
            key: key.to_string(),
            field: field.to_string(),
        })
    }

    fn zadd(&mut self, key: &str, score: f64, member: &str) -> Result<()> {
        let _: () = self.con.zadd(key, member, score)?;
        Ok(())
    }

    fn zrem_range_by_score(&mut self, key: &str, min: &str, max: &str) -> Result<usize> {
        Ok(self.con.zrembyscore(key, min, max)?)
    }

    // MULTI/EXEC: no other client sees one write without the other, but a
    // command failing inside EXEC does not undo the one before it
    fn hset_zadd(
        &mut self,
        hash_key: &str,
        field: &str,
        set_key: &str,
        score: i64,
        member: &str,
    ) -> Result<()> {
        let _: () = redis::pipe()
            .atomic()
            .hset(hash_key, field, score)
            .ignore()
            .zadd(set_key, member, score as f64)
            .ignore()
            .query(&mut self.con)?;
        Ok(())
    }
}
