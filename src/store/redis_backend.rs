//! Redis store backend
//!
//! Maps the cache primitives onto Redis commands over a multiplexed,
//! auto-reconnecting connection.

use async_trait::async_trait;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::Value;
use tracing::debug;

use super::{score_arg, Backend, Command, Reply, ScanPage};
use crate::error::{CacheError, CommandFailure, Result};

/// Redis-backed store.
///
/// Pipelines are sent as `MULTI`/`EXEC` transactions.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    /// Connects to Redis at the given URL (e.g. `redis://127.0.0.1/`).
    ///
    /// ```no_run
    /// use prefix_cache::store::RedisBackend;
    ///
    /// # async fn example() -> prefix_cache::error::Result<()> {
    /// let backend = RedisBackend::new("redis://localhost/").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self { connection })
    }

    fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

/// Builds the Redis command for one pipelined mutation.
fn to_redis_cmd(command: &Command) -> redis::Cmd {
    match command {
        Command::Set { key, value, ttl_ms } => {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value.as_slice()).arg("PX").arg(*ttl_ms);
            cmd
        }
        Command::Del { key } => {
            let mut cmd = redis::cmd("DEL");
            cmd.arg(key);
            cmd
        }
        Command::SortedUpsert {
            index,
            member,
            score,
        } => {
            let mut cmd = redis::cmd("ZADD");
            cmd.arg(index).arg(score_arg(*score)).arg(member);
            cmd
        }
        Command::SortedRemoveRange { index, min, max } => {
            let mut cmd = redis::cmd("ZREMRANGEBYSCORE");
            cmd.arg(index).arg(score_arg(*min)).arg(score_arg(*max));
            cmd
        }
        Command::SortedRemoveMember { index, member } => {
            let mut cmd = redis::cmd("ZREM");
            cmd.arg(index).arg(member);
            cmd
        }
        Command::Expire { key, ttl_ms } => {
            let mut cmd = redis::cmd("PEXPIRE");
            cmd.arg(key).arg(*ttl_ms);
            cmd
        }
    }
}

fn to_reply(value: Value) -> Reply {
    match value {
        Value::Okay => Reply::Ok,
        Value::SimpleString(s) if s == "OK" => Reply::Ok,
        Value::Int(n) => Reply::Int(n),
        Value::Nil => Reply::Nil,
        Value::ServerError(err) => Reply::Error(match err.details() {
            Some(details) => format!("{} {}", err.code(), details),
            None => err.code().to_string(),
        }),
        other => Reply::Other(format!("{:?}", other)),
    }
}

fn batch_failure(commands: usize, reply: String) -> CacheError {
    CacheError::Pipeline(vec![CommandFailure {
        command: format!("MULTI ({} commands) EXEC", commands),
        reply,
    }])
}

/// Splits the `EXEC` reply into one reply per queued command. Server errors
/// stay in their slot; only an aborted or malformed transaction fails the
/// batch as a whole.
fn exec_replies(exec: Option<Value>, commands: usize) -> Result<Vec<Reply>> {
    match exec {
        Some(Value::Array(items)) => Ok(items.into_iter().map(to_reply).collect()),
        Some(Value::Nil) => Err(batch_failure(commands, "transaction aborted".to_string())),
        Some(other) => Err(batch_failure(commands, to_reply(other).to_string())),
        None => Err(batch_failure(commands, "no reply".to_string())),
    }
}

#[async_trait]
impl Backend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn pipeline(&self, commands: &[Command]) -> Result<Vec<Reply>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            pipe.add_command(to_redis_cmd(command));
        }

        let mut conn = self.connection();
        // Skip the MULTI and QUEUED acks and read the raw EXEC array, which
        // `query_async` would collapse into its first server error.
        let mut raw = conn
            .req_packed_commands(&pipe, commands.len() + 1, 1)
            .await
            .map_err(|e| batch_failure(commands.len(), e.to_string()))?;

        let replies = exec_replies(raw.pop(), commands.len())?;
        debug!(commands = commands.len(), "redis pipeline executed");
        Ok(replies)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection();
        let values: Vec<Option<Vec<u8>>> =
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn remove_range_by_score(&self, index: &str, min: f64, max: f64) -> Result<u64> {
        let mut conn = self.connection();
        let removed: u64 = redis::cmd("ZREMRANGEBYSCORE")
            .arg(index)
            .arg(score_arg(min))
            .arg(score_arg(max))
            .query_async(&mut conn)
            .await?;
        Ok(removed)
    }

    async fn sorted_scan(&self, index: &str, cursor: u64, count: usize) -> Result<ScanPage> {
        let mut conn = self.connection();
        let (cursor, members): (u64, Vec<(String, f64)>) = redis::cmd("ZSCAN")
            .arg(index)
            .arg(cursor)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        Ok(ScanPage { cursor, members })
    }
}
