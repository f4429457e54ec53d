use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::metrics::QUEUE_DEPTH;

const STREAM_KEY: &str = "asset_intel:runs";
const CONSUMER_GROUP: &str = "asset_intel_workers";
const MAX_STREAM_LEN: usize = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJob {
    pub run_id: Uuid,
    pub tenant_id: Uuid,
}

/// Thin wrapper around a Redis Streams connection. At-least-once delivery:
/// a job is only removed from the pending-entries list once the worker acks
/// it, so a crash mid-processing leaves it claimable by another worker.
#[derive(Clone)]
pub struct QueueAdapter {
    conn: MultiplexedConnection,
}

impl QueueAdapter {
    pub async fn connect_with_backoff(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let mut attempt = 0u32;
        loop {
            match client.get_multiplexed_tokio_connection().await {
                Ok(conn) => {
                    let adapter = Self { conn };
                    adapter.ensure_group().await?;
                    return Ok(adapter);
                }
                Err(err) if attempt < 5 => {
                    attempt += 1;
                    let backoff = Duration::from_millis(200 * 2u64.pow(attempt));
                    tracing::warn!(err = ?err, attempt, "redis connect failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn ensure_group(&self) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        let res: RedisResult<()> = conn
            .xgroup_create_mkstream(STREAM_KEY, CONSUMER_GROUP, "0")
            .await;
        match res {
            Ok(()) => Ok(()),
            Err(err) if err.to_string().contains("BUSYGROUP") => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub async fn enqueue(&self, job: &RunJob) -> RedisResult<String> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(job).expect("RunJob serializes");
        let id: String = conn
            .xadd_maxlen(
                STREAM_KEY,
                redis::streams::StreamMaxlen::Approx(MAX_STREAM_LEN),
                "*",
                &[("job", payload.as_str())],
            )
            .await?;
        if let Ok(len) = conn.xlen::<_, i64>(STREAM_KEY).await {
            QUEUE_DEPTH.set(len);
        }
        Ok(id)
    }

    /// Blocks for up to `block_ms` waiting for new entries delivered to
    /// `consumer_name`, claiming work that no other consumer in the group
    /// has acked yet.
    pub async fn read_group(
        &self,
        consumer_name: &str,
        block_ms: usize,
        count: usize,
    ) -> RedisResult<Vec<(String, RunJob)>> {
        use redis::streams::{StreamReadOptions, StreamReadReply};

        let mut conn = self.conn.clone();
        let opts = StreamReadOptions::default()
            .group(CONSUMER_GROUP, consumer_name)
            .block(block_ms)
            .count(count);

        let reply: StreamReadReply = conn.xread_options(&[STREAM_KEY], &[">"], &opts).await?;

        let mut jobs = Vec::new();
        for stream_key in reply.keys {
            for entry in stream_key.ids {
                if let Some(redis::Value::BulkString(bytes)) = entry.map.get("job") {
                    if let Ok(job) = serde_json::from_slice::<RunJob>(bytes) {
                        jobs.push((entry.id, job));
                    }
                }
            }
        }
        Ok(jobs)
    }

    pub async fn ack(&self, entry_id: &str) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.xack(STREAM_KEY, CONSUMER_GROUP, &[entry_id]).await
    }
}
