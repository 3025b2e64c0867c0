//! Redis batch shipper, grounded on the `redis_push` path of
//! `original_source/logfire.py`'s `OutputThread` and on the `redis`
//! dependency vector already carries for its own sinks.

use std::sync::Arc;
use std::time::Duration;

use logtail_core::FifoAggregator;
use redis::Commands;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

const MAX_CHUNK_SIZE: usize = 200;
const RETRY_SLEEP: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Serialize)]
struct EntryJson<'a> {
    #[serde(rename = "@timestamp")]
    timestamp: &'a str,
    flowid: Option<&'a str>,
    level: &'a str,
    thread: Option<&'a str>,
    class: &'a str,
    method: &'a str,
    file: &'a str,
    line: i64,
    message: &'a str,
    logfile: &'a str,
}

/// Parses `host:port/list-name` as given to `--redis`.
pub fn parse_target(spec: &str) -> Option<(String, String)> {
    let (host_port, list) = spec.rsplit_once('/')?;
    if host_port.is_empty() || list.is_empty() {
        return None;
    }
    Some((host_port.to_string(), list.to_string()))
}

/// Drains `aggregator` in bounded chunks and `RPUSH`es each entry, JSON
/// encoded, onto `list_name`. Runs until the aggregator is exhausted
/// (all readers EOF and queue empty). Transient connection failures are
/// retried after a fixed delay rather than aborting the whole run.
pub fn ship(
    aggregator: Arc<FifoAggregator>,
    names: &[String],
    host_port: &str,
    list_name: &str,
) -> redis::RedisResult<()> {
    let url = format!("redis://{host_port}/");
    let client = redis::Client::open(url)?;
    let mut conn = connect_with_retry(&client);

    loop {
        let chunk = aggregator.drain_up_to(MAX_CHUNK_SIZE);
        if chunk.is_empty() {
            match aggregator.drain_one(POLL_INTERVAL) {
                Some(entry) => {
                    let mut chunk = vec![entry];
                    chunk.extend(aggregator.drain_up_to(MAX_CHUNK_SIZE - 1));
                    ship_chunk(&mut conn, &client, list_name, names, &chunk);
                }
                None => return Ok(()),
            }
            continue;
        }

        ship_chunk(&mut conn, &client, list_name, names, &chunk);
    }
}

fn ship_chunk(
    conn: &mut redis::Connection,
    client: &redis::Client,
    list_name: &str,
    names: &[String],
    chunk: &[logtail_core::LogEntry],
) {
    let payloads: Vec<String> = chunk
        .iter()
        .map(|entry| {
            let name = names.get(entry.reader_id).map(String::as_str).unwrap_or("");
            json!(EntryJson {
                timestamp: &entry.timestamp_text,
                flowid: entry.flow_id.as_deref(),
                level: entry.level.as_str(),
                thread: entry.thread.as_deref(),
                class: &entry.class_name,
                method: &entry.method,
                file: &entry.source_file,
                line: entry.source_line,
                message: &entry.message,
                logfile: name,
            })
            .to_string()
        })
        .collect();

    loop {
        match conn.rpush::<_, _, ()>(list_name, &payloads) {
            Ok(()) => {
                info!(count = payloads.len(), "shipped entries to redis");
                return;
            }
            Err(e) => {
                warn!(error = %e, "redis rpush failed, retrying");
                std::thread::sleep(RETRY_SLEEP);
                *conn = connect_with_retry(client);
            }
        }
    }
}

/// Socket timeout for Redis operations (spec §5).
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

fn connect_with_retry(client: &redis::Client) -> redis::Connection {
    loop {
        match client.get_connection() {
            Ok(conn) => {
                let _ = conn.set_read_timeout(Some(SOCKET_TIMEOUT));
                let _ = conn.set_write_timeout(Some(SOCKET_TIMEOUT));
                return conn;
            }
            Err(e) => {
                error!(error = %e, "redis connection failed, retrying");
                std::thread::sleep(RETRY_SLEEP);
            }
        }
    }
}
