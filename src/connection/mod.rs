//! # Collector Connection
//!
//! The gateway forwards telemetry to a collector over TCP. Messages are JSON
//! documents, AES-256-CBC encrypted when a key is configured (see
//! [`encryption`]).
//!
//! [`Connection`] is the seam the gateway depends on; [`TcpConnection`] is
//! the production implementation and [`MemoryConnection`] records traffic
//! for tests.

pub mod encryption;

use crate::error::RadarError;
use crate::telemetry::DeviceIdentity;
use encryption::AesKey;
use log::{debug, info};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Largest collector reply read in one receive.
pub const RECEIVE_BUFFER_SIZE: usize = 1024;

/// A message channel to the collector.
#[async_trait::async_trait]
pub trait Connection: Send {
    /// Serializes `message` to JSON, encrypts it when `key` is set, and sends it.
    async fn send(&mut self, key: Option<&AesKey>, message: &Value) -> Result<(), RadarError>;

    /// Receives one message, decrypting it when `key` is set.
    async fn receive(&mut self, key: Option<&AesKey>) -> Result<Value, RadarError>;

    async fn disconnect(&mut self) -> Result<(), RadarError>;
}

fn seal(key: Option<&AesKey>, message: &Value) -> Result<Vec<u8>, RadarError> {
    let json = serde_json::to_vec(message)?;
    Ok(match key {
        Some(key) => encryption::encrypt(key, &json),
        None => json,
    })
}

fn open(key: Option<&AesKey>, data: &[u8]) -> Result<Value, RadarError> {
    let plain = match key {
        Some(key) => encryption::decrypt(key, data)?,
        None => data.to_vec(),
    };
    if plain.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_slice(&plain)?)
}

/// TCP connection to the collector.
pub struct TcpConnection {
    stream: TcpStream,
}

impl TcpConnection {
    pub async fn connect(ip: &str, port: u16) -> Result<Self, RadarError> {
        let stream = TcpStream::connect((ip, port))
            .await
            .map_err(|e| RadarError::Connection(format!("{ip}:{port}: {e}")))?;
        info!("Connected to collector at {ip}:{port}");
        Ok(TcpConnection { stream })
    }
}

#[async_trait::async_trait]
impl Connection for TcpConnection {
    async fn send(&mut self, key: Option<&AesKey>, message: &Value) -> Result<(), RadarError> {
        let data = seal(key, message)?;
        self.stream
            .write_all(&data)
            .await
            .map_err(|e| RadarError::Connection(e.to_string()))
    }

    async fn receive(&mut self, key: Option<&AesKey>) -> Result<Value, RadarError> {
        let mut buf = vec![0u8; RECEIVE_BUFFER_SIZE];
        let n = self
            .stream
            .read(&mut buf)
            .await
            .map_err(|e| RadarError::Connection(e.to_string()))?;
        if n == 0 {
            return Err(RadarError::Connection("collector closed the connection".into()));
        }
        open(key, &buf[..n])
    }

    async fn disconnect(&mut self) -> Result<(), RadarError> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| RadarError::Connection(e.to_string()))
    }
}

/// In-memory connection that records what was sent and replays queued replies.
#[derive(Clone, Default)]
pub struct MemoryConnection {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    replies: Arc<Mutex<VecDeque<Vec<u8>>>>,
    /// Key used to decode recorded messages in [`MemoryConnection::sent_messages`].
    key: Option<AesKey>,
}

impl MemoryConnection {
    pub fn new(key: Option<AesKey>) -> Self {
        MemoryConnection {
            key,
            ..Default::default()
        }
    }

    /// Queues a reply, sealed the same way a collector would.
    pub fn queue_reply(&self, message: &Value, key: Option<&AesKey>) -> Result<(), RadarError> {
        let data = seal(key, message)?;
        self.replies.lock().unwrap().push_back(data);
        Ok(())
    }

    /// Raw bytes of every message sent so far.
    pub fn sent_raw(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Decoded messages; unencrypted ones are parsed as plain JSON.
    pub fn sent_messages(&self) -> Vec<Value> {
        self.sent_raw()
            .iter()
            .filter_map(|data| {
                serde_json::from_slice(data)
                    .ok()
                    .or_else(|| open(self.key.as_ref(), data).ok())
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Connection for MemoryConnection {
    async fn send(&mut self, key: Option<&AesKey>, message: &Value) -> Result<(), RadarError> {
        let data = seal(key, message)?;
        self.sent.lock().unwrap().push(data);
        Ok(())
    }

    async fn receive(&mut self, key: Option<&AesKey>) -> Result<Value, RadarError> {
        let data = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RadarError::Connection("no reply from collector".into()))?;
        open(key, &data)
    }

    async fn disconnect(&mut self) -> Result<(), RadarError> {
        Ok(())
    }
}

/// Announces the device to the collector and checks that it was accepted.
///
/// The announcement goes out unencrypted; the reply is encrypted with `key`.
/// A reply without `"success": true` is a configuration problem, reported as
/// `Config`. Transport failures are `Connection` errors.
pub async fn register<C>(
    connection: &mut C,
    identity: &DeviceIdentity,
    key: Option<&AesKey>,
) -> Result<(), RadarError>
where
    C: Connection + ?Sized,
{
    let announcement = serde_json::to_value(identity)?;
    connection.send(None, &announcement).await?;
    let reply = connection.receive(key).await?;
    debug!("Registration reply: {reply}");

    match reply.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        _ => Err(RadarError::Config("collector rejected the device registration".into())),
    }
}
