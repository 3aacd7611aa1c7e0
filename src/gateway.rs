//! # Gateway Task Loop
//!
//! Three cooperative tasks share one thread:
//!
//! - the poll task runs a sensor poll cycle and pushes the record,
//! - the forward task drains the [`OutboundBuffer`] to the collector,
//! - the heartbeat task reports sensor liveness and uptime.
//!
//! The buffer is the only state shared between polling and forwarding. The
//! sensor is shared by the poll and heartbeat tasks through an async mutex
//! held for one engine exchange at a time. The first task error stops the
//! gateway; the caller restarts the device.

use crate::connection::encryption::AesKey;
use crate::connection::Connection;
use crate::error::RadarError;
use crate::radar::serial::LinkTransport;
use crate::radar::RadarSensor;
use crate::telemetry::{DeviceIdentity, TelemetryRecord};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Idle wait of the forward task when there is nothing to send.
pub const FORWARD_IDLE: Duration = Duration::from_millis(1);

/// Scheduling parameters of the gateway tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayOptions {
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub buffer_capacity: usize,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        GatewayOptions {
            poll_interval: Duration::from_millis(500),
            heartbeat_interval: Duration::from_secs(600),
            buffer_capacity: 64,
        }
    }
}

#[derive(Debug)]
struct BufferState {
    records: VecDeque<TelemetryRecord>,
    capacity: usize,
    dropped: u64,
}

/// Bounded last-in-first-out record buffer.
///
/// When full, pushing evicts the oldest record.
#[derive(Debug)]
pub struct OutboundBuffer {
    state: Mutex<BufferState>,
}

impl OutboundBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        OutboundBuffer {
            state: Mutex::new(BufferState {
                records: VecDeque::with_capacity(capacity),
                capacity,
                dropped: 0,
            }),
        }
    }

    /// Adds a record; returns true when the oldest record was evicted for it.
    pub fn push(&self, record: TelemetryRecord) -> bool {
        let mut state = self.state.lock();
        let evicted = if state.records.len() >= state.capacity {
            state.records.pop_front();
            state.dropped += 1;
            true
        } else {
            false
        };
        state.records.push_back(record);
        evicted
    }

    /// Takes the newest record.
    pub fn pop(&self) -> Option<TelemetryRecord> {
        self.state.lock().records.pop_back()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Records evicted so far.
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }
}

/// A registered sensor forwarding its readings to the collector.
pub struct Gateway<T, C> {
    sensor: tokio::sync::Mutex<RadarSensor<T>>,
    connection: tokio::sync::Mutex<C>,
    buffer: OutboundBuffer,
    key: Option<AesKey>,
    identity: DeviceIdentity,
    options: GatewayOptions,
    started: Instant,
}

impl<T, C> Gateway<T, C>
where
    T: LinkTransport,
    C: Connection,
{
    pub fn new(
        sensor: RadarSensor<T>,
        connection: C,
        identity: DeviceIdentity,
        key: Option<AesKey>,
        options: GatewayOptions,
    ) -> Self {
        Gateway {
            sensor: tokio::sync::Mutex::new(sensor),
            connection: tokio::sync::Mutex::new(connection),
            buffer: OutboundBuffer::new(options.buffer_capacity),
            key,
            identity,
            options,
            started: Instant::now(),
        }
    }

    pub fn buffer(&self) -> &OutboundBuffer {
        &self.buffer
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Runs one poll cycle and buffers the record.
    pub async fn poll_once(&self) -> Result<(), RadarError> {
        let record = self.sensor.lock().await.poll().await?;
        if let Some(err) = record.error() {
            warn!("Degraded reading: {err}");
        }
        if self.buffer.push(record.with_identity(&self.identity)) {
            warn!(
                "Outbound buffer full, dropped oldest record ({} dropped so far)",
                self.buffer.dropped()
            );
        }
        Ok(())
    }

    /// Sends the newest buffered record; false when the buffer was empty.
    pub async fn forward_pending(&self) -> Result<bool, RadarError> {
        let Some(record) = self.buffer.pop() else {
            return Ok(false);
        };
        self.connection
            .lock()
            .await
            .send(self.key.as_ref(), &record.to_json()?)
            .await?;
        debug!("Forwarded record, {} still buffered", self.buffer.len());
        Ok(true)
    }

    /// Checks the sensor heartbeat and reports it with the uptime in seconds.
    pub async fn heartbeat_once(&self) -> Result<bool, RadarError> {
        let alive = self.sensor.lock().await.heartbeat().await?;
        let report = json!({
            "id": self.identity.id,
            "heartbeat": alive,
            "uptime": self.uptime().as_secs(),
        });
        self.connection
            .lock()
            .await
            .send(self.key.as_ref(), &report)
            .await?;
        info!("Heartbeat reported (sensor alive: {alive})");
        Ok(alive)
    }

    async fn poll_loop(&self) -> Result<(), RadarError> {
        loop {
            self.poll_once().await?;
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    async fn forward_loop(&self) -> Result<(), RadarError> {
        loop {
            if !self.forward_pending().await? {
                tokio::time::sleep(FORWARD_IDLE).await;
            }
        }
    }

    async fn heartbeat_loop(&self) -> Result<(), RadarError> {
        loop {
            self.heartbeat_once().await?;
            tokio::time::sleep(self.options.heartbeat_interval).await;
        }
    }

    /// Runs the three tasks until one of them fails.
    ///
    /// Buffered records are lost when this returns.
    pub async fn run(&self) -> Result<(), RadarError> {
        info!(
            "Gateway running for {} ({}) at {}",
            self.identity.id, self.identity.model, self.identity.location
        );
        let result = tokio::try_join!(self.poll_loop(), self.forward_loop(), self.heartbeat_loop());
        if let Err(err) = self.connection.lock().await.disconnect().await {
            debug!("Disconnect after failure: {err}");
        }
        result.map(|_| ())
    }
}
