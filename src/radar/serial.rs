//! # Radar Serial Communication
//!
//! This module provides the byte-stream side of the radar link: the
//! [`LinkTransport`] abstraction the frame codec reads from and writes to, a
//! generic implementation over any tokio port, and the `tokio-serial` setup
//! for the real UART.
//!
//! Every read is bounded. The gateway runs its tasks cooperatively on one
//! thread, so a read that never returns would stall the forwarder and the
//! heartbeat as well.

use crate::error::RadarError;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tokio_serial::SerialPortBuilderExt;

/// Configuration for serial connection.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port: String,
    pub baudrate: u32,
    /// How long to wait for the start of a response frame.
    pub response_timeout: Duration,
    /// Idle time tolerated between bytes once a frame has started.
    pub byte_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: "/dev/ttyUSB0".to_string(),
            baudrate: 115_200,
            response_timeout: Duration::from_secs(10),
            byte_timeout: Duration::from_millis(100),
        }
    }
}

impl SerialConfig {
    pub fn timeouts(&self) -> LinkTimeouts {
        LinkTimeouts {
            response: self.response_timeout,
            byte: self.byte_timeout,
        }
    }
}

/// Read windows used by the frame reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTimeouts {
    pub response: Duration,
    pub byte: Duration,
}

impl Default for LinkTimeouts {
    fn default() -> Self {
        SerialConfig::default().timeouts()
    }
}

/// Duplex byte channel with bounded reads.
#[async_trait::async_trait]
pub trait LinkTransport: Send {
    /// Fills `buf` completely or fails once the port stays idle for `timeout`.
    ///
    /// The window restarts whenever bytes arrive, so a slow but steady
    /// stream is read to the end. Idle before any byte arrived is
    /// `Timeout`; idle part way through is `Framing`. A port that reports
    /// `TimedOut` itself is treated the same way.
    async fn read_exact_or_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), RadarError>;

    /// Writes all bytes and returns only after they have been flushed.
    async fn write_all_flush(&mut self, data: &[u8]) -> Result<(), RadarError>;
}

/// [`LinkTransport`] over any async port, real or mocked.
pub struct SerialLink<P> {
    port: P,
}

impl<P> SerialLink<P> {
    pub fn new(port: P) -> Self {
        SerialLink { port }
    }
}

impl SerialLink<tokio_serial::SerialStream> {
    /// Opens the radar UART: 8 data bits, no parity, one stop bit.
    pub fn open(config: &SerialConfig) -> Result<Self, RadarError> {
        let port = tokio_serial::new(&config.port, config.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(config.response_timeout)
            .open_native_async()
            .map_err(|e| RadarError::SerialPort(e.to_string()))?;

        log::info!("Opened {} at {} baud", config.port, config.baudrate);
        Ok(SerialLink::new(port))
    }
}

#[async_trait::async_trait]
impl<P> LinkTransport for SerialLink<P>
where
    P: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_exact_or_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), RadarError> {
        let mut deadline = Instant::now() + timeout;
        let mut filled = 0;
        while filled < buf.len() {
            match timeout_at(deadline, self.port.read(&mut buf[filled..])).await {
                Err(_) if filled == 0 => return Err(RadarError::Timeout),
                Err(_) => {
                    return Err(RadarError::Framing(format!(
                        "truncated read: {filled} of {} bytes",
                        buf.len()
                    )))
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut && filled == 0 => {
                    return Err(RadarError::Timeout)
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => {
                    return Err(RadarError::Framing(format!(
                        "truncated read: {filled} of {} bytes",
                        buf.len()
                    )))
                }
                Ok(Ok(0)) => return Err(RadarError::SerialPort("serial port closed".into())),
                Ok(Ok(n)) => {
                    filled += n;
                    deadline = Instant::now() + timeout;
                }
                Ok(Err(e)) => return Err(RadarError::SerialPort(e.to_string())),
            }
        }
        Ok(())
    }

    async fn write_all_flush(&mut self, data: &[u8]) -> Result<(), RadarError> {
        self.port
            .write_all(data)
            .await
            .map_err(|e| RadarError::SerialPort(e.to_string()))?;
        self.port
            .flush()
            .await
            .map_err(|e| RadarError::SerialPort(e.to_string()))
    }
}
