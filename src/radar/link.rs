//! # Radar Request/Response Engine
//!
//! This module correlates requests with responses on the half-duplex radar
//! link and recovers from the ways that link misbehaves.
//!
//! The radar module may emit unsolicited or delayed frames, so a decoded
//! frame is either the answer to the current request or stale traffic from
//! an earlier exchange. Corrupted or missing frames and irrelevant ones need
//! different recovery:
//!
//! - decode failure (timeout, framing, checksum): re-read without resending,
//!   up to [`MAX_FAILED_ATTEMPTS`] in a row, then reset the module and resend;
//! - stale frame: read up to [`MAX_STALE_READS`] more frames, then resend;
//!   after [`MAX_REQUEST_RESTARTS`] resends, reset;
//! - a request may cause [`MAX_RESETS_PER_REQUEST`] resets, after which the
//!   sensor is declared unresponsive.
//!
//! Every path is a bounded loop, so `send_receive` always terminates.

use crate::constants::{
    CONTROL_SYSTEM_FUNCTIONS, MAX_FAILED_ATTEMPTS, MAX_REQUEST_RESTARTS, MAX_RESETS_PER_REQUEST,
    MAX_STALE_READS, NO_DATA, SYSTEM_RESET,
};
use crate::error::RadarError;
use crate::radar::frame::{encode_frame, read_frame};
use crate::radar::serial::{LinkTimeouts, LinkTransport};
use log::{debug, error, warn};

/// Represents the states of the request/response state machine.
///
/// A successful exchange or reset leaves the engine `Idle`; a failed one
/// leaves it in `Error` until the next exchange starts.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LinkState {
    Idle,
    AwaitingResponse,
    Matched,
    Stale,
    Error,
}

/// Counters describing how the link has behaved since the engine started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub requests: u64,
    pub matched: u64,
    pub stale_frames: u64,
    pub decode_failures: u64,
    pub restarts: u64,
    pub resets: u64,
}

/// Result of waiting for one response.
enum Exchange {
    Matched(Vec<u8>),
    /// Only frames for other requests arrived; the response is presumed lost.
    Stale,
    /// Too many consecutive decode failures.
    Exhausted,
}

/// Owns the radar link session: the transport and the failed-attempt counter.
pub struct LinkEngine<T> {
    link: T,
    timeouts: LinkTimeouts,
    failed_attempts: u32,
    state: LinkState,
    stats: LinkStats,
}

impl<T: LinkTransport> LinkEngine<T> {
    pub fn new(link: T, timeouts: LinkTimeouts) -> Self {
        LinkEngine {
            link,
            timeouts,
            failed_attempts: 0,
            state: LinkState::Idle,
            stats: LinkStats::default(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Sends a request and returns the payload of the matching response.
    ///
    /// Only fatal errors escape: `SensorUnresponsive` and transport failures.
    pub async fn send_receive(
        &mut self,
        control: u8,
        command: u8,
        payload: &[u8],
    ) -> Result<Vec<u8>, RadarError> {
        let request = encode_frame(control, command, payload)?;
        self.stats.requests += 1;

        let mut restarts = 0;
        let mut resets = 0;
        loop {
            if let Err(e) = self.write(&request).await {
                self.transition(LinkState::Error);
                return Err(e);
            }
            self.transition(LinkState::AwaitingResponse);

            match self.await_response(control, command).await {
                Ok(Exchange::Matched(response)) => {
                    self.transition(LinkState::Matched);
                    self.stats.matched += 1;
                    self.transition(LinkState::Idle);
                    return Ok(response);
                }
                Ok(Exchange::Stale) => {
                    self.transition(LinkState::Stale);
                    self.stats.restarts += 1;
                    restarts += 1;
                    if restarts <= MAX_REQUEST_RESTARTS {
                        warn!(
                            "Response to 0x{control:02X}/0x{command:02X} missed, resending ({restarts}/{MAX_REQUEST_RESTARTS})"
                        );
                        continue;
                    }
                    warn!("Response to 0x{control:02X}/0x{command:02X} keeps getting lost, resetting sensor");
                    restarts = 0;
                }
                Ok(Exchange::Exhausted) => {
                    self.transition(LinkState::Error);
                    warn!(
                        "{} consecutive failed reads waiting for 0x{control:02X}/0x{command:02X}, resetting sensor",
                        self.failed_attempts
                    );
                }
                Err(e) => {
                    self.transition(LinkState::Error);
                    return Err(e);
                }
            }

            resets += 1;
            if resets > MAX_RESETS_PER_REQUEST {
                error!("Request 0x{control:02X}/0x{command:02X} unanswered after {MAX_RESETS_PER_REQUEST} resets");
                self.transition(LinkState::Error);
                return Err(RadarError::SensorUnresponsive);
            }
            if let Err(e) = self.reset().await {
                self.transition(LinkState::Error);
                return Err(e);
            }
        }
    }

    async fn await_response(&mut self, control: u8, command: u8) -> Result<Exchange, RadarError> {
        let mut stale_reads = 0;
        loop {
            match read_frame(&mut self.link, &self.timeouts).await {
                Ok(frame) if frame.answers(control, command) => {
                    self.failed_attempts = 0;
                    return Ok(Exchange::Matched(frame.payload));
                }
                Ok(frame) => {
                    self.failed_attempts = 0;
                    self.stats.stale_frames += 1;
                    stale_reads += 1;
                    debug!(
                        "Skipping stale frame 0x{:02X}/0x{:02X} while waiting for 0x{control:02X}/0x{command:02X}",
                        frame.control, frame.command
                    );
                    if stale_reads > MAX_STALE_READS {
                        return Ok(Exchange::Stale);
                    }
                }
                Err(e) if e.is_recoverable() => {
                    self.failed_attempts += 1;
                    self.stats.decode_failures += 1;
                    debug!("Read failed ({}/{MAX_FAILED_ATTEMPTS}): {e}", self.failed_attempts);
                    if self.failed_attempts > MAX_FAILED_ATTEMPTS {
                        return Ok(Exchange::Exhausted);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Resets the radar module and waits for it to echo the reset command.
    ///
    /// Fails with `SensorUnresponsive` once more than [`MAX_FAILED_ATTEMPTS`]
    /// frames or reads went by without the echo.
    pub async fn reset(&mut self) -> Result<(), RadarError> {
        let payload = [NO_DATA];
        let request = encode_frame(CONTROL_SYSTEM_FUNCTIONS, SYSTEM_RESET, &payload)?;
        self.stats.resets += 1;
        self.write(&request).await?;
        self.failed_attempts = 0;

        loop {
            match read_frame(&mut self.link, &self.timeouts).await {
                Ok(frame)
                    if frame.answers(CONTROL_SYSTEM_FUNCTIONS, SYSTEM_RESET)
                        && frame.payload == payload =>
                {
                    self.failed_attempts = 0;
                    debug!("Sensor reset acknowledged");
                    self.transition(LinkState::Idle);
                    return Ok(());
                }
                Ok(frame) => debug!(
                    "Discarding frame 0x{:02X}/0x{:02X} while waiting for reset echo",
                    frame.control, frame.command
                ),
                Err(e) if e.is_recoverable() => debug!("Read failed while waiting for reset echo: {e}"),
                Err(e) => return Err(e),
            }

            self.failed_attempts += 1;
            if self.failed_attempts > MAX_FAILED_ATTEMPTS {
                error!("Sensor did not acknowledge reset");
                self.transition(LinkState::Error);
                return Err(RadarError::SensorUnresponsive);
            }
        }
    }

    fn transition(&mut self, next: LinkState) {
        if self.state != next {
            debug!("Link state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    async fn write(&mut self, frame: &[u8]) -> Result<(), RadarError> {
        crate::logging::log_frame_hex("tx frame", frame);
        self.link.write_all_flush(frame).await
    }
}
