//! # Radar Frame Codec
//!
//! This module encodes and decodes the framed serial protocol spoken by the
//! Seeed Studio mmWave radar modules. Every frame has the layout
//!
//! ```text
//! offset  size  field
//! 0       2     start marker = 0x53 0x59
//! 2       1     control word
//! 3       1     command
//! 4       2     payload length, big-endian
//! 6       n     payload
//! 6+n     1     checksum = sum(bytes[0..6+n]) mod 256
//! 7+n     2     end marker = 0x54 0x43
//! ```
//!
//! In-memory frames are parsed with `nom`; frames arriving on the serial link
//! are assembled byte by byte by [`read_frame`] and then validated by the same
//! parser, so both paths share one set of integrity checks.
//!
//! ## Usage
//!
//! ```rust
//! use radar_rs::radar::frame::{decode_frame, encode_frame};
//!
//! let bytes = encode_frame(0x80, 0x81, &[0x0F]).unwrap();
//! let (frame, consumed) = decode_frame(&bytes).unwrap();
//! assert_eq!(consumed, bytes.len());
//! assert_eq!((frame.control, frame.command), (0x80, 0x81));
//! ```

use crate::constants::{FRAME_END, FRAME_HEADER_LEN, FRAME_OVERHEAD, FRAME_START, FRAME_TRAILER_LEN};
use crate::error::RadarError;
use crate::radar::serial::{LinkTimeouts, LinkTransport};
use bytes::{BufMut, BytesMut};
use nom::bytes::complete::{tag, take};
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use tokio::time::Instant;

/// A validated radar frame. Markers and checksum are not kept once the frame
/// has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub control: u8,
    pub command: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(control: u8, command: u8, payload: impl Into<Vec<u8>>) -> Self {
        Frame {
            control,
            command,
            payload: payload.into(),
        }
    }

    /// Packs the frame into its wire representation.
    pub fn encode(&self) -> Result<BytesMut, RadarError> {
        encode_frame(self.control, self.command, &self.payload)
    }

    /// True when this frame answers a request for `(control, command)`.
    pub fn answers(&self, control: u8, command: u8) -> bool {
        self.control == control && self.command == command
    }
}

/// A frame as it appears on the wire, before validation.
#[derive(Debug, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub control: u8,
    pub command: u8,
    pub length: u16,
    pub payload: &'a [u8],
    pub checksum: u8,
    pub end: &'a [u8],
}

/// Calculates the checksum over a byte sequence: the low byte of its sum.
pub fn calculate_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Checksum of a frame's start marker, header and payload.
fn frame_checksum(control: u8, command: u8, payload: &[u8]) -> u8 {
    let length = (payload.len() as u16).to_be_bytes();
    calculate_checksum(&FRAME_START)
        .wrapping_add(control)
        .wrapping_add(command)
        .wrapping_add(length[0])
        .wrapping_add(length[1])
        .wrapping_add(calculate_checksum(payload))
}

/// Encodes a (control, command, payload) triple into a wire frame.
pub fn encode_frame(control: u8, command: u8, payload: &[u8]) -> Result<BytesMut, RadarError> {
    if payload.len() > u16::MAX as usize {
        return Err(RadarError::PayloadTooLong(payload.len()));
    }

    let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + payload.len());
    buf.put_slice(&FRAME_START);
    buf.put_u8(control);
    buf.put_u8(command);
    buf.put_u16(payload.len() as u16);
    buf.put_slice(payload);
    buf.put_u8(frame_checksum(control, command, payload));
    buf.put_slice(&FRAME_END);
    Ok(buf)
}

/// Uses the `nom` crate to parse one frame starting at the start marker.
pub fn parse_frame(input: &[u8]) -> IResult<&[u8], RawFrame<'_>> {
    let (input, _) = tag(&FRAME_START[..])(input)?;
    let (input, control) = be_u8(input)?;
    let (input, command) = be_u8(input)?;
    let (input, length) = be_u16(input)?;
    let (input, payload) = take(length)(input)?;
    let (input, checksum) = be_u8(input)?;
    let (input, end) = take(FRAME_END.len())(input)?;
    Ok((
        input,
        RawFrame {
            control,
            command,
            length,
            payload,
            checksum,
            end,
        },
    ))
}

/// Decodes and validates a complete frame held in memory.
///
/// Returns the frame and the number of bytes it occupied.
pub fn decode_frame(input: &[u8]) -> Result<(Frame, usize), RadarError> {
    let (rest, raw) = parse_frame(input).map_err(|e| match e {
        nom::Err::Error(err) | nom::Err::Failure(err) if err.code == nom::error::ErrorKind::Tag => {
            RadarError::Framing("missing start marker".into())
        }
        _ => RadarError::Framing(format!("truncated frame ({} bytes)", input.len())),
    })?;

    if raw.end != FRAME_END {
        return Err(RadarError::Framing("data frame not closed".into()));
    }

    let calculated = frame_checksum(raw.control, raw.command, raw.payload);
    if calculated != raw.checksum {
        return Err(RadarError::Checksum {
            expected: raw.checksum,
            calculated,
        });
    }

    Ok((
        Frame::new(raw.control, raw.command, raw.payload),
        input.len() - rest.len(),
    ))
}

/// Reads one frame from the link.
///
/// The start marker is hunted one byte at a time so a shifted or partial
/// marker never hides the next frame. Silence while hunting is a `Timeout`;
/// silence after the marker means the frame was truncated (`Framing`).
pub async fn read_frame<T>(link: &mut T, timeouts: &LinkTimeouts) -> Result<Frame, RadarError>
where
    T: LinkTransport + ?Sized,
{
    let deadline = Instant::now() + timeouts.response;
    let mut byte = [0u8; 1];
    let mut after_first = false;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RadarError::Timeout);
        }
        link.read_exact_or_timeout(&mut byte, remaining).await?;
        if after_first && byte[0] == FRAME_START[1] {
            break;
        }
        after_first = byte[0] == FRAME_START[0];
    }

    let mut frame = Vec::with_capacity(FRAME_OVERHEAD);
    frame.extend_from_slice(&FRAME_START);

    let mut header = [0u8; FRAME_HEADER_LEN - 2];
    read_body(link, &mut header, timeouts).await?;
    frame.extend_from_slice(&header);

    let length = u16::from_be_bytes([header[2], header[3]]) as usize;
    let mut rest = vec![0u8; length + FRAME_TRAILER_LEN];
    read_body(link, &mut rest, timeouts).await?;
    frame.extend_from_slice(&rest);

    crate::logging::log_frame_hex("rx frame", &frame);
    decode_frame(&frame).map(|(frame, _)| frame)
}

async fn read_body<T>(link: &mut T, buf: &mut [u8], timeouts: &LinkTimeouts) -> Result<(), RadarError>
where
    T: LinkTransport + ?Sized,
{
    match link.read_exact_or_timeout(buf, timeouts.byte).await {
        Err(RadarError::Timeout) => Err(RadarError::Framing("error while reading packet".into())),
        other => other,
    }
}
