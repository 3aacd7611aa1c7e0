//! Mock serial port implementation for testing
//!
//! This module provides a mock serial port that can be used to test the radar
//! link without the radar module attached. Incoming data is scripted as a
//! queue of [`RxEvent`]s; a `Silence` event makes exactly one read fail with
//! `TimedOut`, and an empty queue keeps a read pending until something is
//! queued or the caller's own timeout fires. An optional responder sees
//! every written chunk and may queue a reply, which turns the mock into a
//! simulated sensor.

use crate::radar::frame::encode_frame;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// One scripted event on the receive side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RxEvent {
    Bytes(Vec<u8>),
    /// The next read times out.
    Silence,
}

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

/// Mock serial port that simulates bidirectional communication
#[derive(Clone)]
pub struct MockSerialPort {
    /// Data written to the port (outgoing)
    pub tx_buffer: Arc<Mutex<Vec<u8>>>,
    /// Scripted incoming events
    pub rx_events: Arc<Mutex<VecDeque<RxEvent>>>,
    /// Simulated errors
    pub next_error: Arc<Mutex<Option<io::Error>>>,
    responder: Arc<Mutex<Option<Responder>>>,
    read_waker: Arc<Mutex<Option<Waker>>>,
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerialPort {
    pub fn new() -> Self {
        MockSerialPort {
            tx_buffer: Arc::new(Mutex::new(Vec::new())),
            rx_events: Arc::new(Mutex::new(VecDeque::new())),
            next_error: Arc::new(Mutex::new(None)),
            responder: Arc::new(Mutex::new(None)),
            read_waker: Arc::new(Mutex::new(None)),
        }
    }

    fn push_rx(&self, events: impl IntoIterator<Item = RxEvent>) {
        self.rx_events.lock().unwrap().extend(events);
        if let Some(waker) = self.read_waker.lock().unwrap().take() {
            waker.wake();
        }
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        self.push_rx([RxEvent::Bytes(data.to_vec())]);
    }

    /// Queue an encoded radar frame
    pub fn queue_frame(&self, control: u8, command: u8, payload: &[u8]) {
        let frame = encode_frame(control, command, payload).expect("mock frame fits length field");
        self.queue_rx_data(&frame);
    }

    /// Queue `count` reads that time out
    pub fn queue_silence(&self, count: usize) {
        self.push_rx(std::iter::repeat(RxEvent::Silence).take(count));
    }

    /// Install a callback that answers written data
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        *self.responder.lock().unwrap() = Some(Box::new(responder));
    }

    /// Get data that was written to the port
    pub fn get_tx_data(&self) -> Vec<u8> {
        self.tx_buffer.lock().unwrap().clone()
    }

    /// Number of scripted events not yet consumed
    pub fn pending_rx_events(&self) -> usize {
        self.rx_events.lock().unwrap().len()
    }

    /// Clear all buffers
    pub fn clear(&self) {
        self.tx_buffer.lock().unwrap().clear();
        self.rx_events.lock().unwrap().clear();
    }

    /// Set an error to be returned on the next operation
    pub fn set_next_error(&self, error: io::Error) {
        *self.next_error.lock().unwrap() = Some(error);
    }
}

// Implement AsyncRead for MockSerialPort
impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Poll::Ready(Err(error));
        }

        let mut rx = self.rx_events.lock().unwrap();
        match rx.front_mut() {
            Some(RxEvent::Bytes(data)) => {
                let n = data.len().min(buf.remaining());
                buf.put_slice(&data[..n]);
                data.drain(..n);
                if data.is_empty() {
                    rx.pop_front();
                }
                Poll::Ready(Ok(()))
            }
            Some(RxEvent::Silence) => {
                rx.pop_front();
                Poll::Ready(Err(io::Error::new(io::ErrorKind::TimedOut, "mock silence")))
            }
            None => {
                *self.read_waker.lock().unwrap() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

// Implement AsyncWrite for MockSerialPort
impl AsyncWrite for MockSerialPort {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Poll::Ready(Err(error));
        }

        self.tx_buffer.lock().unwrap().extend_from_slice(buf);

        if let Some(responder) = self.responder.lock().unwrap().as_mut() {
            if let Some(reply) = responder(buf) {
                self.push_rx([RxEvent::Bytes(reply)]);
            }
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_serial_port_creation() {
        let port = MockSerialPort::new();
        assert_eq!(port.get_tx_data().len(), 0);
        assert_eq!(port.pending_rx_events(), 0);
    }

    #[test]
    fn test_queue_frame() {
        let port = MockSerialPort::new();
        port.queue_frame(0x01, 0x02, &[0x0F]);

        let rx = port.rx_events.lock().unwrap();
        match rx.front() {
            Some(RxEvent::Bytes(data)) => {
                assert_eq!(data[..2], [0x53, 0x59]);
                assert_eq!(data[data.len() - 2..], [0x54, 0x43]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_queue_silence() {
        let port = MockSerialPort::new();
        port.queue_silence(3);
        assert_eq!(port.pending_rx_events(), 3);
    }

    #[tokio::test]
    async fn test_pending_read_wakes_on_queued_data() {
        use std::time::Duration;
        use tokio::io::AsyncReadExt;

        let port = MockSerialPort::new();
        let feeder = port.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            feeder.queue_rx_data(&[0x53, 0x59]);
        });

        let mut reader = port.clone();
        let mut buf = [0u8; 2];
        let started = tokio::time::Instant::now();
        tokio::time::timeout(Duration::from_secs(2), reader.read_exact(&mut buf))
            .await
            .expect("read must wake once data is queued")
            .unwrap();
        assert_eq!(buf, [0x53, 0x59]);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_clear_buffers() {
        let port = MockSerialPort::new();
        port.queue_rx_data(&[1, 2, 3]);
        port.clear();
        assert_eq!(port.pending_rx_events(), 0);
    }
}
