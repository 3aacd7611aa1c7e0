//! The radar module contains the components responsible for the radar link
//! protocol: frame encoding and decoding, the serial transport, the
//! request/response engine and the interpretation of responses.

pub mod frame;
pub mod link;
pub mod response;
pub mod sensor;
pub mod serial;
pub mod serial_mock;

pub use frame::{decode_frame, encode_frame, Frame};
pub use link::{LinkEngine, LinkState, LinkStats};
pub use response::{interpret, interpret_for_model, ControlWord, DecodeError};
pub use sensor::{RadarSensor, SensorModel};
pub use serial::{LinkTimeouts, LinkTransport, SerialConfig, SerialLink};
