//! NDT5 control-connection message framing.
//!
//! Every message on an NDT5 control connection is framed with:
//! - A 1-byte message type
//! - A 2-byte big-endian payload length
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_message, encode_message, FrameConfig, Message, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
#[cfg(feature = "async")]
pub use codec::Ndt5Codec;
pub use error::{FrameError, Result};
pub use message::MessageType;
pub use reader::FrameReader;
pub use writer::FrameWriter;
