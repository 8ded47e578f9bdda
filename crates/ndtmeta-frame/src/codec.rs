use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::message::MessageType;

/// Message header: type (1) + length (2) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Default maximum payload size: the largest length the header can express.
pub const DEFAULT_MAX_PAYLOAD: usize = u16::MAX as usize;

/// A typed NDT5 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message type.
    pub kind: MessageType,
    /// The message payload.
    pub payload: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(kind: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// The total wire size of this message (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────────┬─────────────────┐
/// │ Type (1B) │ Length       │ Payload         │
/// │           │ (2B BE)      │ (Length bytes)  │
/// └───────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_message(kind: MessageType, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > DEFAULT_MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: DEFAULT_MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(kind.as_u8());
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet.
/// On success, consumes the message bytes from the buffer.
pub fn decode_message(src: &mut BytesMut, max_payload: usize) -> Result<Option<Message>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let kind = MessageType::try_from(src[0])?;
    let payload_len = u16::from_be_bytes([src[1], src[2]]) as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Message { kind, payload }))
}

/// Configuration for the message codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 65535.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// `tokio_util` codec for NDT5 messages.
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct Ndt5Codec {
    max_payload_size: usize,
}

#[cfg(feature = "async")]
impl Ndt5Codec {
    pub fn new(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }
}

#[cfg(feature = "async")]
impl Default for Ndt5Codec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD)
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for Ndt5Codec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        decode_message(src, self.max_payload_size)
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Encoder<Message> for Ndt5Codec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        if item.payload.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.max_payload_size,
            });
        }
        encode_message(item.kind, item.payload.as_ref(), dst)
    }
}
