use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use bytes::Bytes;
use ndtmeta_frame::{FrameConfig, FrameError, FrameReader, FrameWriter, MessageType};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// A typed, ordered message channel to one client.
///
/// Implementations are expected to bound every `receive_message` call with
/// their own timeout, covering the whole message rather than each socket read;
/// the meta test only checks its deadline between calls.
pub trait Messager {
    /// Send one message. Returns once the message has been handed to the transport.
    fn send_message(&mut self, kind: MessageType, payload: &[u8]) -> Result<(), ProtocolError>;

    /// Receive one message of the `expected` type and return its payload.
    ///
    /// An empty payload with no error is a clean end-of-data signal.
    fn receive_message(&mut self, expected: MessageType) -> Result<Bytes, ProtocolError>;
}

/// Payload encoding on the control connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Payload bytes carried as-is.
    #[default]
    Plain,
    /// Payload wrapped as `{"msg": "<text>"}`.
    Json,
}

#[derive(Serialize)]
struct JsonEnvelopeRef<'a> {
    msg: &'a str,
}

#[derive(Deserialize)]
struct JsonEnvelope {
    msg: String,
}

/// [`Messager`] over NDT5-framed byte streams.
pub struct FramedMessager<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    encoding: Encoding,
}

impl<R: Read, W: Write> FramedMessager<R, W> {
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>, encoding: Encoding) -> Self {
        Self {
            reader,
            writer,
            encoding,
        }
    }

    /// Split back into reader and writer halves.
    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        match self.encoding {
            Encoding::Plain => Ok(payload.to_vec()),
            Encoding::Json => {
                let msg = std::str::from_utf8(payload).map_err(|err| {
                    ProtocolError::InvalidEncoding(format!("JSON payload is not UTF-8: {err}"))
                })?;
                Ok(serde_json::to_vec(&JsonEnvelopeRef { msg })?)
            }
        }
    }

    fn decode(&self, payload: Bytes) -> Result<Bytes, ProtocolError> {
        match self.encoding {
            Encoding::Plain => Ok(payload),
            Encoding::Json => {
                let envelope: JsonEnvelope = serde_json::from_slice(&payload)?;
                Ok(Bytes::from(envelope.msg))
            }
        }
    }
}

impl FramedMessager<TcpStream, TcpStream> {
    /// Wrap a TCP stream, applying the read and write timeouts from `config`.
    pub fn from_tcp(
        stream: TcpStream,
        config: FrameConfig,
        encoding: Encoding,
    ) -> Result<Self, ProtocolError> {
        let reader_stream = stream.try_clone().map_err(FrameError::Io)?;
        let reader = FrameReader::with_config_tcp(reader_stream, config.clone())?;
        let writer = FrameWriter::with_config_tcp(stream, config)?;
        Ok(Self::new(reader, writer, encoding))
    }
}

impl<R: Read, W: Write> Messager for FramedMessager<R, W> {
    fn send_message(&mut self, kind: MessageType, payload: &[u8]) -> Result<(), ProtocolError> {
        let encoded = self.encode(payload)?;
        self.writer.send(kind, &encoded)?;
        Ok(())
    }

    fn receive_message(&mut self, expected: MessageType) -> Result<Bytes, ProtocolError> {
        let message = match self.reader.read_message() {
            Ok(message) => message,
            Err(FrameError::Io(err))
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                let timeout = self.reader.config().read_timeout.unwrap_or(Duration::ZERO);
                return Err(ProtocolError::Timeout(timeout));
            }
            Err(FrameError::ConnectionClosed) => {
                return Err(ProtocolError::Disconnected(
                    "connection closed while awaiting message".to_string(),
                ));
            }
            Err(err) => return Err(ProtocolError::Frame(err)),
        };

        if message.kind != expected {
            return Err(ProtocolError::UnexpectedMessage {
                expected,
                got: message.kind,
            });
        }

        self.decode(message.payload)
    }
}
