use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use bytes::BytesMut;

use crate::codec::{decode_message, FrameConfig, Message};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Applies a per-call read timeout to the underlying stream.
type SetReadTimeout<T> = fn(&T, Option<Duration>) -> std::io::Result<()>;

/// Reads complete NDT5 messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete messages.
///
/// When `read_timeout` is configured it bounds the whole message, not each
/// `read()` call: a peer trickling bytes cannot stretch one message past it.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    set_read_timeout: Option<SetReadTimeout<T>>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            set_read_timeout: None,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached, and an
    /// `ErrorKind::TimedOut` I/O error once `read_timeout` has elapsed since the
    /// call started.
    pub fn read_message(&mut self) -> Result<Message> {
        let deadline = self.config.read_timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if let Some(message) = decode_message(&mut self.buf, self.config.max_payload_size)? {
                tracing::trace!(
                    kind = %message.kind,
                    size = message.payload.len(),
                    "message received"
                );
                return Ok(message);
            }

            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(FrameError::Io(std::io::Error::new(
                        ErrorKind::TimedOut,
                        "message read timed out",
                    )));
                }
                if let Some(set_read_timeout) = self.set_read_timeout {
                    set_read_timeout(&self.inner, Some(remaining))?;
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current message reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<TcpStream> {
    /// Create a message reader for a TCP stream.
    ///
    /// The socket read timeout is re-armed before every read with the time left
    /// for the current message.
    pub fn with_config_tcp(inner: TcpStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        let mut reader = Self::with_config(inner, config);
        reader.set_read_timeout = Some(TcpStream::set_read_timeout);
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_message;
    use crate::message::MessageType;

    #[test]
    fn read_single_message() {
        let mut wire = BytesMut::new();
        encode_message(MessageType::TestMsg, b"os:linux", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let message = reader.read_message().unwrap();

        assert_eq!(message.kind, MessageType::TestMsg);
        assert_eq!(message.payload.as_ref(), b"os:linux");
    }

    #[test]
    fn read_protocol_sequence() {
        let mut wire = BytesMut::new();
        encode_message(MessageType::TestPrepare, b"", &mut wire).unwrap();
        encode_message(MessageType::TestStart, b"", &mut wire).unwrap();
        encode_message(MessageType::TestFinalize, b"", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));

        assert_eq!(reader.read_message().unwrap().kind, MessageType::TestPrepare);
        assert_eq!(reader.read_message().unwrap().kind, MessageType::TestStart);
        assert_eq!(
            reader.read_message().unwrap().kind,
            MessageType::TestFinalize
        );
    }

    #[test]
    fn partial_read_handling() {
        let mut wire = BytesMut::new();
        encode_message(MessageType::TestMsg, b"slow:drip", &mut wire).unwrap();

        let byte_reader = ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let message = reader.read_message().unwrap();
        assert_eq!(message.kind, MessageType::TestMsg);
        assert_eq!(message.payload.as_ref(), b"slow:drip");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_message() {
        let mut partial = BytesMut::new();
        partial.put_u8(MessageType::TestMsg.as_u8());
        partial.put_u16(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn oversized_message_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_u8(MessageType::TestMsg.as_u8());
        wire.put_u16(1024);

        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn timed_out_read_propagates_io_error() {
        let mut reader = FrameReader::new(TimedOutReader);
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_message(MessageType::TestMsg, b"ok", &mut wire).unwrap();

        let reader = InterruptedThenData {
            interrupted: false,
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let message = framed.read_message().unwrap();

        assert_eq!(message.payload.as_ref(), b"ok");
    }

    #[test]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(MessageType::TestMsg, b"browser:firefox").unwrap();
        writer.send(MessageType::TestMsg, b"").unwrap();

        let first = reader.read_message().unwrap();
        let second = reader.read_message().unwrap();
        assert_eq!(first.payload.as_ref(), b"browser:firefox");
        assert!(second.payload.is_empty());
    }

    #[test]
    fn applies_read_timeout_for_tcp_stream() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (stream, _) = listener.accept().unwrap();
        let _client = client.join().unwrap();

        let cfg = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(20)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_tcp(stream, cfg).unwrap();
        let err = reader.read_message().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut
        ));
    }

    #[test]
    fn read_timeout_bounds_a_trickled_tcp_message() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut wire = BytesMut::new();
        encode_message(MessageType::TestMsg, b"client.os:linux-trickle", &mut wire).unwrap();
        let bytes = wire.to_vec();
        let sender = std::thread::spawn(move || {
            use std::io::Write;

            let mut stream = TcpStream::connect(addr).unwrap();
            for byte in bytes {
                if stream.write_all(&[byte]).is_err() {
                    break;
                }
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
        });
        let (stream, _) = listener.accept().unwrap();

        let cfg = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(150)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_tcp(stream, cfg).unwrap();
        let started = Instant::now();
        let err = reader.read_message().unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(
            err,
            FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut
        ));
        assert!(
            elapsed < std::time::Duration::from_millis(600),
            "trickled message held the reader for {elapsed:?}"
        );

        drop(reader);
        sender.join().unwrap();
    }

    #[test]
    fn read_timeout_is_checked_between_chunks_for_any_stream() {
        let mut wire = BytesMut::new();
        encode_message(MessageType::TestMsg, b"os:linux", &mut wire).unwrap();

        let cfg = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(30)),
            ..FrameConfig::default()
        };
        let slow = SlowByteReader {
            bytes: wire.to_vec(),
            pos: 0,
            delay: std::time::Duration::from_millis(20),
        };
        let mut reader = FrameReader::with_config(slow, cfg);
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    struct SlowByteReader {
        bytes: Vec<u8>,
        pos: usize,
        delay: std::time::Duration,
    }

    impl Read for SlowByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(self.delay);
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct TimedOutReader;

    impl Read for TimedOutReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
