use std::fmt;
use std::io;

use ndtmeta_frame::FrameError;
use ndtmeta_session::{MetaError, ProtocolError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrInUse => FAILURE,
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } | FrameError::UnknownMessageType(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    match err {
        ProtocolError::Frame(err) => frame_error(context, err),
        ProtocolError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ProtocolError::Disconnected(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        ProtocolError::UnexpectedMessage { .. }
        | ProtocolError::Json(_)
        | ProtocolError::InvalidEncoding(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn meta_error(context: &str, err: MetaError) -> CliError {
    match err {
        MetaError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        MetaError::SendPrepare(source)
        | MetaError::SendStart(source)
        | MetaError::Receive(source)
        | MetaError::SendFinalize(source) => protocol_error(context, source),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ndtmeta_session::ScopeError;

    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = meta_error("meta", MetaError::Timeout(ScopeError::DeadlineExceeded));
        assert_eq!(err.code, TIMEOUT);

        let err = protocol_error("submit", ProtocolError::Timeout(Duration::from_secs(1)));
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn disconnect_is_transport_error() {
        let err = meta_error(
            "meta",
            MetaError::Receive(ProtocolError::Disconnected("closed".to_string())),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("meta: "));
    }

    #[test]
    fn peer_reset_is_transport_error() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
        ] {
            let err = meta_error(
                "meta",
                MetaError::SendStart(ProtocolError::Frame(FrameError::Io(io::Error::from(kind)))),
            );
            assert_eq!(err.code, TRANSPORT_ERROR, "{kind:?}");
        }
    }

    #[test]
    fn protocol_violation_is_data_invalid() {
        let err = protocol_error(
            "submit",
            ProtocolError::Frame(FrameError::UnknownMessageType(42)),
        );
        assert_eq!(err.code, DATA_INVALID);
    }
}
