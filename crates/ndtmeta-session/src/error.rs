use std::time::Duration;

use ndtmeta_frame::{FrameError, MessageType};

use crate::scope::ScopeError;

/// Errors raised by a [`Messager`](crate::Messager) while sending or receiving.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The peer sent a message of a different type than expected.
    #[error("expected {expected} message, got {got}")]
    UnexpectedMessage {
        expected: MessageType,
        got: MessageType,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload cannot be carried by the configured encoding.
    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(String),

    /// No message arrived within the channel's own read timeout.
    #[error("receive timed out after {0:?}")]
    Timeout(Duration),

    /// Peer disconnected.
    #[error("peer disconnected: {0}")]
    Disconnected(String),
}

/// Terminal failures of a meta test exchange.
///
/// No variant carries partial metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("sending TestPrepare failed: {0}")]
    SendPrepare(#[source] ProtocolError),

    #[error("sending TestStart failed: {0}")]
    SendStart(#[source] ProtocolError),

    /// The local deadline elapsed or the parent scope was cancelled.
    #[error("meta test aborted: {0}")]
    Timeout(#[source] ScopeError),

    #[error("receiving meta data failed: {0}")]
    Receive(#[source] ProtocolError),

    #[error("sending TestFinalize failed: {0}")]
    SendFinalize(#[source] ProtocolError),
}

impl MetaError {
    /// Label of the protocol step that failed, as used by the error counter.
    pub fn step(&self) -> &'static str {
        match self {
            MetaError::SendPrepare(_) => "TestPrepare",
            MetaError::SendStart(_) => "TestStart",
            MetaError::Timeout(_) => "context.Err",
            MetaError::Receive(_) => "ReceiveMessage",
            MetaError::SendFinalize(_) => "TestFinalize",
        }
    }
}

pub type Result<T> = std::result::Result<T, MetaError>;
