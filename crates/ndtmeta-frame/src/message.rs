//! NDT5 message types.
//!
//! The type byte is the first byte of every message on the control connection.

use std::fmt;

use crate::error::FrameError;

/// Message type carried in the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    CommFailure = 0,
    SrvQueue = 1,
    Login = 2,
    /// Server announces a test is about to begin.
    TestPrepare = 3,
    /// Server signals the client may start the test.
    TestStart = 4,
    /// Test data, in either direction.
    TestMsg = 5,
    /// Server signals the test is complete.
    TestFinalize = 6,
    Error = 7,
    Results = 8,
    Logout = 9,
    Waiting = 10,
    ExtendedLogin = 11,
}

impl MessageType {
    /// Wire value of this type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable name for the message type.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::CommFailure => "CommFailure",
            MessageType::SrvQueue => "SrvQueue",
            MessageType::Login => "MsgLogin",
            MessageType::TestPrepare => "TestPrepare",
            MessageType::TestStart => "TestStart",
            MessageType::TestMsg => "TestMsg",
            MessageType::TestFinalize => "TestFinalize",
            MessageType::Error => "MsgError",
            MessageType::Results => "MsgResults",
            MessageType::Logout => "MsgLogout",
            MessageType::Waiting => "MsgWaiting",
            MessageType::ExtendedLogin => "MsgExtendedLogin",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, FrameError> {
        let kind = match value {
            0 => MessageType::CommFailure,
            1 => MessageType::SrvQueue,
            2 => MessageType::Login,
            3 => MessageType::TestPrepare,
            4 => MessageType::TestStart,
            5 => MessageType::TestMsg,
            6 => MessageType::TestFinalize,
            7 => MessageType::Error,
            8 => MessageType::Results,
            9 => MessageType::Logout,
            10 => MessageType::Waiting,
            11 => MessageType::ExtendedLogin,
            other => return Err(FrameError::UnknownMessageType(other)),
        };
        Ok(kind)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
