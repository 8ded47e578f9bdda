//! NDT5 meta test: collect client-reported metadata over an NDT5 control connection.
//!
//! # Crate Structure
//!
//! - [`frame`]: NDT5 message framing (type byte, big-endian length, payload)
//! - [`session`]: The meta test exchange, its channel abstraction, limits and metrics

/// Re-export frame types.
pub mod frame {
    pub use ndtmeta_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use ndtmeta_session::*;
}
