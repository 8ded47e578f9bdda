//! NDT5 meta test exchange.
//!
//! After the control connection is up, the server asks the client for a small
//! set of `name:value` metadata lines (client OS, browser, ...) and collects
//! them under a message quota and a wall-clock deadline.

pub mod client;
pub mod config;
pub mod error;
pub mod messager;
pub mod meta;
pub mod metrics;
pub mod scope;

pub use client::submit_meta;
pub use config::MetaConfig;
pub use error::{MetaError, ProtocolError, Result};
pub use messager::{Encoding, FramedMessager, Messager};
pub use meta::{manage_test, manage_test_with_config, parse_meta_line, ArchivalData};
pub use metrics::{
    ErrorCount, HistogramSnapshot, MetaMetrics, MetricsSink, MetricsSnapshot, NoopMetrics,
};
pub use scope::{ScopeError, TestScope};
