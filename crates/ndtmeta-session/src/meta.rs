//! The meta test: TestPrepare, TestStart, a bounded run of `name:value`
//! TestMsg lines from the client, then TestFinalize.

use std::collections::BTreeMap;

use ndtmeta_frame::MessageType;

use crate::config::MetaConfig;
use crate::error::{MetaError, ProtocolError, Result};
use crate::messager::Messager;
use crate::metrics::{self, MetricsSink};
use crate::scope::TestScope;

/// Metrics label for this test.
const TEST_LABEL: &str = "meta";

/// All meta data reported by the client.
pub type ArchivalData = BTreeMap<String, String>;

/// Run the meta test with default limits, recording into the global metrics.
///
/// If `scope` is cancelled or the test runs past its 15 second deadline, this
/// returns after the next receive completes. The messager must bound each
/// receive with its own timeout so a slow-drip client cannot hold the
/// exchange open.
pub fn manage_test<M: Messager + ?Sized>(
    scope: &TestScope,
    messager: &mut M,
) -> Result<ArchivalData> {
    manage_test_with_config(scope, messager, &MetaConfig::default(), metrics::global())
}

/// Run the meta test with explicit limits and metrics sink.
pub fn manage_test_with_config<M: Messager + ?Sized>(
    scope: &TestScope,
    messager: &mut M,
    config: &MetaConfig,
    metrics: &dyn MetricsSink,
) -> Result<ArchivalData> {
    let fail = |err: MetaError| {
        tracing::warn!(test = TEST_LABEL, step = err.step(), error = %err, "meta test failed");
        metrics.inc_error(TEST_LABEL, err.step());
        err
    };

    messager
        .send_message(MessageType::TestPrepare, &[])
        .map_err(|err| fail(MetaError::SendPrepare(err)))?;
    messager
        .send_message(MessageType::TestStart, &[])
        .map_err(|err| fail(MetaError::SendStart(err)))?;

    let local = scope.child_with_timeout(config.timeout);
    let _release = local.cancel_on_drop();

    let mut results = ArchivalData::new();
    let mut count = 0usize;
    let mut receive_err: Option<ProtocolError> = None;

    while count < config.max_client_messages && local.err().is_none() {
        let message = match messager.receive_message(MessageType::TestMsg) {
            Ok(message) if message.is_empty() => break,
            Ok(message) => message,
            Err(err) => {
                receive_err = Some(err);
                break;
            }
        };
        count += 1;

        let line = String::from_utf8_lossy(&message);
        match parse_meta_line(&line, config) {
            Some((name, value)) => {
                tracing::trace!(name = %name, "meta value received");
                results.insert(name, value);
            }
            None => tracing::debug!(size = message.len(), "skipping meta line without ':'"),
        }
    }

    // Deadline before transport error before success.
    if let Some(scope_err) = local.err() {
        return Err(fail(MetaError::Timeout(scope_err)));
    }
    if let Some(err) = receive_err {
        return Err(fail(MetaError::Receive(err)));
    }

    metrics.observe_submitted_meta_values(count);
    messager
        .send_message(MessageType::TestFinalize, &[])
        .map_err(|err| fail(MetaError::SendFinalize(err)))?;

    tracing::debug!(accepted = count, stored = results.len(), "meta test complete");
    Ok(results)
}

/// Parse one client line of the form `name:value`.
///
/// Splits on the first `:`, trims both halves, then truncates them to the
/// configured byte limits on a char boundary. Returns `None` when the line has
/// no `:`.
pub fn parse_meta_line(line: &str, config: &MetaConfig) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = truncate(name.trim(), config.max_name_len);
    let value = truncate(value.trim(), config.max_value_len);
    Some((name.to_string(), value.to_string()))
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
