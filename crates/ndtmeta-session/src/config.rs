use std::time::Duration;

/// Limits applied to a single meta test exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaConfig {
    /// Maximum number of data messages accepted from the client.
    pub max_client_messages: usize,
    /// Wall-clock bound on the exchange, measured from the start of the receive loop.
    pub timeout: Duration,
    /// Maximum stored name length in bytes.
    pub max_name_len: usize,
    /// Maximum stored value length in bytes.
    pub max_value_len: usize,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            max_client_messages: 20,
            timeout: Duration::from_secs(15),
            max_name_len: 63,
            max_value_len: 255,
        }
    }
}
