/// Configuration for RPC provider retry behavior
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RPCRetryConfig {
    /// Maximum number of retry attempts for failed requests (default: 3)
    pub max_retries: usize,
    /// Initial backoff delay in milliseconds (default: 100ms)
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds (default: 5000ms)
    pub max_backoff_ms: u64,
}

impl RPCRetryConfig {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self { max_retries, initial_backoff_ms, max_backoff_ms }
    }

    /// No retries at all, every transient failure is reported immediately.
    pub fn disabled() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }
}

impl Default for RPCRetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_backoff_ms: 100, max_backoff_ms: 5000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_config() {
        let config = RPCRetryConfig::default();

        assert_eq!(config, RPCRetryConfig::new(3, 100, 5000));
    }

    #[test]
    fn test_disabled_retry_config_keeps_backoff_defaults() {
        let config = RPCRetryConfig::disabled();

        assert_eq!(config.max_retries, 0);
        assert_eq!(config.initial_backoff_ms, 100);
    }
}
