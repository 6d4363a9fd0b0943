//! Bridge configuration.

use std::time::Duration;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5174";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(3000);

/// Settings shared by the relay, correlator, and assembly. Constructed once
/// per execution context and passed explicitly.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The single origin the relay accepts page packets from.
    pub allowed_origin: String,
    /// Origin stamped on packets this context sends. Normally equal to
    /// `allowed_origin`; tests set a mismatch to exercise rejection.
    pub page_origin: String,
    /// Fixed bound every correlated request races against.
    pub request_timeout: Duration,
}

impl BridgeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            page_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        self.page_origin = origin.clone();
        self.allowed_origin = origin;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = BridgeConfig::new();
        assert_eq!(config.allowed_origin, DEFAULT_ALLOWED_ORIGIN);
        assert_eq!(config.page_origin, config.allowed_origin);
        assert_eq!(config.request_timeout, Duration::from_millis(3000));
    }

    #[test]
    fn with_allowed_origin_keeps_page_origin_in_step() {
        let config = BridgeConfig::new().with_allowed_origin("https://game.example");
        assert_eq!(config.allowed_origin, "https://game.example");
        assert_eq!(config.page_origin, "https://game.example");
    }
}
