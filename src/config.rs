//! Transport tuning for the gateway channel
//!
//! These knobs apply to the underlying HTTP/2 connection; they are independent
//! of transport security and credential strategy.

use crate::error::{Result, SkeinError};
use std::time::Duration;

/// Configuration for the gateway channel.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout applied to each RPC
    pub request_timeout: Duration,
    /// Timeout for establishing the underlying connection
    pub connect_timeout: Duration,
    /// Interval between HTTP/2 keep-alive pings
    pub keep_alive_interval: Duration,
    /// How long to wait for a keep-alive acknowledgment before the connection
    /// is considered dead
    pub keep_alive_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ClientConfig {
    /// Default configuration suitable for most use cases
    pub const DEFAULT: Self = Self {
        request_timeout: Duration::from_secs(20),
        connect_timeout: Duration::from_secs(10),
        keep_alive_interval: Duration::from_secs(45),
        keep_alive_timeout: Duration::from_secs(20),
    };

    pub(crate) fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(SkeinError::InvalidConfiguration(
                "request_timeout must be positive".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(SkeinError::InvalidConfiguration(
                "connect_timeout must be positive".to_string(),
            ));
        }
        if self.keep_alive_interval.is_zero() {
            return Err(SkeinError::InvalidConfiguration(
                "keep_alive_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
