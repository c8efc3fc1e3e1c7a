use std::time::Duration;

use crate::client::TodoClient;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Timing and endpoint settings for a [`Session`](crate::Session).
///
/// Intervals are expressed in whole time units so tests can shrink the unit
/// without touching the ratios.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub time_unit: Duration,
    /// Delay between probes while connected.
    pub connected_interval: u32,
    /// Upper bound on the disconnected backoff.
    pub max_backoff: u32,
    pub probe_timeout: u32,
    pub request_timeout: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            time_unit: Duration::from_secs(1),
            connected_interval: 5,
            max_backoff: 30,
            probe_timeout: 3,
            request_timeout: 5,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        ClientConfig {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = unit;
        self
    }

    pub fn units(&self, n: u32) -> Duration {
        self.time_unit * n
    }

    pub fn client(&self) -> TodoClient {
        TodoClient::new(&self.base_url)
            .with_timeouts(self.units(self.probe_timeout), self.units(self.request_timeout))
    }
}
