//! Store availability tracking.
//!
//! [`HealthMonitor`] is the pure state machine: it folds probe outcomes into a
//! [`ConnectionState`] and a retry counter and decides how long to sleep.
//! [`run`] is the background loop that drives it and reports to the session.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::transport::{execute_with_timeout, Transport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Result of folding one probe into the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub state: ConnectionState,
    pub retry_count: u32,
    /// The store just became reachable after being unknown or offline.
    pub reconnected: bool,
}

impl ProbeReport {
    pub fn status_text(&self) -> String {
        match self.state {
            ConnectionState::Connected => "Connected ✓".to_string(),
            ConnectionState::Disconnected if self.retry_count > 0 => {
                format!("Backend offline (Retry {})", self.retry_count)
            }
            ConnectionState::Disconnected => "Backend offline".to_string(),
            ConnectionState::Unknown => "Checking backend...".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthMonitor {
    state: ConnectionState,
    retry_count: u32,
    connected_interval: u32,
    max_backoff: u32,
}

impl HealthMonitor {
    pub fn new(connected_interval: u32, max_backoff: u32) -> Self {
        HealthMonitor {
            state: ConnectionState::Unknown,
            retry_count: 0,
            connected_interval,
            max_backoff,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn record_success(&mut self) -> ProbeReport {
        let reconnected = self.state != ConnectionState::Connected;
        self.state = ConnectionState::Connected;
        self.retry_count = 0;
        self.report(reconnected)
    }

    pub fn record_failure(&mut self) -> ProbeReport {
        self.state = ConnectionState::Disconnected;
        self.retry_count = self.retry_count.saturating_add(1);
        self.report(false)
    }

    /// Manual retry: forget the failure streak so backoff restarts small.
    pub fn reset_retries(&mut self) {
        self.retry_count = 0;
    }

    /// Time units to wait before the next probe: a fixed interval while
    /// connected, `min(2^retry_count, max_backoff)` otherwise.
    pub fn delay_units(&self) -> u32 {
        match self.state {
            ConnectionState::Connected => self.connected_interval,
            ConnectionState::Unknown | ConnectionState::Disconnected => {
                let backoff = 1u64
                    .checked_shl(self.retry_count)
                    .unwrap_or(u64::MAX)
                    .min(u64::from(self.max_backoff));
                backoff as u32
            }
        }
    }

    fn report(&self, reconnected: bool) -> ProbeReport {
        ProbeReport {
            state: self.state,
            retry_count: self.retry_count,
            reconnected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Reset the retry counter and probe now, out of band.
    RetryNow,
}

/// Probe loop. Sends one report per probe on `reports`; returns only when
/// the receiving side or the command sender is gone.
pub(crate) async fn run<T, M>(
    client: TodoClient,
    transport: Arc<T>,
    config: ClientConfig,
    mut commands: mpsc::UnboundedReceiver<MonitorCommand>,
    reports: mpsc::UnboundedSender<M>,
) where
    T: Transport,
    M: From<ProbeReport> + Send,
{
    let mut monitor = HealthMonitor::new(config.connected_interval, config.max_backoff);
    loop {
        let outcome = execute_with_timeout(&*transport, client.build_health())
            .await
            .and_then(|response| client.parse_health(response));
        let report = match outcome {
            Ok(()) => monitor.record_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health probe failed");
                monitor.record_failure()
            }
        };
        if reports.send(M::from(report)).is_err() {
            return;
        }

        let delay = config.units(monitor.delay_units());
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            command = commands.recv() => match command {
                Some(MonitorCommand::RetryNow) => monitor.reset_retries(),
                None => return,
            },
        }
    }
}
