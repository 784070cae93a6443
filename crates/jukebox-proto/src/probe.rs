//! ConnectionProbe: point the service at an endpoint and report whether it
//! answered.
//!
//! A probe never returns an error: an unreachable server is an ordinary
//! outcome. After `try_connect` the service is either connected to the
//! requested endpoint or disconnected; reconnecting somewhere sane after a
//! failure is the caller's job (see `restore`).

use std::time::Duration;

use tracing::{debug, warn};

use crate::mpd::ServiceHandle;
use crate::settings::ConnectionParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Connected,
    Failed { reason: String },
}

impl ProbeOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ProbeOutcome::Connected)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectionProbe {
    timeout: Duration,
}

impl ConnectionProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn try_connect<S: ServiceHandle>(
        &self,
        service: &mut S,
        params: &ConnectionParams,
    ) -> ProbeOutcome {
        service.disconnect().await;
        service.set_params(params.clone());
        debug!("probe: trying {}", params);
        match service.connect(self.timeout).await {
            Ok(()) => ProbeOutcome::Connected,
            Err(e) => {
                // Leave no half-open state behind.
                service.disconnect().await;
                ProbeOutcome::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    /// Put the service back on `snapshot`. A failure here is logged, not
    /// returned: the parameters are restored either way, the live server is
    /// simply down.
    pub async fn restore<S: ServiceHandle>(&self, service: &mut S, snapshot: &ConnectionParams) {
        if let ProbeOutcome::Failed { reason } = self.try_connect(service, snapshot).await {
            warn!("probe: could not reconnect to {}: {}", snapshot, reason);
        }
    }
}
