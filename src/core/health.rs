use tracing::{debug, info};

use crate::api::{DispatchError, HealthResponse, MedAssistBackend};

/// Status indicators fed by the one-shot startup probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthStatus {
    /// False until the probe has finished.
    pub checked: bool,
    /// The backend answered the probe with a well-formed 2xx.
    pub server_reachable: bool,
    /// The backend reported its vector index connection as up.
    pub index_connected: bool,
}

impl HealthStatus {
    pub fn from_result(result: Result<HealthResponse, DispatchError>) -> Self {
        match result {
            Ok(response) => {
                if let Some(error) = response.error.as_deref() {
                    debug!(error, "backend reported a degraded index");
                }
                Self {
                    checked: true,
                    server_reachable: true,
                    index_connected: response.endee_connected,
                }
            }
            Err(err) => {
                debug!(%err, "health probe failed; treating backend as disconnected");
                Self {
                    checked: true,
                    server_reachable: false,
                    index_connected: false,
                }
            }
        }
    }
}

/// Probe `/api/health` once. Failures never surface beyond the indicator.
pub async fn check_health(backend: &dyn MedAssistBackend) -> HealthStatus {
    let status = HealthStatus::from_result(backend.health().await);
    info!(
        server_reachable = status.server_reachable,
        index_connected = status.index_connected,
        "health probe finished"
    );
    status
}
