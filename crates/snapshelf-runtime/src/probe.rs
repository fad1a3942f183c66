use std::time::Duration;
use tracing::debug;

pub const DEFAULT_STORE_URL: &str = "https://api.snapcraft.io";

/// Whether the online store answers at all within `timeout`.
///
/// Any HTTP response counts, including error statuses; only transport
/// failures (DNS, refused connection, timeout) mean unreachable.
pub fn store_reachable(url: &str, timeout: Duration) -> bool {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into();
    match agent.get(url).call() {
        Ok(resp) => {
            debug!("store probe {url}: HTTP {}", resp.status().as_u16());
            true
        }
        Err(e) => {
            debug!("store probe {url} failed: {e}");
            false
        }
    }
}
