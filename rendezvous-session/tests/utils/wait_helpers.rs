use rendezvous_session::{Phase, SessionCoordinator};
use std::future::Future;
use std::time::Duration;

/// Timeout for a single participant to reach a phase (ms).
pub const PHASE_TIMEOUT_MS: u64 = 5000;

/// Grace period used when asserting that something does NOT happen (ms).
pub const QUIET_PERIOD_MS: u64 = 200;

/// Wait until `coordinator` reports `phase`.
pub async fn wait_for_phase(
    coordinator: &SessionCoordinator,
    phase: Phase,
    timeout_ms: u64,
) -> bool {
    let mut rx = coordinator.watch_phase();
    tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        rx.wait_for(|current| *current == phase),
    )
    .await
    .map(|reached| reached.is_ok())
    .unwrap_or(false)
}

/// Poll `condition` every 10ms until it holds or the timeout expires.
pub async fn wait_until<F, Fut>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if condition().await {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
