#![allow(dead_code)]

pub use render_driver_test_utils::builders;
pub use render_driver_test_utils::fake_backend;
pub use render_driver_test_utils::{init_tracing, with_timeout};

use render_driver::types::DriverStatus;
use tokio::sync::broadcast;

/// Collect transitions until (and including) the next `Idle`.
pub async fn collect_until_idle(rx: &mut broadcast::Receiver<DriverStatus>) -> Vec<DriverStatus> {
    let mut seen = Vec::new();
    loop {
        let status = rx.recv().await.expect("transition feed closed");
        seen.push(status);
        if status == DriverStatus::Idle {
            return seen;
        }
    }
}

/// Wait until the feed reports `target`.
pub async fn wait_for_status(rx: &mut broadcast::Receiver<DriverStatus>, target: DriverStatus) {
    loop {
        if rx.recv().await.expect("transition feed closed") == target {
            return;
        }
    }
}
