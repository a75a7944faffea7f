use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// Detects cold wakes of the hosting process.
///
/// Free-tier hosts pause idle processes; the first webhook delivery after a
/// long gap arrives while the host is still spinning back up. Observing a gap
/// longer than the idle threshold (or the first call after a restart) inserts
/// a fixed delay before the update is processed. Best effort only.
pub struct WakeGuard {
    idle_threshold: Duration,
    wake_delay: Duration,
    // std Mutex: never held across an await; the wake sleep runs after release.
    last_seen: Mutex<Option<Instant>>,
}

impl WakeGuard {
    pub fn new(idle_threshold: Duration, wake_delay: Duration) -> Self {
        Self {
            idle_threshold,
            wake_delay,
            last_seen: Mutex::new(None),
        }
    }

    /// Records one webhook call, sleeping first if it looks like a cold wake.
    ///
    /// The cold/warm decision and the timestamp update both happen under the
    /// lock; the sleep itself does not hold it, so concurrent requests during
    /// a wake are delayed but not serialized.
    pub async fn observe(&self) {
        let now = Instant::now();

        let cold = {
            let guard = self.last_seen.lock().unwrap();
            match *guard {
                Some(prev) => now.duration_since(prev) > self.idle_threshold,
                None => true,
            }
        };

        if cold {
            info!(
                "Cold wake detected, delaying {}ms before processing",
                self.wake_delay.as_millis()
            );
            tokio::time::sleep(self.wake_delay).await;
        }

        *self.last_seen.lock().unwrap() = Some(now);
    }
}
