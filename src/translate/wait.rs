use std::time::Duration;
use tokio::time::Instant;

/// Bounded polling: check a condition every `poll_interval` until `timeout` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn start(&self) -> Poller {
        Poller {
            deadline: Instant::now() + self.timeout,
            poll_interval: self.poll_interval,
        }
    }
}

/// Deadline tracker for a probe loop.
///
/// ```ignore
/// let mut poller = wait.start();
/// loop {
///     if probe().await { break; }
///     if !poller.tick().await { /* timed out */ break; }
/// }
/// ```
#[derive(Debug)]
pub struct Poller {
    deadline: Instant,
    poll_interval: Duration,
}

impl Poller {
    /// Sleeps until the next probe. Returns `false` once the deadline has passed.
    ///
    /// The last sleep is clipped to the deadline so a final probe runs right at it.
    pub async fn tick(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.deadline {
            return false;
        }
        let remaining = self.deadline - now;
        tokio::time::sleep(self.poll_interval.min(remaining)).await;
        true
    }
}
