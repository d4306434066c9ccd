// Inter-page pacing for paginated fetches
use std::time::Duration;

/// Pacing configuration for paginated API traversal
///
/// There is deliberately no retry here: a failed fetch is terminal for the
/// run and the operator reschedules. The only knob is how long we wait
/// between consecutive pages so a large organization doesn't burn quota in
/// a tight loop.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    pub page_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 100, // Polite floor between pages
        }
    }
}

impl PacingConfig {
    /// No delay at all - for tests and mock servers
    pub fn none() -> Self {
        Self { page_delay_ms: 0 }
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}
