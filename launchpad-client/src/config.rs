use std::time::Duration;

/// Timing and budget knobs of a launch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// How often to ask the signer whether a submitted transaction was included (default: 2s)
    pub poll_interval: Duration,
    /// How long to wait for inclusion before handing the step over to verification
    /// (default: 180s). Time spent waiting for a signature is not bounded.
    pub confirmation_timeout: Duration,
    /// Pause between two verification reads (default: 5s)
    pub verify_interval: Duration,
    /// Verification reads before a step is reported as timed out (default: 12)
    pub max_verify_attempts: u32,
    /// Steps a single run may execute (default: 8)
    pub max_steps: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            confirmation_timeout: Duration::from_secs(180),
            verify_interval: Duration::from_secs(5),
            max_verify_attempts: 12,
            max_steps: 8,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_confirmation_timeout(mut self, confirmation_timeout: Duration) -> Self {
        self.confirmation_timeout = confirmation_timeout;
        self
    }

    pub fn with_verify_interval(mut self, verify_interval: Duration) -> Self {
        self.verify_interval = verify_interval;
        self
    }

    pub fn with_max_verify_attempts(mut self, max_verify_attempts: u32) -> Self {
        self.max_verify_attempts = max_verify_attempts.max(1);
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }
}
