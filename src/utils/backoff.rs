//! Retry pacing for device fetches (fixed delay) and API delivery
//! (linearly growing delay: 1x, 2x, 3x ... of a base unit).

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    linear: bool,
}

impl Backoff {
    /// Same delay between every attempt.
    pub fn fixed(base: Duration) -> Self {
        Self { base, linear: false }
    }

    /// Delay grows with the attempt number: base, 2*base, 3*base, ...
    pub fn linear(base: Duration) -> Self {
        Self { base, linear: true }
    }

    /// Delay to wait after the given 1-based attempt failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.linear {
            self.base * attempt.max(1)
        } else {
            self.base
        }
    }

    /// Sleep out the delay for the given failed attempt.
    pub fn wait_after(&self, attempt: u32) {
        let d = self.delay_after(attempt);
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}
