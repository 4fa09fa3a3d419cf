//! Injectable time source.
//!
//! Subsystems that stamp activity (session connect times, last-message
//! times) take a [`Clock`] at construction so tests can fix "now".

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// The wall clock. Default [`Clock`] everywhere outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Returns the default shared clock.
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}
