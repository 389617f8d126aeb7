//! Injectable clock used by [`crate::TimestampSigner`] so tests can freeze
//! time instead of depending on the wall clock.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since `1970-01-01T00:00:00Z` (not the library's 2011 epoch --
/// that offset is applied by [`crate::timestamp`]).
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Reads the OS wall clock. The default for every `TimestampSigner`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs()
    }
}

/// A clock that always reports the same instant. Useful in tests that need
/// to assert exact expiry behavior without racing the real clock.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

pub(crate) fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}
