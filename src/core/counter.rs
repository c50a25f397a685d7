use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide request counter shared by every in-flight request.
///
/// Each logical request takes exactly one value from [`increment`], and no
/// two callers ever observe the same value. The counter is never reset and
/// starts at 0, so the first decided request sees 1.
///
/// [`increment`]: RequestCounter::increment
#[derive(Debug, Default)]
pub struct RequestCounter {
    value: AtomicU64,
}

impl RequestCounter {
    /// Create a counter starting at 0
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter with a given current value
    pub fn starting_at(value: u64) -> Self {
        Self {
            value: AtomicU64::new(value),
        }
    }

    /// Atomically increment the counter and return the new value
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    /// Snapshot of the current value
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}
