//! Hall-edge pulse accumulator shared between the edge interrupt and the
//! control loop.
//!
//! The producer only ever increments, the consumer only ever reads and clears.
//! Both are single atomic read-modify-write operations, so an edge that lands
//! while the loop is reading is counted exactly once, in one window or the
//! next.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// The counter hit `u32::MAX` inside one window; the true count is unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterOverflow;

impl fmt::Display for CounterOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("pulse counter saturated within one sampling window")
    }
}

#[derive(Debug)]
pub struct PulseCounter {
    count: AtomicU32,
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseCounter {
    /// Saturation sentinel. A window that reaches it is reported as overflowed.
    pub const LIMIT: u32 = u32::MAX;

    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Record one rising edge. Safe to call from interrupt context.
    ///
    /// Saturates at [`Self::LIMIT`] instead of wrapping back to zero.
    #[inline]
    pub fn on_edge(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| c.checked_add(1));
    }

    /// Record `n` edges at once, for sources that count in batches.
    ///
    /// Saturates like [`Self::on_edge`].
    #[inline]
    pub fn add_edges(&self, n: u32) {
        let _ = self
            .count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some(c.saturating_add(n)));
    }

    /// Take the number of edges seen since the previous call and reset to zero
    /// in the same atomic step.
    #[inline]
    pub fn read_and_clear(&self) -> Result<u32, CounterOverflow> {
        match self.count.swap(0, Ordering::AcqRel) {
            Self::LIMIT => Err(CounterOverflow),
            n => Ok(n),
        }
    }

    /// Edges accumulated so far in the current window, without clearing.
    #[inline]
    pub fn pending(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}
