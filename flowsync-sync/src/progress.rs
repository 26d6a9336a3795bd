//! Progress budgeting for traversals whose size is discovered on the way.
//!
//! A traversal is handed a [`Budget`]; it splits that budget evenly across
//! the items it finds at each level and calls [`Progress::consume`] as each
//! leaf completes. Consumption is clamped at the tracker's ceiling, so a
//! traversal can fall short of its budget but never overrun it.

use std::fmt;

/// A share of the total work, as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Budget(f64);

impl Budget {
    pub const ZERO: Budget = Budget(0.0);
    pub const FULL: Budget = Budget(1.0);

    /// Negative and non-finite values collapse to zero.
    pub fn new(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self(value)
        } else {
            Self::ZERO
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Even share for each of `n` items; zero when there are no items.
    pub fn split(self, n: usize) -> Budget {
        if n == 0 {
            Budget::ZERO
        } else {
            Budget(self.0 / n as f64)
        }
    }

    pub fn half(self) -> Budget {
        Budget(self.0 / 2.0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

/// Observer notified after every consumption.
pub trait ProgressSink {
    fn on_progress(&mut self, consumed: f64, total: f64);
}

/// Shared progress counter. Only ever increases.
pub struct Progress {
    consumed: f64,
    total: f64,
    sink: Option<Box<dyn ProgressSink>>,
}

impl Progress {
    /// A tracker whose ceiling is `total`.
    pub fn new(total: Budget) -> Self {
        Self {
            consumed: 0.0,
            total: total.value(),
            sink: None,
        }
    }

    pub fn with_sink(total: Budget, sink: Box<dyn ProgressSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new(total)
        }
    }

    pub fn consume(&mut self, amount: Budget) {
        if amount.is_zero() {
            return;
        }
        self.consumed = (self.consumed + amount.value()).min(self.total);
        if let Some(sink) = self.sink.as_mut() {
            sink.on_progress(self.consumed, self.total);
        }
    }

    pub fn consumed(&self) -> f64 {
        self.consumed
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Budget not yet consumed.
    pub fn remaining(&self) -> Budget {
        Budget::new(self.total - self.consumed)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(Budget::FULL)
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("consumed", &self.consumed)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
