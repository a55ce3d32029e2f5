// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scope-exit timing for store operations.

use std::time::{Duration, Instant};

/// Operations holding the database longer than this are logged as slow.
pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_secs(5);

/// Guard that logs how long a store operation took when it goes out of scope.
///
/// Created at the top of every repository method, so the timing is recorded on
/// every exit path including early `?` returns.
#[derive(Debug)]
pub struct QueryTimer {
    operation: &'static str,
    started: Instant,
    threshold: Duration,
}

impl QueryTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
            threshold: SLOW_OPERATION_THRESHOLD,
        }
    }

    #[cfg(test)]
    fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed > self.threshold
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        if self.is_slow(elapsed) {
            tracing::warn!(
                operation = self.operation,
                elapsed_ms,
                threshold_ms = self.threshold.as_millis() as u64,
                "Slow store operation"
            );
        } else {
            tracing::trace!(operation = self.operation, elapsed_ms, "Store operation");
        }
    }
}
