//! Resource governor: node, time, depth and size budgets.
//!
//! Every recursive descent in the validators and the inliner goes through the
//! governor. Exceeding a budget raises a tagged [`ResourceError`]; callers
//! either surface it as a file-level diagnostic (the sanitizer, for `Timeout`
//! and `NodeLimit`) or convert it to a reported issue plus a boolean failure
//! (the validators, for `DepthLimit` and `SizeLimit`).

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::Config;

/// Wall-clock poll cadence during node accounting.
const TIME_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// A tripped resource budget.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResourceError {
    #[error("Validation timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout { elapsed_ms: u64, budget_ms: u64 },

    #[error("Node count exceeded maximum of {max}")]
    NodeLimit { max: u64 },

    #[error("{kind} nesting depth exceeded maximum of {max}")]
    DepthLimit { kind: DepthKind, max: usize },

    #[error("{label} exceeds maximum size of {cap} (got {n})")]
    SizeLimit { label: &'static str, n: usize, cap: usize },
}

impl ResourceError {
    /// Whether this fault aborts the whole run rather than one statement.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ResourceError::Timeout { .. } | ResourceError::NodeLimit { .. })
    }
}

/// The three independently capped recursion depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthKind {
    Object,
    Chain,
    Argument,
}

impl std::fmt::Display for DepthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepthKind::Object => write!(f, "Object"),
            DepthKind::Chain => write!(f, "Chain"),
            DepthKind::Argument => write!(f, "Argument"),
        }
    }
}

/// Point-in-time counters, readable via [`Governor::stats`].
#[derive(Debug, Clone, Copy)]
pub struct GovernorStats {
    pub node_count: u64,
    pub elapsed: Duration,
    pub max_depth_reached: usize,
}

/// Process-local counters for one validation run.
///
/// Single-owner: one run, one governor. `reset` makes it reusable.
pub struct Governor {
    node_count: u64,
    start: Instant,
    last_time_check: Instant,
    max_depth_reached: usize,
    timeout: Duration,
    max_node_count: u64,
    max_object_depth: usize,
    max_chain_depth: usize,
    max_argument_nesting: usize,
}

impl Governor {
    pub fn new(config: &Config) -> Self {
        let now = Instant::now();
        Self {
            node_count: 0,
            start: now,
            last_time_check: now,
            max_depth_reached: 0,
            timeout: Duration::from_millis(config.timeout_ms),
            max_node_count: config.max_node_count,
            max_object_depth: config.max_object_depth,
            max_chain_depth: config.max_chain_depth,
            max_argument_nesting: config.max_argument_nesting,
        }
    }

    /// Zero the counters and stamp a fresh start time.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.node_count = 0;
        self.start = now;
        self.last_time_check = now;
        self.max_depth_reached = 0;
    }

    /// Account one visited node. Re-evaluates the wall clock at a 100ms
    /// cadence so hot traversal loops do not pay a syscall per node.
    pub fn increment_node(&mut self) -> Result<(), ResourceError> {
        self.node_count += 1;
        if self.node_count > self.max_node_count {
            return Err(ResourceError::NodeLimit { max: self.max_node_count });
        }

        let now = Instant::now();
        if now.duration_since(self.last_time_check) >= TIME_CHECK_INTERVAL {
            self.last_time_check = now;
            self.check_elapsed(now, self.timeout)?;
        }
        Ok(())
    }

    /// Strict post-check: fail once the full budget is spent.
    pub fn check_timeout(&mut self) -> Result<(), ResourceError> {
        let now = Instant::now();
        self.last_time_check = now;
        self.check_elapsed(now, self.timeout)
    }

    /// Aggressive pre-check: trips at 90% of the budget. Called immediately
    /// before a unit of work so we never start something we cannot finish.
    pub fn check_timeout_aggressive(&mut self) -> Result<(), ResourceError> {
        let now = Instant::now();
        self.last_time_check = now;
        self.check_elapsed(now, self.timeout.mul_f64(0.9))
    }

    fn check_elapsed(&self, now: Instant, budget: Duration) -> Result<(), ResourceError> {
        let elapsed = now.duration_since(self.start);
        if elapsed > budget {
            return Err(ResourceError::Timeout {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Compare `depth` against the cap for its kind and record the high-water
    /// mark shared by all three kinds.
    pub fn track_depth(&mut self, depth: usize, kind: DepthKind) -> Result<(), ResourceError> {
        if depth > self.max_depth_reached {
            self.max_depth_reached = depth;
        }
        let max = match kind {
            DepthKind::Object => self.max_object_depth,
            DepthKind::Chain => self.max_chain_depth,
            DepthKind::Argument => self.max_argument_nesting,
        };
        if depth > max {
            return Err(ResourceError::DepthLimit { kind, max });
        }
        Ok(())
    }

    /// Fail when a counted quantity exceeds its cap.
    pub fn validate_size(&self, n: usize, cap: usize, label: &'static str) -> Result<(), ResourceError> {
        if n > cap {
            return Err(ResourceError::SizeLimit { label, n, cap });
        }
        Ok(())
    }

    pub fn stats(&self) -> GovernorStats {
        GovernorStats {
            node_count: self.node_count,
            elapsed: self.start.elapsed(),
            max_depth_reached: self.max_depth_reached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn governor_with_nodes(max_node_count: u64) -> Governor {
        let config = Config {
            max_node_count,
            ..Config::relaxed()
        };
        Governor::new(&config)
    }

    #[test]
    fn node_limit_trips_exactly_past_cap() {
        let mut governor = governor_with_nodes(3);
        assert!(governor.increment_node().is_ok());
        assert!(governor.increment_node().is_ok());
        assert!(governor.increment_node().is_ok());
        assert_eq!(
            governor.increment_node(),
            Err(ResourceError::NodeLimit { max: 3 })
        );
    }

    #[test]
    fn depth_limit_is_per_kind() {
        let config = Config {
            max_object_depth: 2,
            max_chain_depth: 5,
            ..Config::relaxed()
        };
        let mut governor = Governor::new(&config);

        assert!(governor.track_depth(2, DepthKind::Object).is_ok());
        assert!(governor.track_depth(3, DepthKind::Object).is_err());
        // The chain budget is independent of the object budget.
        assert!(governor.track_depth(3, DepthKind::Chain).is_ok());
        assert_eq!(governor.stats().max_depth_reached, 3);
    }

    #[test]
    fn size_limit_carries_label() {
        let governor = governor_with_nodes(10);
        let err = governor.validate_size(11, 10, "array length").unwrap_err();
        assert_eq!(
            err,
            ResourceError::SizeLimit { label: "array length", n: 11, cap: 10 }
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn reset_zeroes_counters() {
        let mut governor = governor_with_nodes(100);
        governor.increment_node().unwrap();
        governor.track_depth(4, DepthKind::Chain).unwrap();
        governor.reset();

        let stats = governor.stats();
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.max_depth_reached, 0);
    }

    #[test]
    fn fatal_faults_are_timeout_and_node_limit() {
        assert!(ResourceError::Timeout { elapsed_ms: 2, budget_ms: 1 }.is_fatal());
        assert!(ResourceError::NodeLimit { max: 1 }.is_fatal());
        assert!(!ResourceError::DepthLimit { kind: DepthKind::Chain, max: 1 }.is_fatal());
    }
}
