//! Bounded retry loop with pluggable acceptance checkers.
//!
//! The loop never fails. It returns the first attempt every checker accepts,
//! or, once `max_retries` attempts have been made, the final attempt as a
//! best-effort result. Only the most recent attempt is held in memory.

use std::fmt;
use std::num::NonZeroU32;

use tracing::{debug, warn};

use crate::core::checkers::Checker;

/// Result of a retry loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<A> {
    pub artifact: A,
    /// Number of times the generator was invoked (1-indexed).
    pub attempts: u32,
    /// `false` when retries were exhausted and `artifact` is the last attempt.
    pub accepted: bool,
}

impl<A> RetryOutcome<A> {
    /// Convert the artifact, keeping the attempt bookkeeping.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> RetryOutcome<B> {
        RetryOutcome {
            artifact: f(self.artifact),
            attempts: self.attempts,
            accepted: self.accepted,
        }
    }
}

/// Runs a generator until its output is accepted or the attempt budget is spent.
pub struct RetryLoop<A> {
    label: &'static str,
    max_retries: NonZeroU32,
    checkers: Vec<Box<dyn Checker<A>>>,
}

impl<A> fmt::Debug for RetryLoop<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.checkers.iter().map(|c| c.name()).collect();
        f.debug_struct("RetryLoop")
            .field("label", &self.label)
            .field("max_retries", &self.max_retries)
            .field("checkers", &names)
            .finish()
    }
}

impl<A> RetryLoop<A> {
    pub fn new(label: &'static str, max_retries: NonZeroU32) -> Self {
        Self {
            label,
            max_retries,
            checkers: Vec::new(),
        }
    }

    /// Register a checker. Checkers run in registration order.
    pub fn with_checker(mut self, checker: impl Checker<A> + 'static) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.get()
    }

    /// Invoke `generate` up to `max_retries` times.
    pub fn run<F>(&self, mut generate: F) -> RetryOutcome<A>
    where
        F: FnMut() -> A,
    {
        let max = self.max_retries.get();
        let mut attempt = 1;
        loop {
            let artifact = generate();
            match self.first_rejection(&artifact) {
                None => {
                    debug!(stage = self.label, attempt, "attempt accepted");
                    return RetryOutcome {
                        artifact,
                        attempts: attempt,
                        accepted: true,
                    };
                }
                Some(checker) if attempt >= max => {
                    warn!(
                        stage = self.label,
                        attempts = attempt,
                        checker,
                        "retries exhausted, keeping last attempt"
                    );
                    return RetryOutcome {
                        artifact,
                        attempts: attempt,
                        accepted: false,
                    };
                }
                Some(checker) => {
                    debug!(stage = self.label, attempt, checker, "attempt rejected");
                }
            }
            attempt += 1;
        }
    }

    /// Name of the first rejecting checker; later checkers are skipped.
    fn first_rejection(&self, artifact: &A) -> Option<&'static str> {
        self.checkers
            .iter()
            .find(|checker| !checker.check(artifact).is_accepted())
            .map(|checker| checker.name())
    }
}
