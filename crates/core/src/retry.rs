//! Retry policies for provider calls.
//!
//! A [`RetryPolicy`] is a plain value: how many extra attempts are
//! allowed, how long to wait before each, and which failure classes are
//! worth retrying at all. The async executor lives in the pipeline crate;
//! this module only answers "retry?" and "how long?".

use std::time::Duration;

/// Coarse classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Timeout,
    Connection,
    RateLimited,
    Other,
}

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `step * retry`: 10s, 20s, 30s for a 10s step.
    Linear { step: Duration },
    /// `base * 2^(retry - 1)`: 2s, 4s, 8s for a 2s base.
    Exponential { base: Duration },
}

/// Which failure classes a policy retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryable {
    Any,
    Only(&'static [FailureClass]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub backoff: Backoff,
    pub retryable: Retryable,
}

impl RetryPolicy {
    /// Base image generation: transient network failures only, 10s/20s/30s.
    pub const fn base_image() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::Linear {
                step: Duration::from_secs(10),
            },
            retryable: Retryable::Only(&[FailureClass::Timeout, FailureClass::Connection]),
        }
    }

    /// Direction transforms: any failure, 2s then 4s.
    pub const fn direction_transform() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(2),
            },
            retryable: Retryable::Any,
        }
    }

    /// Animation calls: provider rate limiting only, 5s per attempt.
    pub const fn rate_limited() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::Linear {
                step: Duration::from_secs(5),
            },
            retryable: Retryable::Only(&[FailureClass::RateLimited]),
        }
    }

    /// Policy that never retries.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Backoff::Linear {
                step: Duration::ZERO,
            },
            retryable: Retryable::Any,
        }
    }

    pub fn is_retryable(&self, class: FailureClass) -> bool {
        match self.retryable {
            Retryable::Any => true,
            Retryable::Only(classes) => classes.contains(&class),
        }
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        match self.backoff {
            Backoff::Linear { step } => step.saturating_mul(retry),
            Backoff::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(retry - 1))
            }
        }
    }

    /// Whether a failure of `class` after `retries_done` retries gets
    /// another attempt.
    pub fn should_retry(&self, class: FailureClass, retries_done: u32) -> bool {
        retries_done < self.max_retries && self.is_retryable(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(policy: &RetryPolicy) -> Vec<u64> {
        (1..=policy.max_retries)
            .map(|r| policy.delay_for(r).as_secs())
            .collect()
    }

    #[test]
    fn base_image_schedule() {
        let p = RetryPolicy::base_image();
        assert_eq!(secs(&p), vec![10, 20, 30]);
        assert!(p.is_retryable(FailureClass::Timeout));
        assert!(p.is_retryable(FailureClass::Connection));
        assert!(!p.is_retryable(FailureClass::RateLimited));
        assert!(!p.is_retryable(FailureClass::Other));
    }

    #[test]
    fn direction_transform_schedule() {
        let p = RetryPolicy::direction_transform();
        assert_eq!(secs(&p), vec![2, 4]);
        assert!(p.is_retryable(FailureClass::Other));
    }

    #[test]
    fn rate_limited_schedule() {
        let p = RetryPolicy::rate_limited();
        assert_eq!(secs(&p), vec![5, 10, 15]);
        assert!(p.is_retryable(FailureClass::RateLimited));
        assert!(!p.is_retryable(FailureClass::Timeout));
    }

    #[test]
    fn should_retry_stops_at_max() {
        let p = RetryPolicy::direction_transform();
        assert!(p.should_retry(FailureClass::Other, 0));
        assert!(p.should_retry(FailureClass::Other, 1));
        assert!(!p.should_retry(FailureClass::Other, 2));
    }

    #[test]
    fn none_never_retries() {
        assert!(!RetryPolicy::none().should_retry(FailureClass::Timeout, 0));
    }
}
