//! Retry wait policies.
//!
//! A [`BackoffPolicy`] is shared, immutable configuration; each request calls
//! [`BackoffPolicy::start`] to get its own [`Backoff`] schedule so concurrent
//! requests never share retry state.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Per-request retry schedule.
pub trait Backoff: Send {
    /// Wait before the next attempt, or `None` once retrying should stop.
    fn next_backoff(&mut self) -> Option<Duration>;
}

/// Factory for per-request [`Backoff`] schedules.
pub trait BackoffPolicy: Send + Sync + fmt::Debug {
    fn start(&self) -> Box<dyn Backoff>;
}

/// Exponentially growing, randomized waits bounded by a max elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_interval: Duration,
    pub multiplier: f64,
    /// Each wait is drawn from `interval * (1 ± randomization_factor)`.
    pub randomization_factor: f64,
    pub max_interval: Duration,
    /// Stop once this much time has passed since the schedule started.
    pub max_elapsed_time: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Some(Duration::from_secs(15 * 60)),
            max_retries: None,
        }
    }
}

impl ExponentialBackoff {
    pub fn max_elapsed_time(mut self, max: Duration) -> Self {
        self.max_elapsed_time = Some(max);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        if self.max_interval < interval {
            self.max_interval = interval;
        }
        self
    }

    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval.max(self.initial_interval);
        self
    }

    pub fn randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn start(&self) -> Box<dyn Backoff> {
        Box::new(ExponentialSchedule {
            current: self.initial_interval,
            policy: self.clone(),
            started: Instant::now(),
            retries: 0,
        })
    }
}

struct ExponentialSchedule {
    policy: ExponentialBackoff,
    current: Duration,
    started: Instant,
    retries: u32,
}

impl Backoff for ExponentialSchedule {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.policy.max_retries.is_some_and(|max| self.retries >= max) {
            return None;
        }
        if self
            .policy
            .max_elapsed_time
            .is_some_and(|max| self.started.elapsed() > max)
        {
            return None;
        }
        let max = self.policy.max_interval;
        let wait = randomize(self.current, self.policy.randomization_factor, max);
        // A non-finite or shrinking multiplier holds the interval steady.
        let multiplier = match self.policy.multiplier {
            m if m.is_finite() => m.max(1.0),
            _ => 1.0,
        };
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * multiplier)
            .unwrap_or(max)
            .min(max);
        self.retries += 1;
        Some(wait)
    }
}

fn randomize(interval: Duration, factor: f64, fallback: Duration) -> Duration {
    let factor = if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if factor == 0.0 {
        return interval;
    }
    let delta = interval.as_secs_f64() * factor;
    let low = interval.as_secs_f64() - delta;
    Duration::try_from_secs_f64(low + fastrand::f64() * 2.0 * delta).unwrap_or(fallback)
}

/// Fixed wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBackoff {
    pub interval: Duration,
    pub max_retries: Option<u32>,
}

impl ConstantBackoff {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_retries: None,
        }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

impl BackoffPolicy for ConstantBackoff {
    fn start(&self) -> Box<dyn Backoff> {
        Box::new(ConstantSchedule {
            policy: self.clone(),
            retries: 0,
        })
    }
}

struct ConstantSchedule {
    policy: ConstantBackoff,
    retries: u32,
}

impl Backoff for ConstantSchedule {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.policy.max_retries.is_some_and(|max| self.retries >= max) {
            return None;
        }
        self.retries += 1;
        Some(self.policy.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_grows_within_jitter_bounds() {
        let policy = ExponentialBackoff::default()
            .initial_interval(Duration::from_millis(100))
            .max_interval(Duration::from_secs(1));
        let mut schedule = policy.start();
        let mut expected = 0.1f64;
        for _ in 0..10 {
            let wait = schedule.next_backoff().unwrap().as_secs_f64();
            assert!(wait >= expected * 0.5 - 1e-6, "{} below {}", wait, expected * 0.5);
            assert!(wait <= expected * 1.5 + 1e-6, "{} above {}", wait, expected * 1.5);
            expected = (expected * 1.5).min(1.0);
        }
    }

    #[test]
    fn exponential_without_jitter_is_deterministic() {
        let policy = ExponentialBackoff::default()
            .initial_interval(Duration::from_secs(4))
            .randomization_factor(0.0);
        let mut schedule = policy.start();
        assert_eq!(schedule.next_backoff(), Some(Duration::from_secs(4)));
        assert_eq!(schedule.next_backoff(), Some(Duration::from_secs(6)));
        assert_eq!(schedule.next_backoff(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn exponential_stops_after_max_retries() {
        let mut schedule = ExponentialBackoff::default().max_retries(2).start();
        assert!(schedule.next_backoff().is_some());
        assert!(schedule.next_backoff().is_some());
        assert!(schedule.next_backoff().is_none());
    }

    #[test]
    fn exponential_stops_after_max_elapsed_time() {
        let mut schedule = ExponentialBackoff::default()
            .max_elapsed_time(Duration::ZERO)
            .start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(schedule.next_backoff().is_none());
    }

    #[test]
    fn out_of_range_fields_do_not_panic() {
        let policy = ExponentialBackoff {
            randomization_factor: 1.5,
            ..Default::default()
        };
        let mut schedule = policy.start();
        for _ in 0..5 {
            let wait = schedule.next_backoff().unwrap();
            assert!(wait <= policy.max_interval * 2);
        }

        for multiplier in [f64::NAN, f64::INFINITY, f64::MAX] {
            let policy = ExponentialBackoff {
                multiplier,
                randomization_factor: f64::NAN,
                ..Default::default()
            };
            let mut schedule = policy.start();
            assert_eq!(schedule.next_backoff(), Some(policy.initial_interval));
            let second = schedule.next_backoff().unwrap();
            assert!(second <= policy.max_interval, "{:?}", multiplier);
        }
    }

    #[test]
    fn schedules_are_independent() {
        let policy = ConstantBackoff::new(Duration::from_millis(1)).max_retries(1);
        let mut a = policy.start();
        let mut b = policy.start();
        assert!(a.next_backoff().is_some());
        assert!(a.next_backoff().is_none());
        assert_eq!(b.next_backoff(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn constant_unbounded_keeps_going() {
        let mut schedule = ConstantBackoff::new(Duration::ZERO).start();
        for _ in 0..100 {
            assert_eq!(schedule.next_backoff(), Some(Duration::ZERO));
        }
    }
}
