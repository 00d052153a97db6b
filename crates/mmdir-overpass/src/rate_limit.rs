//! Back-off, cooldown and cancellation for the Overpass client.
//!
//! Overpass mirrors answer HTTP 429 under load. A 429 trips a process-wide
//! cooldown that every later request waits out before sending, and the
//! failed request is retried with exponential back-off plus jitter. Any other
//! error is returned immediately. Every sleep races the caller's
//! [`CancellationToken`] so a superseded query stops waiting at once.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use mmdir_core::AppConfig;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::OverpassError;

/// Exponential back-off parameters for rate-limited requests.
///
/// `delay(n) = min(base * factor^n, cap)`, plus up to `jitter_max` of random
/// jitter at sleep time.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub factor: f64,
    pub cap: Duration,
    pub jitter_max: Duration,
    /// How long every request waits after any endpoint answers 429.
    pub cooldown: Duration,
    /// `None` retries until success or cancellation.
    pub max_retries: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(5_000),
            factor: 1.6,
            cap: Duration::from_millis(15_000),
            jitter_max: Duration::from_millis(250),
            cooldown: Duration::from_millis(8_000),
            max_retries: None,
        }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base: Duration::from_millis(config.backoff_base_ms),
            factor: config.backoff_factor,
            cap: Duration::from_millis(config.backoff_cap_ms),
            jitter_max: Duration::from_millis(config.backoff_jitter_ms),
            cooldown: Duration::from_millis(config.rate_limit_cooldown_ms),
            max_retries: config.max_rate_limit_retries,
        }
    }

    /// No waiting at all. Used by tests against local mock servers.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            base: Duration::ZERO,
            factor: 1.0,
            cap: Duration::ZERO,
            jitter_max: Duration::ZERO,
            cooldown: Duration::ZERO,
            max_retries: None,
        }
    }

    /// Pre-jitter delay after the `attempt`-th consecutive 429 (0-based).
    ///
    /// With the defaults: 5000, 8000, 12800, then 15000 ms from then on.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let base_ms = self.base.as_millis() as f64;
        #[allow(clippy::cast_precision_loss)]
        let cap_ms = self.cap.as_millis() as f64;
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let grown = (base_ms * self.factor.powi(exponent)).min(cap_ms);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = grown.round().max(0.0) as u64;
        Duration::from_millis(ms)
    }

    fn jitter(&self) -> Duration {
        #[allow(clippy::cast_possible_truncation)]
        let max_ms = self.jitter_max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::random_range(0..=max_ms))
    }
}

/// Process-wide "rate limited until" timestamp shared by every request.
#[derive(Debug, Default)]
pub struct Cooldown {
    until: Mutex<Option<Instant>>,
}

impl Cooldown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the cooldown to at least `now + duration`.
    pub fn trip(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        let mut until = self
            .until
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if until.is_none_or(|current| current < deadline) {
            *until = Some(deadline);
        }
    }

    /// Time left before requests may be sent again, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let until = *self
            .until
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        until
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }
}

/// Sleeps for `duration` unless `cancel` fires first.
///
/// # Errors
///
/// Returns [`OverpassError::Superseded`] when cancelled.
pub async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), OverpassError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(OverpassError::Superseded),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Runs `operation` until it succeeds, fails with anything other than a 429,
/// or `cancel` fires.
///
/// Before every attempt the shared cooldown is waited out. On
/// [`OverpassError::RateLimited`] the cooldown is tripped and the loop sleeps
/// for [`BackoffPolicy::delay`] plus jitter before trying again.
///
/// # Errors
///
/// Returns the first non-429 error, [`OverpassError::Superseded`] on
/// cancellation, or the last 429 once `policy.max_retries` is exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &BackoffPolicy,
    cooldown: &Cooldown,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, OverpassError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OverpassError>>,
{
    let mut attempt = 0u32;
    loop {
        if let Some(wait) = cooldown.remaining() {
            tracing::debug!(wait_ms = wait.as_millis(), "waiting out Overpass cooldown");
            sleep_or_cancel(wait, cancel).await?;
        }
        if cancel.is_cancelled() {
            return Err(OverpassError::Superseded);
        }

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err @ OverpassError::RateLimited { .. }) => err,
            Err(err) => return Err(err),
        };

        cooldown.trip(policy.cooldown);
        if policy.max_retries.is_some_and(|max| attempt >= max) {
            return Err(err);
        }

        let delay = policy.delay(attempt) + policy.jitter();
        tracing::warn!(
            attempt,
            delay_ms = delay.as_millis(),
            error = %err,
            "Overpass rate limited; backing off"
        );
        sleep_or_cancel(delay, cancel).await?;
        attempt = attempt.saturating_add(1);
    }
}
