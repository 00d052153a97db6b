//! Retry with exponential back-off and jitter for the Nominatim client.
//!
//! Only transient failures (timeouts, connection errors, 5xx) are retried.
//! A search with no match is an answer, not a failure, and is returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::NominatimError;

/// Returns `true` for errors worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &NominatimError) -> bool {
    match err {
        NominatimError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        NominatimError::NotFound { .. }
        | NominatimError::InvalidBaseUrl { .. }
        | NominatimError::InvalidCoordinate { .. }
        | NominatimError::Deserialize { .. } => false,
    }
}

/// Upper bound on a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Pre-jitter sleep before retry number `retry` (1-based): the base doubled
/// per earlier retry, capped at [`MAX_DELAY`].
fn backoff_delay(retry: u32, backoff_base_ms: u64) -> Duration {
    let doublings = retry.saturating_sub(1).min(10);
    Duration::from_millis(backoff_base_ms.saturating_mul(1_u64 << doublings)).min(MAX_DELAY)
}

/// Scales `delay` by a random factor in `[0.75, 1.25)`.
fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(0.75 + rand::random::<f64>() * 0.5)
}

/// Runs `operation`, retrying transient errors up to `max_retries` times.
///
/// Non-retriable errors and the error of the final attempt are returned as is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NominatimError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NominatimError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && retry < max_retries => err,
            Err(err) => return Err(err),
        };
        retry += 1;
        let delay = jittered(backoff_delay(retry, backoff_base_ms));
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = delay.as_millis(),
            error = %err,
            "geocoder request failed; retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn delay_doubles_then_caps() {
        let delays: Vec<u128> = (1..=8).map(|n| backoff_delay(n, 500).as_millis()).collect();
        assert_eq!(
            delays,
            vec![500, 1_000, 2_000, 4_000, 8_000, 16_000, 30_000, 30_000]
        );
        assert_eq!(backoff_delay(u32::MAX, 500), MAX_DELAY);
    }

    #[test]
    fn jitter_stays_within_a_quarter() {
        let base = Duration::from_millis(1_000);
        for _ in 0..100 {
            let d = jittered(base);
            assert!(d >= Duration::from_millis(750) && d < Duration::from_millis(1_250));
        }
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&NominatimError::NotFound {
            query: "Nowhere, Myanmar".to_owned()
        }));
    }

    #[test]
    fn bad_coordinate_is_not_retriable() {
        assert!(!is_retriable(&NominatimError::InvalidCoordinate {
            field: "lat",
            value: "north".to_owned()
        }));
    }

    #[tokio::test]
    async fn retries_connect_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    let err = reqwest::Client::new()
                        .get("http://0.0.0.0:1")
                        .send()
                        .await
                        .unwrap_err();
                    Err::<u32, _>(NominatimError::Http(err))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(NominatimError::NotFound {
                    query: "x".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(NominatimError::NotFound { .. })));
    }
}
