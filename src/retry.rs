//! Bounded retry with growing backoff
//!
//! Fetches retry any failure up to the configured total-attempt budget;
//! a descriptor whose every attempt fails is recorded as a permanent
//! failure rather than retried forever. The delay between attempts grows
//! multiplicatively (capped at `max_delay`) with optional jitter to avoid
//! hammering a failing endpoint in lockstep.

use crate::config::RetryPolicy;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Run `operation` up to `policy.max_attempts` times total
///
/// Returns the first success, or the last error together with the number
/// of attempts actually made. The attempt count is always in
/// `1..=max_attempts` (a zero budget is rejected by
/// [`Config::validate`](crate::Config::validate)).
pub async fn with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<(T, u32), (E, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let budget = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;

    for attempt in 1..=budget {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "operation succeeded after retry");
                }
                return Ok((value, attempt));
            }
            Err(e) if attempt < budget => {
                let sleep_for = if policy.jitter { add_jitter(delay) } else { delay };
                tracing::warn!(
                    error = %e,
                    attempt,
                    budget,
                    delay_ms = sleep_for.as_millis(),
                    "attempt failed, retrying"
                );
                tokio::time::sleep(sleep_for).await;
                delay = Duration::from_secs_f64(
                    delay.as_secs_f64() * policy.backoff_multiplier,
                )
                .min(policy.max_delay);
            }
            Err(e) => {
                tracing::error!(error = %e, attempts = attempt, "retry budget exhausted");
                return Err((e, attempt));
            }
        }
    }

    unreachable!("budget is at least 1, so the loop always returns")
}

/// Add uniform random jitter: the result lies in `[delay, 2 * delay]`
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_calls_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_backoff(&fast_policy(3), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), (42, 1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn always_failing_op_makes_exactly_budget_attempts() {
        for budget in 1..=4 {
            let counter = Arc::new(AtomicU32::new(0));
            let c = counter.clone();

            let result = with_backoff(&fast_policy(budget), || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>("down".to_string())
                }
            })
            .await;

            let (_, attempts) = result.unwrap_err();
            assert_eq!(attempts, budget, "budget {budget}: attempt count reported");
            assert_eq!(
                counter.load(Ordering::SeqCst),
                budget,
                "budget {budget}: attempts actually made"
            );
        }
    }

    #[tokio::test]
    async fn transient_failure_then_success_reports_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_backoff(&fast_policy(3), || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("down".to_string())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), (7, 3));
    }

    #[tokio::test]
    async fn backoff_delay_grows_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
        };

        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts = timestamps.clone();

        let _ = with_backoff(&policy, || {
            let ts = ts.clone();
            async move {
                ts.lock().await.push(std::time::Instant::now());
                Err::<i32, _>("down".to_string())
            }
        })
        .await;

        let ts = timestamps.lock().await;
        assert_eq!(ts.len(), 3);
        let gap1 = ts[1].duration_since(ts[0]);
        let gap2 = ts[2].duration_since(ts[1]);
        assert!(gap1 >= Duration::from_millis(40), "first gap was {gap1:?}");
        assert!(gap2 >= Duration::from_millis(80), "second gap was {gap2:?}");
        assert!(gap2 > gap1, "delay must grow, got {gap1:?} then {gap2:?}");
    }

    #[tokio::test]
    async fn delay_is_capped_at_max_delay() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(60),
            backoff_multiplier: 10.0,
            jitter: false,
        };

        let start = std::time::Instant::now();
        let _ = with_backoff(&policy, || async { Err::<i32, _>("down".to_string()) }).await;
        let elapsed = start.elapsed();

        // 20ms + 60ms + 60ms = 140ms of sleeping; generous upper bound for CI
        assert!(elapsed >= Duration::from_millis(140), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "waited {elapsed:?}");
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let delay = Duration::from_millis(50);
        for i in 0..200 {
            let jittered = add_jitter(delay);
            assert!(jittered >= delay, "iteration {i}: {jittered:?} below base");
            assert!(jittered <= delay * 2, "iteration {i}: {jittered:?} above 2x");
        }
    }

    #[test]
    fn jitter_on_zero_delay_is_zero() {
        assert_eq!(add_jitter(Duration::ZERO), Duration::ZERO);
    }
}
