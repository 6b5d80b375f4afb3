//! Bounded retry with backoff, shared by every call site that talks to the generation service.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// The wait before retry `n` is `base_delay × n`: 15s, 30s, 45s, ...
    pub base_delay: Duration,
}

/// What happened while running an operation under a policy.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
    /// Number of backoff sleeps taken (always `attempts - 1`).
    pub waits: u32,
}

impl RetryPolicy {
    /// Primary caption generation: 5 attempts.
    pub const fn generation(base: Duration) -> Self {
        Self {
            max_attempts: 5,
            base_delay: base,
        }
    }

    /// Brand-concept summarisation: 3 attempts.
    pub const fn summarization(base: Duration) -> Self {
        Self {
            max_attempts: 3,
            base_delay: base,
        }
    }

    /// Delay before the retry that follows failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.max(1)
    }

    /// Runs `op` until it succeeds, fails with an error `is_retryable` rejects,
    /// or `max_attempts` is used up.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, is_retryable: P) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;
        let mut waits = 0;

        loop {
            attempts += 1;
            match op().await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                        waits,
                    }
                }
                Err(e) if attempts < max_attempts && is_retryable(&e) => {
                    let delay = self.delay(attempts);
                    warn!(
                        "Attempt {}/{} failed ({}), retrying after {}s",
                        attempts,
                        max_attempts,
                        e,
                        delay.as_secs_f32()
                    );
                    tokio::time::sleep(delay).await;
                    waits += 1;
                }
                Err(e) => {
                    return RetryOutcome {
                        result: Err(e),
                        attempts,
                        waits,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Busy,
        Broken,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    #[test]
    fn test_backoff_scales_linearly_with_attempt() {
        let policy = RetryPolicy::generation(Duration::from_secs(15));
        assert_eq!(policy.delay(0), Duration::from_secs(15));
        assert_eq!(policy.delay(1), Duration::from_secs(15));
        assert_eq!(policy.delay(2), Duration::from_secs(30));
        assert_eq!(policy.delay(4), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::generation(Duration::from_secs(15));
        let started = tokio::time::Instant::now();

        let outcome = policy
            .run(
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move {
                        if n <= 2 {
                            Err(TestError::Busy)
                        } else {
                            Ok("done")
                        }
                    }
                },
                |e| *e == TestError::Busy,
            )
            .await;

        assert_eq!(outcome.result, Ok("done"));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.waits, 2);
        // 15s + 30s of backoff on the paused clock
        assert_eq!(started.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::summarization(Duration::from_secs(1));
        let outcome: RetryOutcome<(), _> = policy
            .run(|| async { Err(TestError::Busy) }, |e| *e == TestError::Busy)
            .await;

        assert_eq!(outcome.result, Err(TestError::Busy));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.waits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_fails_immediately() {
        let policy = RetryPolicy::generation(Duration::from_secs(15));
        let outcome: RetryOutcome<(), _> = policy
            .run(|| async { Err(TestError::Broken) }, |e| *e == TestError::Busy)
            .await;

        assert_eq!(outcome.result, Err(TestError::Broken));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.waits, 0);
    }
}
