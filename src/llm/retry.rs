use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Delay before the retry that follows failed attempt `n` (0-based).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `base^n` seconds
    Exponential { base: u32 },
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential { base } => {
                Duration::from_secs(u64::from(*base).saturating_pow(attempt))
            }
        }
    }
}

/// Bounded retry for a remote call. Which errors are retryable is decided per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn exponential(max_attempts: u32, base: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { base },
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or `max_attempts`
    /// calls have been made. Sleeps between attempts only, never after the last one.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) && attempt + 1 < self.max_attempts => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt + 1,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("Giving up after {} attempt(s): {}", attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn exponential_delays_double() {
        let backoff = Backoff::Exponential { base: 2 };
        let secs: Vec<u64> = (0..6).map(|n| backoff.delay(n).as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16, 32]);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_min_of_failures_and_nine() {
        let policy = RetryPolicy::exponential(10, 2);

        for failures in [0u32, 1, 3, 9, 15] {
            let calls = Mutex::new(0u32);
            let result: Result<u32, String> = policy
                .run(
                    |attempt| {
                        *calls.lock().unwrap() += 1;
                        async move {
                            if attempt < failures {
                                Err("throttled".to_string())
                            } else {
                                Ok(attempt)
                            }
                        }
                    },
                    |_| true,
                )
                .await;

            let retries = *calls.lock().unwrap() - 1;
            assert_eq!(retries, failures.min(9), "failures = {failures}");
            assert_eq!(result.is_ok(), failures < 10);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_follow_backoff_sequence() {
        let policy = RetryPolicy::exponential(5, 2);
        let stamps = Mutex::new(Vec::new());
        let start = tokio::time::Instant::now();

        let _: Result<(), &str> = policy
            .run(
                |_| {
                    stamps.lock().unwrap().push(start.elapsed().as_secs());
                    async { Err("throttled") }
                },
                |_| true,
            )
            .await;

        assert_eq!(*stamps.lock().unwrap(), vec![0, 1, 3, 7, 15]);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let policy = RetryPolicy::exponential(10, 2);
        let calls = Mutex::new(0);

        let result: Result<(), &str> = policy
            .run(
                |_| {
                    *calls.lock().unwrap() += 1;
                    async { Err("fatal") }
                },
                |e| *e != "fatal",
            )
            .await;

        assert_eq!(result, Err("fatal"));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
