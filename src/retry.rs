// ABOUTME: Retry policy with exponential backoff for rate-limited endpoints
// ABOUTME: Attempt errors are classed so 429s keep their exact sleep schedule

use std::time::Duration;

/// How a failed attempt should be treated by the policy.
///
/// Rate-limited attempts back off even after the final attempt; transient
/// ones (other HTTP statuses, transport errors) only sleep when another
/// attempt remains.
#[derive(Debug)]
pub enum AttemptError<E> {
    RateLimited(E),
    Transient(E),
}

impl<E> AttemptError<E> {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AttemptError::RateLimited(_))
    }

    fn into_inner(self) -> E {
        match self {
            AttemptError::RateLimited(e) | AttemptError::Transient(e) => e,
        }
    }
}

/// All attempts failed; carries the last observed error.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Bounded retries with a 2^i backoff schedule (1s, 2s, 4s, ... by default).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            ..RetryPolicy::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after the 0-based attempt `attempt` fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.min(31))
    }

    /// Run `op` until it succeeds or the attempt budget is spent, sleeping
    /// with `std::thread::sleep`. `notify` fires before every backoff sleep.
    pub fn run<T, E, F, N>(&self, op: F, notify: N) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Result<T, AttemptError<E>>,
        N: FnMut(&AttemptError<E>, Duration),
    {
        self.run_with_sleep(op, notify, std::thread::sleep)
    }

    /// Same as [`run`](Self::run) with an injectable sleep function, so the
    /// backoff schedule can be observed without real delays.
    pub fn run_with_sleep<T, E, F, N, S>(
        &self,
        mut op: F,
        mut notify: N,
        mut sleep: S,
    ) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Result<T, AttemptError<E>>,
        N: FnMut(&AttemptError<E>, Duration),
        S: FnMut(Duration),
    {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    let spent = attempt >= self.max_attempts;

                    if err.is_rate_limited() {
                        // Rate limiting sleeps unconditionally, matching the
                        // observable request timing callers depend on.
                        notify(&err, delay);
                        sleep(delay);
                        if spent {
                            return Err(Exhausted {
                                attempts: attempt,
                                last_error: err.into_inner(),
                            });
                        }
                    } else {
                        if spent {
                            return Err(Exhausted {
                                attempts: attempt,
                                last_error: err.into_inner(),
                            });
                        }
                        notify(&err, delay);
                        sleep(delay);
                    }
                }
            }
        }
    }
}
