use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy for calls to the generation service.
///
/// Counts total attempts (the first call included) and computes an
/// exponential delay between them, capped at `max_delay`.
///
/// # Examples
///
/// ```
/// use product_pipeline::RetryPolicy;
/// use std::time::Duration;
///
/// // Default: 3 attempts, 2s initial delay doubling up to 10s
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(2));
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(4));
///
/// // Single attempt, never retries
/// let policy = RetryPolicy::none();
/// assert_eq!(policy.max_attempts(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: u32,
}

/// Error returned when [`RetryPolicy`] configuration is invalid.
///
/// # Examples
///
/// ```
/// use product_pipeline::RetryPolicy;
/// use std::time::Duration;
///
/// // Invalid: multiplier is 0
/// let result = RetryPolicy::exponential_backoff(
///     3,
///     Duration::from_millis(100),
///     Duration::from_secs(10),
///     0,
/// );
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicyError(pub &'static str);

impl std::fmt::Display for RetryPolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RetryPolicyError {}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Creates a fixed-delay policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_pipeline::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
    /// assert_eq!(policy.max_attempts(), 3);
    /// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
    /// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
    /// ```
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1,
        }
    }

    /// Creates an exponential backoff policy with custom settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Total number of attempts, the first call included
    /// * `initial_delay` - Delay before the first retry
    /// * `max_delay` - Maximum delay cap (delays won't exceed this)
    /// * `multiplier` - Factor to multiply delay by after each attempt (1-10)
    ///
    /// # Errors
    ///
    /// Returns [`RetryPolicyError`] if:
    /// - `max_attempts` is 0
    /// - `multiplier` is 0 or greater than 10
    /// - `max_delay` is less than `initial_delay`
    ///
    /// # Examples
    ///
    /// ```
    /// use product_pipeline::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential_backoff(
    ///     5,
    ///     Duration::from_millis(100),
    ///     Duration::from_secs(30),
    ///     3,
    /// )?;
    ///
    /// // Delays: 100ms, 300ms, 900ms, 2700ms
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(900));
    /// # Ok::<(), product_pipeline::RetryPolicyError>(())
    /// ```
    pub fn exponential_backoff(
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: u32,
    ) -> Result<Self, RetryPolicyError> {
        if max_attempts == 0 {
            return Err(RetryPolicyError("max_attempts must be at least 1"));
        }
        if multiplier == 0 {
            return Err(RetryPolicyError("multiplier must be greater than 0"));
        }
        if multiplier > 10 {
            return Err(RetryPolicyError(
                "multiplier must be 10 or less to avoid overflow",
            ));
        }
        if max_delay < initial_delay {
            return Err(RetryPolicyError("max_delay must be >= initial_delay"));
        }
        Ok(Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let initial = self.initial_delay.as_millis() as u64;
        let cap = self.max_delay.as_millis() as u64;
        let delay = (self.multiplier as u64)
            .checked_pow(attempt)
            .and_then(|factor| initial.checked_mul(factor))
            .unwrap_or(u64::MAX);
        Duration::from_millis(delay.min(cap))
    }
}

/// Runs `operation` until it succeeds or the policy runs out of attempts.
///
/// Attempts are strictly serial with a sleeping backoff between them. The
/// error from the last attempt is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_for_attempt(attempt - 1);
                warn!(
                    "Attempt {}/{} failed: {}, retrying in {:?}",
                    attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Giving up after {} attempt(s): {}", attempt, e);
                return Err(e);
            }
        }
    }
}
