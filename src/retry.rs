use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Bounded exponential backoff: `base`, `2*base`, `4*base`, ... capped at `cap`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(2u32.saturating_pow(attempt));
        exp.min(self.cap)
    }
}

/// Outer policy wrapping a whole store operation.
pub const SLOW: Backoff = Backoff {
    attempts: 3,
    base: Duration::from_secs(2),
    cap: Duration::from_secs(30),
};

/// Inner policy for transient gateway failures on a single API call sequence.
pub const GATEWAY: Backoff = Backoff {
    attempts: 3,
    base: Duration::from_secs(5),
    cap: Duration::from_secs(20),
};

/// Retry `op` up to `policy.attempts` times, sleeping between attempts, but
/// only while `retryable` classifies the error as worth another try. Any other
/// error propagates immediately on first occurrence.
pub async fn retry_if<T, E, F, Fut>(
    policy: &Backoff,
    retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt + 1 < policy.attempts && retryable(&e) => {
                let wait = policy.delay(attempt);
                warn!(
                    "Transient failure (attempt {}/{}): {}. Retrying in {:.0}s",
                    attempt + 1,
                    policy.attempts,
                    e,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
