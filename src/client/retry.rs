use tracing::debug;

use crate::error::{Error, is_conflict};

/// Attempt bound so that pathological write contention cannot loop forever.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Run `op` until it succeeds or fails with something other than an
/// optimistic-concurrency conflict.
///
/// Every attempt is expected to be a full read-modify-write cycle; the driver
/// itself holds no state, so concurrent callers may share it freely. A
/// conflicting write is retried from scratch, any other error is propagated
/// after a single attempt, and exceeding `max_attempts` yields
/// [`Error::RetryExhausted`].
pub async fn retry_on_conflict<T>(
    max_attempts: u32,
    mut op: impl AsyncFnMut() -> Result<T, Error>,
) -> Result<T, Error> {
    for attempt in 1..=max_attempts {
        match op().await {
            Err(Error::Kube(err)) if is_conflict(&err) => {
                debug!(attempt, error = %err, "write conflicted, retrying");
            }
            other => return other,
        }
    }
    Err(Error::RetryExhausted {
        attempts: max_attempts,
    })
}
