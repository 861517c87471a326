//! Deadline race primitive.
//!
//! Races an operation against a wall-clock deadline: whichever finishes
//! first decides the outcome and the loser is dropped on the spot, so
//! nothing outlives the call. The caller's cancellation token is
//! signalled on deadline expiry so cooperative work sharing that token
//! observes the loss at its next checkpoint.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Deadline expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// Run `operation` with a hard deadline.
///
/// If the deadline fires first, `cancel` is cancelled, the operation is
/// dropped, and `Err(TimeoutError)` is returned. If the operation wins,
/// the deadline sleeper is dropped and its output is returned.
pub async fn with_timeout<T, F>(
    duration: Duration,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        output = operation => Ok(output),
        () = tokio::time::sleep(duration) => {
            cancel.cancel();
            Err(TimeoutError(duration))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins_when_it_finishes_first() {
        let cancel = CancellationToken::new();
        let result = with_timeout(Duration::from_secs(5), &cancel, async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            42
        })
        .await;
        assert_eq!(assert_ok!(result), 42);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_resolving_operation_times_out_and_cancels_token() {
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();

        let result: Result<(), TimeoutError> =
            with_timeout(Duration::from_secs(3), &cancel, std::future::pending()).await;

        assert_eq!(result, Err(TimeoutError(Duration::from_secs(3))));
        assert!(cancel.is_cancelled());
        // No later than the configured duration (virtual clock is exact).
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_losing_sleeper_does_not_fire_after_win() {
        let cancel = CancellationToken::new();
        let result = with_timeout(Duration::from_millis(10), &cancel, async { "fast" }).await;
        assert_eq!(result, Ok("fast"));

        // Long after the deadline would have fired, the token is still
        // untouched — the sleeper was dropped with the race.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!cancel.is_cancelled());
    }
}
