//! Cooperative cancellation for long traversals
//!
//! Builders hold an optional [`CancellationToken`] and race every batch of
//! store calls against `cancelled()`. A call that is still in flight when the
//! token fires is dropped and the build stops with
//! [`TraversalError::Cancelled`]; whatever was built so far is discarded.

use crate::error::{TraversalError, TraversalResult};
use std::future::Future;

pub use tokio_util::sync::CancellationToken;

/// Await `work` unless `token` fires first
pub(crate) async fn until_cancelled<F, T, E>(
    token: Option<&CancellationToken>,
    work: F,
) -> TraversalResult<T>
where
    F: Future<Output = Result<T, E>>,
    TraversalError: From<E>,
{
    let Some(token) = token else {
        return Ok(work.await?);
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(TraversalError::Cancelled),
        result = work => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::twin::TwinId;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancelled_token_wins_over_ready_work() {
        let token = CancellationToken::new();
        token.cancel();

        let result = until_cancelled(Some(&token), async { Ok::<_, StoreError>(1) }).await;
        assert_eq!(result, Err(TraversalError::Cancelled));
    }

    #[tokio::test]
    async fn test_pending_work_is_interrupted() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let never = std::future::pending::<Result<(), StoreError>>();
        let work = until_cancelled(Some(&token), never);
        let result = tokio::time::timeout(Duration::from_secs(5), work).await.unwrap();
        assert_eq!(result, Err(TraversalError::Cancelled));
    }

    #[tokio::test]
    async fn test_without_token_errors_pass_through() {
        let missing = TwinId::new("ghost");
        let result: TraversalResult<()> =
            until_cancelled(None, async { Err(StoreError::NotFound(TwinId::new("ghost"))) }).await;
        assert_eq!(result, Err(TraversalError::Store(StoreError::NotFound(missing))));
    }
}
