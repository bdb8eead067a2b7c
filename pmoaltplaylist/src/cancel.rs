//! Cooperative cancellation helpers

use crate::error::{AltPlaylistError, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Runs `future` unless `token` fires first
///
/// On cancellation the future is dropped, abandoning whatever request it had
/// in flight.
pub(crate) async fn until_cancelled<F>(token: &CancellationToken, future: F) -> Result<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AltPlaylistError::Cancelled),
        output = future => Ok(output),
    }
}

/// Fails fast when `token` has already fired
pub(crate) fn ensure_active(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(AltPlaylistError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_when_not_cancelled() {
        let token = CancellationToken::new();
        assert_eq!(until_cancelled(&token, async { 7 }).await.unwrap(), 7);
        assert!(ensure_active(&token).is_ok());
    }

    #[tokio::test]
    async fn test_pending_future_is_abandoned() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let result = until_cancelled(&token, std::future::pending::<()>()).await;
        assert!(result.unwrap_err().is_cancelled());
        assert!(ensure_active(&token).is_err());
    }
}
