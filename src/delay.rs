use crate::error::{ArgoError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first.
pub(crate) async fn delay(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ArgoError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_after_duration() {
        let cancel = CancellationToken::new();
        assert!(delay(Duration::from_millis(5), &cancel).await.is_ok());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = delay(Duration::from_secs(3600), &cancel).await;
        assert!(matches!(res, Err(ArgoError::Cancelled)));
    }
}
