//! Cancellation and deadlines for external calls.
//!
//! A `CallContext` is handed to every step that talks to the supplier. The call
//! ends with `NetworkError::Timeout` when its deadline passes and with
//! `NetworkError::Aborted` once the owning caller cancels or drops its
//! `CancelHandle`. Steps call `ensure_live()` before writing to the draft store,
//! so a late response never overwrites newer state.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::NetworkError;

/// Held by the caller that owns the in-flight work (a page, a request).
/// Dropping it cancels every token derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx: Some(rx) })
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.rx {
            None => false,
            Some(rx) => *rx.borrow() || rx.has_changed().is_err(),
        }
    }

    /// Resolves once the token is cancelled or its handle is gone
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancelToken,
}

impl CallContext {
    pub fn new(token: CancelToken) -> Self {
        Self { token }
    }

    /// Context bound only to deadlines
    pub fn background() -> Self {
        Self::new(CancelToken::never())
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn ensure_live(&self) -> Result<(), NetworkError> {
        if self.is_cancelled() {
            Err(NetworkError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Runs `fut` until it completes, `deadline` elapses, or the caller cancels.
    pub async fn run<T, E, F>(&self, deadline: Duration, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<NetworkError>,
    {
        self.ensure_live()?;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(NetworkError::Aborted.into()),
            res = tokio::time::timeout(deadline, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(NetworkError::Timeout.into()),
            },
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_yields_timeout() {
        let ctx = CallContext::background();
        let res: Result<(), NetworkError> = ctx
            .run(Duration::from_millis(20), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(res, Err(NetworkError::Timeout));
    }

    #[tokio::test]
    async fn test_cancel_yields_aborted() {
        let (handle, token) = cancel_pair();
        let ctx = CallContext::new(token);

        let call = ctx.run(Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, NetworkError>(())
        });
        handle.cancel();
        assert_eq!(call.await, Err(NetworkError::Aborted));
        assert!(ctx.ensure_live().is_err());
    }

    #[tokio::test]
    async fn test_dropped_handle_cancels() {
        let (handle, token) = cancel_pair();
        let ctx = CallContext::new(token);
        assert!(!ctx.is_cancelled());
        drop(handle);
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_completed_call_passes_through() {
        let ctx = CallContext::background();
        let res = ctx
            .run(Duration::from_secs(1), async { Ok::<_, NetworkError>(7) })
            .await;
        assert_eq!(res, Ok(7));
    }
}
