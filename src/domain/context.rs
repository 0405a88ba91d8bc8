//! Per-request context threaded through every provider call.
//!
//! A [`SearchContext`] carries the authenticated subject and the
//! cancellation signal for one search. Clones share the same signal, so
//! cancelling any clone cancels every in-flight call that holds one.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Clone)]
pub struct SearchContext {
    username: Arc<str>,
    deadline: Option<Instant>,
    cancel: Arc<watch::Sender<bool>>,
}

impl SearchContext {
    pub fn new(username: impl Into<String>) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            username: Arc::from(username.into()),
            deadline: None,
            cancel: Arc::new(cancel),
        }
    }

    /// 設定截止時間；已有更早的截止時間時保留較早者
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        let signal = async move {
            // sender 由 self 持有，wait_for 不會因 channel 關閉而失敗
            let _ = rx.wait_for(|cancelled| *cancelled).await;
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signal => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signal.await,
        }
    }

    /// Runs `fut` unless the context fires first, in which case `None`.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchContext")
            .field("username", &self.username)
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_context_is_not_cancelled() {
        let ctx = SearchContext::new("alice");
        assert_eq!(ctx.username(), "alice");
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.run(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn test_cancel_reaches_clones() {
        let ctx = SearchContext::new("alice");
        let clone = ctx.clone();

        let waiter = tokio::spawn(async move { clone.cancelled().await });
        ctx.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_returns_none_when_cancelled_first() {
        let ctx = SearchContext::new("alice");
        ctx.cancel();

        let out = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                1
            })
            .await;
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn test_deadline_fires() {
        let ctx = SearchContext::new("alice").with_timeout(Duration::from_millis(20));

        let out = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert!(out.is_none());
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let ctx = SearchContext::new("bob").with_timeout(Duration::from_millis(10));
        let first = ctx.deadline().unwrap();
        let ctx = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(first));
    }
}
