//! Cooperative cancellation for in-flight runs.
//!
//! Cancellation never aborts tasks: the [`CancelToken`] flips a watch flag,
//! the runner stops dispatching new supersteps once it observes the flag,
//! and nodes may poll [`CancelSignal::is_cancelled`] to bail out of long
//! work early. Invocations already in flight run to completion of the
//! current step, so the final state is always the state merged through the
//! last fully completed step.

use tokio::sync::watch;

/// Requests cancellation of a run. Held by the caller (via
/// [`RunHandle`](crate::runtimes::RunHandle)).
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
}

impl CancelToken {
    /// Flip the cancellation flag. Idempotent; safe after the run finished.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Read side of the cancellation flag, cloned into every node context.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the token
    /// was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// A signal that never fires, for runs without an external handle.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }
}

/// Create a linked token/signal pair for one run.
#[must_use]
pub fn cancel_pair() -> (CancelToken, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelToken { tx }, CancelSignal { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_flips_signal() {
        let (token, signal) = cancel_pair();
        assert!(!signal.is_cancelled());
        token.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn never_stays_false() {
        let signal = CancelSignal::never();
        assert!(!signal.is_cancelled());
    }
}
