//! Single-shot asynchronous results.
//!
//! Every pipeline call hands back a [`PendingResult`] immediately and
//! resolves it later from a worker task through the matching [`Resolver`].
//! The pair is a thin wrapper over [`tokio::sync::oneshot`], so:
//!
//! - a result is written at most once (the resolver is consumed by writing);
//! - a result is read at most once (the pending handle is consumed by reading);
//! - a resolver dropped without writing resolves the handle to
//!   [`TransportError::Dropped`] instead of leaving it pending forever;
//! - a pending handle dropped before resolution simply discards the result.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::{RequestError, TransportError};

/// Success value or request failure.
pub type Outcome<T> = Result<T, RequestError>;

/// Write side of a pending result.
#[derive(Debug)]
pub struct Resolver {
    tx: oneshot::Sender<Outcome<Value>>,
}

impl Resolver {
    /// Delivers the outcome.
    ///
    /// Returns `false` if the caller already abandoned the pending handle;
    /// the outcome is dropped in that case.
    pub fn resolve(self, outcome: Outcome<Value>) -> bool {
        self.tx.send(outcome).is_ok()
    }

    /// Returns `true` if the pending handle has been dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read side of a call that will eventually succeed or fail.
///
/// Await it, or call [`wait`](Self::wait) from synchronous code.
#[must_use = "a pending result does nothing unless awaited or waited on"]
pub struct PendingResult<T = Value> {
    rx: oneshot::Receiver<Outcome<Value>>,
    decode: fn(Value) -> Outcome<T>,
}

impl<T> fmt::Debug for PendingResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResult")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

#[allow(clippy::unnecessary_wraps)]
fn identity(value: Value) -> Outcome<Value> {
    Ok(value)
}

fn deserialize<T: DeserializeOwned>(value: Value) -> Outcome<T> {
    serde_json::from_value(value).map_err(|e| TransportError::Deserialize(e).into())
}

impl PendingResult<Value> {
    /// Creates a connected resolver/pending pair.
    pub fn channel() -> (Resolver, Self) {
        let (tx, rx) = oneshot::channel();
        (
            Resolver { tx },
            Self {
                rx,
                decode: identity,
            },
        )
    }

    /// Creates a pending result that is already resolved.
    pub fn ready(outcome: Outcome<Value>) -> Self {
        let (resolver, pending) = Self::channel();
        resolver.resolve(outcome);
        pending
    }

    /// Re-types the success value: it is deserialized into `U` on consumption.
    ///
    /// A value that does not deserialize resolves to
    /// [`TransportError::Deserialize`].
    pub fn typed<U: DeserializeOwned>(self) -> PendingResult<U> {
        PendingResult {
            rx: self.rx,
            decode: deserialize::<U>,
        }
    }
}

impl<T> PendingResult<T> {
    fn finish(decode: fn(Value) -> Outcome<T>, received: Option<Outcome<Value>>) -> Outcome<T> {
        match received {
            Some(outcome) => outcome.and_then(decode),
            None => Err(TransportError::Dropped.into()),
        }
    }

    /// Blocks the current thread until the outcome arrives.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context;
    /// use `.await` there instead.
    pub fn wait(mut self) -> Outcome<T> {
        let decode = self.decode;
        Self::finish(decode, self.rx.blocking_recv().ok())
    }

    /// Takes the outcome if it has already arrived, or gives the handle back.
    ///
    /// # Errors
    ///
    /// Returns the unchanged handle when no outcome has arrived yet.
    pub fn try_take(mut self) -> Result<Outcome<T>, Self> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(Self::finish(self.decode, Some(outcome))),
            Err(TryRecvError::Closed) => Ok(Self::finish(self.decode, None)),
            Err(TryRecvError::Empty) => Err(self),
        }
    }
}

impl<T> Future for PendingResult<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let decode = self.decode;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| Self::finish(decode, received.ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolves_exactly_once() {
        let (resolver, pending) = PendingResult::channel();
        tokio::spawn(async move {
            resolver.resolve(Ok(json!({"id": "ch_1"})));
        });
        assert_eq!(pending.await.unwrap(), json!({"id": "ch_1"}));
    }

    #[tokio::test]
    async fn test_dropped_resolver_yields_transport_error() {
        let (resolver, pending) = PendingResult::channel();
        drop(resolver);
        let err = pending.await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Transport(TransportError::Dropped)
        ));
    }

    #[tokio::test]
    async fn test_abandoned_handle_is_visible_to_resolver() {
        let (resolver, pending) = PendingResult::channel();
        drop(pending);
        assert!(resolver.is_abandoned());
        assert!(!resolver.resolve(Ok(json!({}))));
    }

    #[tokio::test]
    async fn test_api_error_is_delivered_as_is() {
        let pending = PendingResult::ready(Err(
            ApiError::from_payload(200, &json!({"message": "bad key"})).into()
        ));
        let err = pending.await.unwrap_err();
        assert_eq!(err.as_api().unwrap().message(), Some("bad key"));
    }

    #[tokio::test]
    async fn test_try_take_returns_handle_until_ready() {
        let (resolver, pending) = PendingResult::channel();
        let pending = pending.try_take().unwrap_err();
        resolver.resolve(Ok(json!(1)));
        let outcome = pending.try_take().unwrap();
        assert_eq!(outcome.unwrap(), json!(1));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Balance {
        object: String,
        livemode: bool,
    }

    #[tokio::test]
    async fn test_typed_deserializes_on_consumption() {
        let pending = PendingResult::ready(Ok(json!({"object": "balance", "livemode": false})));
        let balance: Balance = pending.typed().await.unwrap();
        assert_eq!(
            balance,
            Balance {
                object: "balance".into(),
                livemode: false
            }
        );

        let bad = PendingResult::ready(Ok(json!({"object": 7}))).typed::<Balance>();
        assert!(matches!(
            bad.await.unwrap_err(),
            RequestError::Transport(TransportError::Deserialize(_))
        ));
    }

    #[test]
    fn test_wait_blocks_until_resolved() {
        let (resolver, pending) = PendingResult::channel();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            resolver.resolve(Ok(json!("done")));
        });
        assert_eq!(pending.wait().unwrap(), json!("done"));
        worker.join().unwrap();
    }
}
