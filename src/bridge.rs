//! Awaiting a promise from async code running on the same scheduler.
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use crate::promise::{Promise, Shared};
use crate::scheduler::Scheduler;
use crate::{Rejection, State};

/// Future returned by [`Promise::settled`].
///
/// Polls the promise's state. While it is pending the task is woken again on
/// the scheduler's next tick, so this only makes progress while the
/// scheduler is being ticked.
///
/// Resolves to the stored outcome, shared with every other handle, or `None`
/// if the promise was consumed.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Settled<T, E> {
    inner: Shared<T, E>,
    scheduler: Rc<dyn Scheduler>,
}

/// Future returned by [`Promise::resolve`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Resolved<T, E> {
    settled: Settled<T, E>,
}

impl<T, E> Promise<T, E> {
    /// Waits for the promise to settle, without requiring the value or the
    /// reason to be cloneable.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::executor::LocalPool;
    /// use futures::task::LocalSpawnExt;
    /// use promise_ticker::{Promise, Ticker};
    /// use std::{cell::RefCell, io, rc::Rc};
    ///
    /// let ticker = Ticker::new();
    /// let mut pool = LocalPool::new();
    /// let promise = Promise::<u32, io::Error>::new(&ticker, |_, reject| {
    ///     reject.reject(io::Error::new(io::ErrorKind::TimedOut, "slow"))
    /// });
    ///
    /// let kind = Rc::new(RefCell::new(None));
    /// let sink = kind.clone();
    /// pool.spawner()
    ///     .spawn_local(async move {
    ///         if let Some(outcome) = promise.settled().await {
    ///             *sink.borrow_mut() = (*outcome).as_ref().err().map(|error| error.kind());
    ///         }
    ///     })
    ///     .unwrap();
    ///
    /// while kind.borrow().is_none() {
    ///     pool.run_until_stalled();
    ///     ticker.tick();
    /// }
    /// assert_eq!(*kind.borrow(), Some(io::ErrorKind::TimedOut));
    /// ```
    pub fn settled(&self) -> Settled<T, E> {
        Settled {
            inner: self.inner.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T: Clone, E: Clone> Promise<T, E> {
    /// Waits for the promise to settle and hands back a copy of the value,
    /// or of the reason it was rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::executor::LocalPool;
    /// use futures::task::LocalSpawnExt;
    /// use promise_ticker::{Promise, Ticker};
    /// use std::{cell::RefCell, rc::Rc};
    ///
    /// let ticker = Ticker::new();
    /// let mut pool = LocalPool::new();
    /// let promise = Promise::<String, String>::new(&ticker, |resolve, _| resolve.resolve("ok".into()));
    ///
    /// let result = Rc::new(RefCell::new(None));
    /// let sink = result.clone();
    /// pool.spawner()
    ///     .spawn_local(async move { *sink.borrow_mut() = Some(promise.resolve().await) })
    ///     .unwrap();
    ///
    /// while result.borrow().is_none() {
    ///     pool.run_until_stalled();
    ///     ticker.tick();
    /// }
    /// assert_eq!(*result.borrow(), Some(Ok("ok".to_string())));
    /// ```
    pub fn resolve(&self) -> Resolved<T, E> {
        Resolved {
            settled: self.settled(),
        }
    }
}

impl<T, E> Future for Settled<T, E> {
    type Output = Option<Rc<Result<T, E>>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = self.inner.borrow();
        if inner.state == State::Pending {
            drop(inner);
            let waker = cx.waker().clone();
            self.scheduler.defer(Box::new(move || waker.wake()));
            return Poll::Pending;
        }
        match (inner.state, &inner.outcome) {
            (State::Fulfilled, Some(outcome)) if outcome.is_ok() => {
                Poll::Ready(Some(outcome.clone()))
            }
            (State::Rejected, Some(outcome)) if outcome.is_err() => {
                Poll::Ready(Some(outcome.clone()))
            }
            // Consumed: rejected with no reason, or forced out of fulfilment.
            _ => Poll::Ready(None),
        }
    }
}

impl<T: Clone, E: Clone> Future for Resolved<T, E> {
    type Output = Result<T, Rejection<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.settled).poll(cx).map(|outcome| match outcome.as_deref() {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(reason)) => Err(Rejection::Reason(reason.clone())),
            None => Err(Rejection::Consumed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ticker;
    use futures::task::noop_waker;
    use std::io;

    #[test]
    fn pending_poll_defers_a_wake() {
        let ticker = Ticker::new();
        let (resolve, _reject, promise) = Promise::<u8, String>::deferred(&ticker);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut resolved = promise.resolve();

        assert_eq!(Pin::new(&mut resolved).poll(&mut cx), Poll::Pending);
        assert!(!ticker.is_idle());
        ticker.tick();

        resolve.resolve(4);
        assert_eq!(Pin::new(&mut resolved).poll(&mut cx), Poll::Ready(Ok(4)));
    }

    #[test]
    fn reports_reason_and_consumption() {
        let ticker = Ticker::new();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let (_resolve, reject, rejected) = Promise::<u8, String>::deferred(&ticker);
        reject.reject("bad".into());
        assert_eq!(
            Pin::new(&mut rejected.resolve()).poll(&mut cx),
            Poll::Ready(Err(Rejection::Reason("bad".to_string())))
        );

        let (resolve, _reject, consumed) = Promise::<u8, String>::deferred(&ticker);
        resolve.resolve(1);
        consumed.consume();
        assert_eq!(
            Pin::new(&mut consumed.resolve()).poll(&mut cx),
            Poll::Ready(Err(Rejection::Consumed))
        );
    }

    #[test]
    fn settles_with_a_reason_that_cannot_be_cloned() {
        let ticker = Ticker::new();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let (_resolve, reject, promise) = Promise::<u32, io::Error>::deferred(&ticker);
        let mut settled = promise.settled();
        assert!(Pin::new(&mut settled).poll(&mut cx).is_pending());

        reject.reject(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let outcome = match Pin::new(&mut settled).poll(&mut cx) {
            Poll::Ready(Some(outcome)) => outcome,
            other => panic!("expected a stored outcome, got {other:?}"),
        };
        let Err(error) = &*outcome else {
            panic!("expected a rejection");
        };
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
        assert_eq!(error.to_string(), "missing");
    }

    #[test]
    fn consumed_promise_settles_with_nothing() {
        let ticker = Ticker::new();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let (_resolve, _reject, promise) = Promise::<u32, io::Error>::deferred(&ticker);
        promise.consume();
        assert!(matches!(
            Pin::new(&mut promise.settled()).poll(&mut cx),
            Poll::Ready(None)
        ));
    }
}
