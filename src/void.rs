//! Promises that fulfil without a value.
use crate::promise::{Promise, Rejecter, Resolver};
use crate::scheduler::{Completion, Scheduler, StepSequence};
use crate::Error;

/// A promise that carries no value, only success or a reason.
pub type VoidPromise<E = Error> = Promise<(), E>;

impl<E> Resolver<(), E> {
    pub fn resolve_void(&self) {
        self.resolve(());
    }
}

impl<E: 'static> Promise<(), E> {
    /// Like [`Promise::new`], but the producer fulfils by calling a
    /// no-argument function.
    pub fn new_void<S, F>(scheduler: &S, producer: F) -> Self
    where
        S: Scheduler + Clone + 'static,
        F: FnOnce(Box<dyn Fn()>, Rejecter<(), E>) + 'static,
    {
        Promise::new(scheduler, move |resolve, reject| {
            producer(Box::new(move || resolve.resolve_void()), reject)
        })
    }
}

impl Promise<(), Error> {
    /// Runs `steps` on the scheduler, starting one tick from now.
    ///
    /// Fulfils when the sequence completes and rejects with
    /// [`Error::Incomplete`] if it is aborted or interrupted first.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_ticker::{Promise, State, Step, Ticker};
    ///
    /// let ticker = Ticker::new();
    /// let mut left = 3;
    /// let promise = Promise::from_steps(&ticker, move || {
    ///     left -= 1;
    ///     if left == 0 { Step::Complete } else { Step::Yield }
    /// });
    /// ticker.run_until_idle(10);
    /// assert_eq!(promise.state(), State::Fulfilled);
    /// ```
    pub fn from_steps<S, Q>(scheduler: &S, steps: Q) -> Self
    where
        S: Scheduler + Clone + 'static,
        Q: StepSequence + 'static,
    {
        let promise = Self::unscheduled(scheduler);
        let (resolver, rejecter) = promise.authority();
        let driver = promise.scheduler.clone();
        promise.scheduler.defer(Box::new(move || {
            driver.run_to_completion(
                Box::new(steps),
                Box::new(move |completion| match completion {
                    Completion::Completed => resolver.resolve_void(),
                    Completion::Aborted => rejecter.reject(Error::Incomplete),
                }),
            )
        }));
        promise
    }
}
