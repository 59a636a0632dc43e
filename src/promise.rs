use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::scheduler::Scheduler;
use crate::State;

pub(crate) type Shared<T, E> = Rc<RefCell<Inner<T, E>>>;

/// A value of type `T` or a rejection of type `E` that arrives later.
///
/// A `Promise` is a handle: clones observe and mutate the same promise.
/// Reactions are attached with [`then`](Promise::then),
/// [`then_void`](Promise::then_void), [`catch`](Promise::catch) and
/// [`finally`](Promise::finally). Each slot holds one callback; attaching
/// again replaces it. Reactions only fire for a settlement that happens after
/// they were attached.
pub struct Promise<T, E = crate::Error> {
    pub(crate) inner: Shared<T, E>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
}

pub(crate) struct Inner<T, E> {
    pub(crate) state: State,
    pub(crate) outcome: Option<Rc<Result<T, E>>>,
    reactions: Reactions<T, E>,
}

struct Reactions<T, E> {
    on_resolve: Option<Box<dyn FnOnce(&T)>>,
    on_resolve_void: Option<Box<dyn FnOnce()>>,
    on_reject: Option<Box<dyn FnOnce(&E)>>,
    on_finally: Option<Box<dyn FnOnce()>>,
}

impl<T, E> Default for Reactions<T, E> {
    fn default() -> Self {
        Self {
            on_resolve: None,
            on_resolve_void: None,
            on_reject: None,
            on_finally: None,
        }
    }
}

/// Authority to fulfil a promise. Calls after the promise settled do nothing.
pub struct Resolver<T, E> {
    inner: Shared<T, E>,
}

/// Authority to reject a promise. Calls after the promise settled do nothing.
pub struct Rejecter<T, E> {
    inner: Shared<T, E>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Clone for Rejecter<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Resolver<T, E> {
    pub fn resolve(&self, value: T) {
        settle(&self.inner, Ok(value));
    }
}

impl<T, E> Rejecter<T, E> {
    pub fn reject(&self, reason: E) {
        settle(&self.inner, Err(reason));
    }
}

/// Moves a pending promise to its final state and fires the reactions that
/// are attached right now: the specific ones first, `finally` last.
fn settle<T, E>(inner: &Shared<T, E>, outcome: Result<T, E>) {
    let (outcome, reactions) = {
        let mut inner = inner.borrow_mut();
        if inner.state != State::Pending {
            log::trace!("ignoring settlement of a {:?} promise", inner.state);
            return;
        }
        inner.state = if outcome.is_ok() {
            State::Fulfilled
        } else {
            State::Rejected
        };
        log::trace!("promise settled as {:?}", inner.state);
        let outcome = Rc::new(outcome);
        inner.outcome = Some(outcome.clone());
        (outcome, std::mem::take(&mut inner.reactions))
    };

    // The borrow is released so reactions may touch the promise again.
    match &*outcome {
        Ok(value) => {
            if let Some(on_resolve) = reactions.on_resolve {
                on_resolve(value);
            }
            if let Some(on_resolve_void) = reactions.on_resolve_void {
                on_resolve_void();
            }
        }
        Err(reason) => {
            if let Some(on_reject) = reactions.on_reject {
                on_reject(reason);
            }
        }
    }
    if let Some(on_finally) = reactions.on_finally {
        on_finally();
    }
}

impl<T: 'static, E: 'static> Promise<T, E> {
    /// Builds a promise whose producer may either fulfil or reject it.
    ///
    /// The producer runs on the scheduler's next tick, never inside this call.
    pub fn new<S, F>(scheduler: &S, producer: F) -> Self
    where
        S: Scheduler + Clone + 'static,
        F: FnOnce(Resolver<T, E>, Rejecter<T, E>) + 'static,
    {
        let promise = Self::unscheduled(scheduler);
        let (resolver, rejecter) = promise.authority();
        promise
            .scheduler
            .defer(Box::new(move || producer(resolver, rejecter)));
        promise
    }

    /// Builds a promise whose producer can only fulfil it. It still ends up
    /// [`State::Rejected`] if [`consume`](Promise::consume)d.
    pub fn resolve_only<S, F>(scheduler: &S, producer: F) -> Self
    where
        S: Scheduler + Clone + 'static,
        F: FnOnce(Resolver<T, E>) + 'static,
    {
        let promise = Self::unscheduled(scheduler);
        let (resolver, _) = promise.authority();
        promise.scheduler.defer(Box::new(move || producer(resolver)));
        promise
    }

    /// Builds a promise settled from the outside, with no producer to run.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_ticker::{Promise, State, Ticker};
    ///
    /// let ticker = Ticker::new();
    /// let (resolve, _reject, promise) = Promise::<&str, String>::deferred(&ticker);
    /// resolve.resolve("done");
    /// assert_eq!(promise.state(), State::Fulfilled);
    /// ```
    pub fn deferred<S>(scheduler: &S) -> (Resolver<T, E>, Rejecter<T, E>, Self)
    where
        S: Scheduler + Clone + 'static,
    {
        let promise = Self::unscheduled(scheduler);
        let (resolver, rejecter) = promise.authority();
        (resolver, rejecter, promise)
    }

    pub(crate) fn unscheduled<S>(scheduler: &S) -> Self
    where
        S: Scheduler + Clone + 'static,
    {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: State::Pending,
                outcome: None,
                reactions: Reactions::default(),
            })),
            scheduler: Rc::new(scheduler.clone()),
        }
    }
}

impl<T, E> Promise<T, E> {
    pub(crate) fn authority(&self) -> (Resolver<T, E>, Rejecter<T, E>) {
        (
            Resolver {
                inner: self.inner.clone(),
            },
            Rejecter {
                inner: self.inner.clone(),
            },
        )
    }

    pub fn state(&self) -> State {
        self.inner.borrow().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == State::Pending
    }

    /// Sets the callback that receives the value when the promise is fulfilled.
    pub fn then<F>(self, on_resolve: F) -> Self
    where
        F: FnOnce(&T) + 'static,
    {
        self.attach(|reactions| reactions.on_resolve = Some(Box::new(on_resolve)));
        self
    }

    /// Sets the callback that runs, without the value, when the promise is
    /// fulfilled. It runs after the [`then`](Promise::then) callback.
    pub fn then_void<F>(self, on_resolve: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.attach(|reactions| reactions.on_resolve_void = Some(Box::new(on_resolve)));
        self
    }

    /// Sets the callback that receives the reason when the promise is rejected.
    pub fn catch<F>(self, on_reject: F) -> Self
    where
        F: FnOnce(&E) + 'static,
    {
        self.attach(|reactions| reactions.on_reject = Some(Box::new(on_reject)));
        self
    }

    /// Sets the callback that runs after either outcome.
    pub fn finally<F>(self, on_finally: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.attach(|reactions| reactions.on_finally = Some(Box::new(on_finally)));
        self
    }

    /// Stops observing the outcome.
    ///
    /// The promise is marked [`State::Rejected`] without running any reaction,
    /// and later settlement by the producer is ignored. The producer's own
    /// work is not stopped.
    pub fn consume(&self) {
        let dropped = {
            let mut inner = self.inner.borrow_mut();
            log::trace!("consuming a {:?} promise", inner.state);
            inner.state = State::Rejected;
            std::mem::take(&mut inner.reactions)
        };
        drop(dropped);
    }

    fn attach(&self, set: impl FnOnce(&mut Reactions<T, E>)) {
        let mut inner = self.inner.borrow_mut();
        // A settled promise never fires again; keep nothing alive for it.
        if inner.state == State::Pending {
            set(&mut inner.reactions);
        }
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl<T, E> fmt::Debug for Rejecter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter").finish_non_exhaustive()
    }
}
