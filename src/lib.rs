//! Promises for single-threaded cooperative schedulers.
//!
//! A [`Promise`] hands its producer to a [`Scheduler`] one tick after it is
//! built, so reactions attached right after construction always see the
//! outcome. Reactions are single slots: attaching again replaces the
//! previous callback, and attaching after settlement never fires.
//!
//! # Examples
//!
//! ```
//! use promise_ticker::{Promise, State, Ticker};
//! use std::{cell::RefCell, rc::Rc};
//!
//! let ticker = Ticker::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let (on_value, on_finally) = (log.clone(), log.clone());
//!
//! let promise = Promise::<u32, String>::new(&ticker, |resolve, reject| {
//!     resolve.resolve(42);
//!     reject.reject("too late".into());
//! })
//! .then(move |value| on_value.borrow_mut().push(format!("value {value}")))
//! .finally(move || on_finally.borrow_mut().push("finally".to_string()));
//!
//! ticker.tick();
//! assert_eq!(promise.state(), State::Fulfilled);
//! assert_eq!(*log.borrow(), vec!["value 42", "finally"]);
//! ```
use thiserror::Error;

pub mod bridge;
pub mod promise;
pub mod scheduler;
pub mod ticker;
pub mod void;

pub use bridge::{Resolved, Settled};
pub use promise::{Promise, Rejecter, Resolver};
pub use scheduler::{Completion, Scheduler, Step, StepSequence};
pub use ticker::Ticker;
pub use void::VoidPromise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

/// The default reject type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A step sequence was interrupted before it ran to its end.
    #[error("step sequence did not complete")]
    Incomplete,
    #[error("{0}")]
    Message(String),
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Message(message.to_owned())
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Message(message)
    }
}

/// Why awaiting a promise through [`Promise::resolve`] failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection<E> {
    /// The producer rejected with this value.
    #[error("promise rejected")]
    Reason(E),
    /// The promise was consumed, so no value or reason will ever arrive.
    #[error("promise was consumed")]
    Consumed,
}

impl<E> Rejection<E> {
    /// The producer's reject value, if there is one.
    pub fn into_reason(self) -> Option<E> {
        match self {
            Rejection::Reason(reason) => Some(reason),
            Rejection::Consumed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_convert_into_errors() {
        assert_eq!(Error::from("boom"), Error::Message("boom".into()));
        assert_eq!(Error::from(String::from("boom")).to_string(), "boom");
        assert_eq!(Error::Incomplete.to_string(), "step sequence did not complete");
    }

    #[test]
    fn rejection_exposes_reason() {
        assert_eq!(Rejection::Reason(3).into_reason(), Some(3));
        assert_eq!(Rejection::<i32>::Consumed.into_reason(), None);
    }
}
