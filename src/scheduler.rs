//! The contract a [`Promise`](crate::Promise) needs from whatever drives it.
//!
//! A scheduler is a single-threaded cooperative driver. It can run a unit of
//! work on a later tick, and it can drive a [`StepSequence`] one step per
//! tick until the sequence completes or is aborted.

/// A unit of deferred work.
pub type Work = Box<dyn FnOnce()>;

/// Called once with the outcome of a step sequence.
pub type OnCompletion = Box<dyn FnOnce(Completion)>;

/// What a step sequence reports after advancing once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspend until the next tick.
    Yield,
    /// The sequence ran to its end.
    Complete,
    /// The sequence gave up before reaching its end.
    Abort,
}

/// How a step sequence finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Completed,
    Aborted,
}

/// Work expressed as a series of suspend points rather than a callback.
///
/// # Examples
///
/// ```
/// use promise_ticker::{Step, StepSequence};
///
/// let mut left = 2;
/// let mut steps = move || {
///     if left == 0 {
///         return Step::Complete;
///     }
///     left -= 1;
///     Step::Yield
/// };
/// assert_eq!(steps.step(), Step::Yield);
/// assert_eq!(steps.step(), Step::Yield);
/// assert_eq!(steps.step(), Step::Complete);
/// ```
pub trait StepSequence {
    fn step(&mut self) -> Step;
}

impl<F> StepSequence for F
where
    F: FnMut() -> Step,
{
    fn step(&mut self) -> Step {
        self()
    }
}

pub trait Scheduler {
    /// Runs `work` after at least one tick has passed. Never runs it inline.
    fn defer(&self, work: Work);

    /// Drives `steps` until it completes or is interrupted, then hands the
    /// outcome to `done`. `done` is called exactly once.
    fn run_to_completion(&self, steps: Box<dyn StepSequence>, done: OnCompletion);
}
