use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::scheduler::{Completion, OnCompletion, Scheduler, Step, StepSequence, Work};

/// A single-threaded cooperative [`Scheduler`] advanced by calling
/// [`tick`](Ticker::tick), typically once per frame of a host loop.
///
/// `Ticker` is a cheap handle; clones share the same queues.
///
/// # Examples
///
/// ```
/// use promise_ticker::{Promise, Ticker};
/// use std::{cell::Cell, rc::Rc};
///
/// let ticker = Ticker::new();
/// let seen = Rc::new(Cell::new(0));
/// let sink = seen.clone();
/// let _promise = Promise::<u32, String>::new(&ticker, |resolve, _reject| resolve.resolve(7))
///     .then(move |value| sink.set(*value));
///
/// assert_eq!(seen.get(), 0);
/// ticker.tick();
/// assert_eq!(seen.get(), 7);
/// ```
#[derive(Clone, Default)]
pub struct Ticker {
    queue: Rc<RefCell<Queue>>,
}

#[derive(Default)]
struct Queue {
    deferred: VecDeque<Work>,
    running: Vec<Running>,
    ticks: u64,
    /// Set while `tick` holds the running sequences outside the queue.
    stepping: bool,
    /// A `stop_all` arrived while stepping.
    stop_requested: bool,
}

struct Running {
    steps: Box<dyn StepSequence>,
    done: OnCompletion,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.queue.borrow().ticks
    }

    /// Returns `true` when there is no deferred work and no running sequence.
    pub fn is_idle(&self) -> bool {
        let queue = self.queue.borrow();
        queue.deferred.is_empty() && queue.running.is_empty()
    }

    /// Runs one tick.
    ///
    /// Work deferred before this call runs now; work deferred while the tick
    /// is in progress waits for the next tick. Every running sequence is then
    /// advanced by one step. Returns how many units of work and steps ran.
    pub fn tick(&self) -> usize {
        let batch = {
            let mut queue = self.queue.borrow_mut();
            queue.ticks += 1;
            std::mem::take(&mut queue.deferred)
        };
        let mut ran = batch.len();
        for work in batch {
            work();
        }

        let mut running = {
            let mut queue = self.queue.borrow_mut();
            queue.stepping = true;
            std::mem::take(&mut queue.running).into_iter()
        };
        ran += running.len();
        let mut still_running = Vec::with_capacity(running.len());
        for mut sequence in running.by_ref() {
            match sequence.steps.step() {
                Step::Yield => still_running.push(sequence),
                Step::Complete => (sequence.done)(Completion::Completed),
                Step::Abort => (sequence.done)(Completion::Aborted),
            }
            if self.queue.borrow().stop_requested {
                break;
            }
        }

        let stopped = {
            let mut queue = self.queue.borrow_mut();
            queue.stepping = false;
            if std::mem::take(&mut queue.stop_requested) {
                // Everything held here was in flight when `stop_all` ran.
                still_running.extend(running);
                still_running
            } else {
                // Sequences started during this tick go after the older ones.
                still_running.append(&mut queue.running);
                queue.running = still_running;
                Vec::new()
            }
        };
        if !stopped.is_empty() {
            log::trace!("stopping {} sequences held by the tick", stopped.len());
        }
        for sequence in stopped {
            (sequence.done)(Completion::Aborted);
        }

        let queue = self.queue.borrow();
        log::trace!(
            "tick {}: ran {}, {} deferred, {} running",
            queue.ticks,
            ran,
            queue.deferred.len(),
            queue.running.len()
        );
        ran
    }

    /// Ticks until nothing is left to do or `max_ticks` ticks have run.
    ///
    /// Returns the number of ticks taken, or `None` if work remained after
    /// the limit.
    pub fn run_until_idle(&self, max_ticks: u64) -> Option<u64> {
        let mut taken = 0;
        while !self.is_idle() {
            if taken == max_ticks {
                return None;
            }
            self.tick();
            taken += 1;
        }
        Some(taken)
    }

    /// Interrupts every running sequence, reporting [`Completion::Aborted`]
    /// to each. Deferred work is left queued.
    ///
    /// Called from inside a tick, the sequences that tick has not yet
    /// written back are aborted when it finishes stepping.
    pub fn stop_all(&self) {
        let running = {
            let mut queue = self.queue.borrow_mut();
            if queue.stepping {
                queue.stop_requested = true;
            }
            std::mem::take(&mut queue.running)
        };
        log::trace!("stopping {} running sequences", running.len());
        for sequence in running {
            (sequence.done)(Completion::Aborted);
        }
    }
}

impl Scheduler for Ticker {
    fn defer(&self, work: Work) {
        self.queue.borrow_mut().deferred.push_back(work);
    }

    fn run_to_completion(&self, steps: Box<dyn StepSequence>, done: OnCompletion) {
        self.queue.borrow_mut().running.push(Running { steps, done });
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("Ticker")
            .field("ticks", &queue.ticks)
            .field("deferred", &queue.deferred.len())
            .field("running", &queue.running.len())
            .finish()
    }
}
