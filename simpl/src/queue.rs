use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::time::Duration;

use derive_more::{Display, From, Into};

use crate::{ClockRef, Error, TransactId};

/// Dequeue precedence of a queued transact among equal arrival times.
/// Lower values dequeue sooner.
#[derive(
    From, Into, Debug, PartialEq, PartialOrd, Eq, Ord, Copy, Clone, Hash, Display,
)]
pub struct Priority(u64);

impl Priority {
    /// Constructs a priority from its numeric rank.
    #[must_use]
    pub const fn new(priority: u64) -> Self {
        Self(priority)
    }
}

/// An opaque tag carried through the queue with each transact, interpreted
/// only by the driving model (e.g. which processing step the transact
/// resumes at after waiting).
#[derive(
    From, Into, Debug, PartialEq, PartialOrd, Eq, Ord, Copy, Clone, Hash, Display,
)]
pub struct Stage(u64);

impl Stage {
    /// Constructs a stage from its numeric tag.
    #[must_use]
    pub const fn new(stage: u64) -> Self {
        Self(stage)
    }
}

/// A read-only view of a waiting transact.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueueItem {
    arrived_at: Duration,
    transact: TransactId,
    priority: Priority,
    stage: Stage,
}

impl QueueItem {
    /// The simulation time the transact joined the queue.
    #[must_use]
    pub fn arrived_at(&self) -> Duration {
        self.arrived_at
    }

    /// The waiting transact.
    #[must_use]
    pub fn transact(&self) -> TransactId {
        self.transact
    }

    /// The transact's dequeue precedence.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The tag it was enqueued with.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// Entries order by `(arrived_at, priority, seq)`; the insertion sequence
/// number keeps otherwise identical items distinct and in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    arrived_at: Duration,
    priority: Priority,
    seq: u64,
    transact: TransactId,
    stage: Stage,
}

impl QueueEntry {
    fn view(&self) -> QueueItem {
        QueueItem {
            arrived_at: self.arrived_at,
            transact: self.transact,
            priority: self.priority,
            stage: self.stage,
        }
    }
}

/// A waiting line ordered by arrival time, then [`Priority`].
///
/// Alongside its contents the queue maintains the accumulators needed for
/// time-averaged statistics. Every enqueue and dequeue first charges
/// `length held so far × time elapsed since the previous change` to
/// [`length_time_sum`](Queue::length_time_sum), so dividing that sum by the
/// elapsed simulation time yields the time-average length without the queue
/// ever being sampled.
pub struct Queue {
    name: String,
    clock: ClockRef,
    items: BTreeSet<QueueEntry>,
    next_seq: u64,
    max_length: usize,
    length_time_sum: Duration,
    wait_time_sum: Duration,
    wait_time_sq_sum: f64,
    last_change_at: Duration,
    dequeued: u64,
}

impl Queue {
    pub(crate) fn new(name: String, clock: ClockRef) -> Self {
        Self {
            name,
            clock,
            items: BTreeSet::new(),
            next_seq: 0,
            max_length: 0,
            length_time_sum: Duration::default(),
            wait_time_sum: Duration::default(),
            wait_time_sq_sum: 0.0,
            last_change_at: Duration::default(),
            dequeued: 0,
        }
    }

    /// Name the queue was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `transact` to the line, arriving now.
    ///
    /// The same transact may be enqueued again; the entries wait
    /// independently.
    pub fn enqueue(&mut self, transact: TransactId, priority: Priority, stage: Stage) {
        self.charge(self.items.len());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.insert(QueueEntry {
            arrived_at: self.clock.time(),
            priority,
            seq,
            transact,
            stage,
        });
        self.max_length = self.max_length.max(self.items.len());
    }

    /// Removes and returns the transact first in line, along with the stage
    /// it was enqueued with. The time it spent waiting counts towards
    /// [`wait_time_sum`](Queue::wait_time_sum).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQueue`] if no transact is waiting.
    pub fn head(&mut self) -> Result<(TransactId, Stage), Error> {
        let entry = match self.items.pop_first() {
            Some(entry) => entry,
            None => {
                return Err(Error::EmptyQueue {
                    queue: self.name.clone(),
                });
            }
        };
        // The interval being charged still held the removed item.
        self.charge(self.items.len() + 1);
        let waited = self.clock.time() - entry.arrived_at;
        self.wait_time_sum += waited;
        self.wait_time_sq_sum += waited.as_secs_f64().powi(2);
        self.dequeued += 1;
        Ok((entry.transact, entry.stage))
    }

    fn charge(&mut self, held: usize) {
        let now = self.clock.time();
        let elapsed = now - self.last_change_at;
        self.length_time_sum += elapsed * u32::try_from(held).unwrap_or(u32::MAX);
        self.last_change_at = now;
    }

    /// Number of transacts currently waiting.
    #[must_use]
    pub fn length(&self) -> usize {
        self.items.len()
    }

    /// Iterates over waiting transacts in dequeue order.
    #[must_use]
    pub fn items(&self) -> impl Iterator<Item = QueueItem> + '_ {
        self.items.iter().map(QueueEntry::view)
    }

    /// The longest the line has ever been.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Integral of queue length over time, accrued up to the most recent
    /// enqueue or dequeue.
    #[must_use]
    pub fn length_time_sum(&self) -> Duration {
        self.length_time_sum
    }

    /// Total time dequeued transacts spent waiting.
    #[must_use]
    pub fn wait_time_sum(&self) -> Duration {
        self.wait_time_sum
    }

    /// Sum of squared waiting times of dequeued transacts, in seconds
    /// squared.
    #[must_use]
    pub fn wait_time_sq_sum(&self) -> f64 {
        self.wait_time_sq_sum
    }

    /// Number of transacts that have left the line through
    /// [`head`](Queue::head).
    #[must_use]
    pub fn dequeued(&self) -> u64 {
        self.dequeued
    }

    /// Mean waiting time over dequeued transacts, or `None` if nothing has
    /// been dequeued yet.
    #[must_use]
    pub fn mean_wait(&self) -> Option<Duration> {
        let dequeued = u32::try_from(self.dequeued).ok().filter(|&n| n > 0)?;
        Some(self.wait_time_sum / dequeued)
    }

    /// Standard deviation of waiting times in seconds, or `None` if nothing
    /// has been dequeued yet.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stdev_wait(&self) -> Option<f64> {
        if self.dequeued == 0 {
            return None;
        }
        let count = self.dequeued as f64;
        let mean = self.wait_time_sum.as_secs_f64() / count;
        let variance = self.wait_time_sq_sum / count - mean.powi(2);
        Some(variance.max(0.0).sqrt())
    }

    /// Time-average queue length since the start of the run. Zero before
    /// the clock first advances.
    #[must_use]
    pub fn mean_length(&self) -> f64 {
        let total = self.clock.time().as_secs_f64();
        if total > 0.0 {
            self.length_time_sum.as_secs_f64() / total
        } else {
            0.0
        }
    }
}
