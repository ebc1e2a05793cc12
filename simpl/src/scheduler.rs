use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use derive_more::{Display, From, Into};

use crate::{Clock, Error};

/// Identifies what kind of occurrence an event represents.
///
/// Kinds are opaque to the kernel; the driving model assigns meanings and
/// dispatches on them after each [`cause`](Scheduler::cause).
#[derive(
    From, Into, Debug, PartialEq, PartialOrd, Eq, Ord, Copy, Clone, Hash, Display,
)]
pub struct EventKind(u64);

impl EventKind {
    /// Constructs a kind from its numeric tag.
    #[must_use]
    pub const fn new(kind: u64) -> Self {
        Self(kind)
    }
}

/// Identifies the unit of flow an event concerns (a customer, job, or
/// request of the modeled system).
#[derive(
    From, Into, Debug, PartialEq, PartialOrd, Eq, Ord, Copy, Clone, Hash, Display,
)]
pub struct TransactId(u64);

impl TransactId {
    /// Constructs a transact ID from its numeric tag.
    #[must_use]
    pub const fn new(transact: u64) -> Self {
        Self(transact)
    }
}

/// A read-only view of a pending event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Event {
    time: Duration,
    kind: EventKind,
    transact: TransactId,
}

impl Event {
    /// The absolute simulation time at which the event occurs.
    #[must_use]
    pub fn time(&self) -> Duration {
        self.time
    }

    /// The kind of the event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The transact the event concerns.
    #[must_use]
    pub fn transact(&self) -> TransactId {
        self.transact
    }
}

/// Entry type stored in the pending set.
///
/// Entries order by `(time, kind, seq)`. The sequence number is assigned at
/// insertion, so two events scheduled with equal time and kind are both kept
/// and come out in insertion order instead of collapsing into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EventEntry {
    time: Duration,
    kind: EventKind,
    seq: u64,
    transact: TransactId,
}

impl EventEntry {
    fn view(&self) -> Event {
        Event {
            time: self.time,
            kind: self.kind,
            transact: self.transact,
        }
    }
}

/// Read-only handle to the simulation clock. Resources hold one of these so
/// that only the scheduler can move time forward.
pub struct ClockRef {
    clock: Clock,
}

impl From<Clock> for ClockRef {
    fn from(clock: Clock) -> Self {
        Self { clock }
    }
}

impl ClockRef {
    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> Duration {
        self.clock.get()
    }
}

/// Keeps the current simulation time and the ordered set of pending events.
///
/// All state mutation in a simulation happens in non-decreasing time order
/// because [`cause`](Scheduler::cause) is the single place where the clock
/// moves, and it always moves to the time of the earliest pending event.
///
/// # Examples
///
/// ```
/// # use simpl::{EventKind, Scheduler, TransactId};
/// # use std::time::Duration;
/// let mut scheduler = Scheduler::default();
/// scheduler.schedule(Duration::from_secs(5), EventKind::new(1), TransactId::new(7));
/// let (kind, transact) = scheduler.cause()?;
/// assert_eq!(scheduler.time(), Duration::from_secs(5));
/// assert_eq!((kind, transact), (EventKind::new(1), TransactId::new(7)));
/// # Ok::<(), simpl::Error>(())
/// ```
pub struct Scheduler {
    events: BTreeSet<EventEntry>,
    next_seq: u64,
    clock: Clock,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            events: BTreeSet::new(),
            next_seq: 0,
            clock: Rc::new(Cell::new(Duration::default())),
        }
    }
}

impl Scheduler {
    /// Schedules an event of `kind` concerning `transact` to occur `delay`
    /// from the current time.
    pub fn schedule(&mut self, delay: Duration, kind: EventKind, transact: TransactId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.insert(EventEntry {
            time: self.time() + delay,
            kind,
            seq,
            transact,
        });
    }

    /// Removes the earliest pending event, advances the clock to its time,
    /// and returns its kind and transact.
    ///
    /// Resource statistics are only valid as of the most recent call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPendingEvents`] if nothing is scheduled; a driving
    /// loop hitting this has lost its end-of-run event.
    pub fn cause(&mut self) -> Result<(EventKind, TransactId), Error> {
        let entry = self.events.pop_first().ok_or(Error::NoPendingEvents)?;
        self.clock.replace(entry.time);
        Ok((entry.kind, entry.transact))
    }

    /// Cancels the first pending event (in causal order) scheduled with
    /// `kind` for `transact`, returning how far in the future it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatchingEvent`] if no pending event carries both
    /// the given kind and the given transact.
    pub fn cancel(&mut self, kind: EventKind, transact: TransactId) -> Result<Duration, Error> {
        self.cancel_where(|event| event.kind() == kind && event.transact() == transact)
            .ok_or(Error::NoMatchingEvent { kind, transact })
    }

    /// Cancels the first pending event (in causal order) satisfying
    /// `predicate`, returning how far in the future it was, or `None` if no
    /// pending event matches.
    ///
    /// This is the escape hatch for looser cancellation policies, e.g.
    /// removing the next event that concerns a transact regardless of kind:
    ///
    /// ```
    /// # use simpl::{EventKind, Scheduler, TransactId};
    /// # use std::time::Duration;
    /// # let mut scheduler = Scheduler::default();
    /// scheduler.schedule(Duration::from_secs(2), EventKind::new(1), TransactId::new(7));
    /// let lead = scheduler.cancel_where(|event| event.transact() == TransactId::new(7));
    /// assert_eq!(lead, Some(Duration::from_secs(2)));
    /// ```
    pub fn cancel_where<P>(&mut self, mut predicate: P) -> Option<Duration>
    where
        P: FnMut(&Event) -> bool,
    {
        let entry = self
            .events
            .iter()
            .copied()
            .find(|entry| predicate(&entry.view()))?;
        self.events.remove(&entry);
        Some(entry.time - self.time())
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> Duration {
        self.clock.get()
    }

    /// Returns a read-only handle to the simulation clock.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        ClockRef {
            clock: Rc::clone(&self.clock),
        }
    }

    /// Iterates over pending events in causal order.
    #[must_use]
    pub fn pending(&self) -> impl Iterator<Item = Event> + '_ {
        self.events.iter().map(EventEntry::view)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Checks whether no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
