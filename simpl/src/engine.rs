use std::time::Duration;

use delegate::delegate;
use rand::RngCore;

use crate::{
    ClockRef, Device, Error, Event, EventKind, Priority, Queue, Scheduler, Stage, TransactId,
};

/// Identifies a [`Device`] registered in an [`Engine`].
///
/// IDs can be constructed only by [`Engine::add_device`]. Each ID also holds
/// a hash unique to the issuing engine, so an ID cannot be used with a
/// different engine instance. Such an operation will panic:
///
/// ```should_panic
/// # use simpl::Engine;
/// let mut engine_1 = Engine::default();
/// let engine_2 = Engine::default();
/// let id = engine_1.add_device("machine");
/// let _ = engine_2.device(id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    id: usize,
    engine_hash: u64,
}

/// Identifies a [`Queue`] registered in an [`Engine`].
///
/// This is the analogue of [`DeviceId`] for queues, guarded by the same
/// engine hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueId {
    id: usize,
    engine_hash: u64,
}

/// Owns the scheduler together with the devices and queues of a simulation.
///
/// The engine is the single writer of simulation time, which advances only
/// in [`cause`](Engine::cause). Devices and queues registered here share the
/// engine's clock, so their statistics stay consistent with it without any
/// back-references.
///
/// # Examples
///
/// A driving loop asks the engine for events and acts on the resources:
///
/// ```
/// # use simpl::{Engine, EventKind, TransactId};
/// # use std::time::Duration;
/// const ARRIVE: EventKind = EventKind::new(1);
///
/// let mut engine = Engine::default();
/// let machine = engine.add_device("machine");
/// engine.schedule(Duration::from_secs(3), ARRIVE, TransactId::new(1));
///
/// let (kind, transact) = engine.cause()?;
/// assert_eq!(kind, ARRIVE);
/// engine.device_mut(machine).reserve(transact)?;
/// assert_eq!(engine.time(), Duration::from_secs(3));
/// # Ok::<(), simpl::Error>(())
/// ```
pub struct Engine {
    scheduler: Scheduler,
    devices: Vec<Device>,
    queues: Vec<Queue>,
    engine_hash: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            scheduler: Scheduler::default(),
            devices: Vec::new(),
            queues: Vec::new(),
            engine_hash: rand::thread_rng().next_u64(),
        }
    }
}

impl Engine {
    fn assert_hash(&self, hash: u64) {
        assert_eq!(
            hash, self.engine_hash,
            "Engine hash of the ID does not match the hash of the engine"
        );
    }

    /// Registers a new device under `name` and returns its ID.
    #[must_use = "Discarding the ID leaves no way to reach the device"]
    pub fn add_device(&mut self, name: impl Into<String>) -> DeviceId {
        let id = self.devices.len();
        self.devices
            .push(Device::new(name.into(), self.scheduler.clock()));
        DeviceId {
            id,
            engine_hash: self.engine_hash,
        }
    }

    /// Registers a new queue under `name` and returns its ID.
    #[must_use = "Discarding the ID leaves no way to reach the queue"]
    pub fn add_queue(&mut self, name: impl Into<String>) -> QueueId {
        let id = self.queues.len();
        self.queues
            .push(Queue::new(name.into(), self.scheduler.clock()));
        QueueId {
            id,
            engine_hash: self.engine_hash,
        }
    }

    /// Returns the device registered under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different engine.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> &Device {
        self.assert_hash(id.engine_hash);
        &self.devices[id.id]
    }

    /// Returns the device registered under `id` for mutation.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different engine.
    #[must_use]
    pub fn device_mut(&mut self, id: DeviceId) -> &mut Device {
        self.assert_hash(id.engine_hash);
        &mut self.devices[id.id]
    }

    /// Returns the queue registered under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different engine.
    #[must_use]
    pub fn queue(&self, id: QueueId) -> &Queue {
        self.assert_hash(id.engine_hash);
        &self.queues[id.id]
    }

    /// Returns the queue registered under `id` for mutation.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different engine.
    #[must_use]
    pub fn queue_mut(&mut self, id: QueueId) -> &mut Queue {
        self.assert_hash(id.engine_hash);
        &mut self.queues[id.id]
    }

    /// Iterates over all registered devices in registration order.
    #[must_use]
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Iterates over all registered queues in registration order.
    #[must_use]
    pub fn queues(&self) -> impl Iterator<Item = &Queue> {
        self.queues.iter()
    }

    /// Iterates over pending events in causal order.
    #[must_use]
    pub fn pending(&self) -> impl Iterator<Item = Event> + '_ {
        self.scheduler.pending()
    }

    /// Cancels the first pending event (in causal order) satisfying
    /// `predicate`, returning how far in the future it was, or `None` if no
    /// pending event matches. See [`Scheduler::cancel_where`].
    pub fn cancel_where<P>(&mut self, predicate: P) -> Option<Duration>
    where
        P: FnMut(&Event) -> bool,
    {
        self.scheduler.cancel_where(predicate)
    }

    delegate! {
        to self.scheduler {
            /// Schedules an event of `kind` concerning `transact` to occur
            /// `delay` from the current time.
            pub fn schedule(&mut self, delay: Duration, kind: EventKind, transact: TransactId);

            /// Removes the earliest pending event, advances the clock to its
            /// time, and returns its kind and transact.
            ///
            /// # Errors
            ///
            /// Returns [`Error::NoPendingEvents`] if nothing is scheduled.
            pub fn cause(&mut self) -> Result<(EventKind, TransactId), Error>;

            /// Cancels the first pending event (in causal order) scheduled
            /// with `kind` for `transact`, returning how far in the future
            /// it was.
            ///
            /// # Errors
            ///
            /// Returns [`Error::NoMatchingEvent`] if no pending event
            /// carries both the given kind and the given transact.
            pub fn cancel(&mut self, kind: EventKind, transact: TransactId) -> Result<Duration, Error>;

            /// Returns the current simulation time.
            #[must_use]
            pub fn time(&self) -> Duration;

            /// Returns a structure with immutable access to the simulation
            /// time.
            #[must_use]
            pub fn clock(&self) -> ClockRef;
        }
    }

    /// Enqueues `transact` into the queue registered under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different engine.
    pub fn enqueue(&mut self, id: QueueId, transact: TransactId, priority: Priority, stage: Stage) {
        self.queue_mut(id).enqueue(transact, priority, stage);
    }

    /// Dequeues the transact first in line in the queue registered under
    /// `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQueue`] if no transact is waiting.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different engine.
    pub fn head(&mut self, id: QueueId) -> Result<(TransactId, Stage), Error> {
        self.queue_mut(id).head()
    }
}
