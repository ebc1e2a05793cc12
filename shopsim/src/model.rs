//! The machine shop model driving the simulation engine.

use std::convert::TryFrom;
use std::time::Duration;

use rand::distributions::Distribution;
use rand::Rng;

use simpl::{Device, DeviceId, Engine, EventKind, Priority, Queue, QueueId, Stage, TransactId};

use crate::config::TimeUnit;

/// Kinds of events driving the machine shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopEvent {
    /// A new job enters the shop.
    Arrival = 1,
    /// A job attempts to occupy the machine.
    Seize,
    /// The machine finishes the job it is working on.
    Finish,
    /// The shift is over.
    End,
}

impl From<ShopEvent> for EventKind {
    fn from(event: ShopEvent) -> Self {
        Self::new(event as u64)
    }
}

impl TryFrom<EventKind> for ShopEvent {
    type Error = eyre::Report;

    fn try_from(kind: EventKind) -> Result<Self, Self::Error> {
        match u64::from(kind) {
            1 => Ok(Self::Arrival),
            2 => Ok(Self::Seize),
            3 => Ok(Self::Finish),
            4 => Ok(Self::End),
            kind => Err(eyre::eyre!("unknown event kind: {}", kind)),
        }
    }
}

/// A machine shop with a single machine working off arriving jobs.
///
/// Jobs arrive one after another, separated by delays drawn from the
/// interarrival distribution. An arriving job seizes the machine if it is
/// free and lines up in the backlog otherwise; whenever the machine
/// finishes a job it pulls the next one from the backlog.
pub struct MachineShop<A, S> {
    interarrival: A,
    service: S,
    shift: Duration,
    unit: TimeUnit,
    priority: Priority,
    stage: Stage,
}

impl<A, S> MachineShop<A, S>
where
    A: Distribution<u64>,
    S: Distribution<u64>,
{
    /// Sets up a shop drawing job interarrival times and machining times
    /// from the given distributions, closing `shift` after it opens.
    pub fn new(interarrival: A, service: S, shift: Duration, unit: TimeUnit) -> Self {
        Self {
            interarrival,
            service,
            shift,
            unit,
            priority: Priority::new(0),
            stage: Stage::new(1),
        }
    }

    /// Sets the priority and stage tag jobs line up in the backlog with.
    #[must_use]
    pub fn queued_as(mut self, priority: Priority, stage: Stage) -> Self {
        self.priority = priority;
        self.stage = stage;
        self
    }

    fn delay<R>(&self, distribution: &impl Distribution<u64>, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        self.unit.duration(distribution.sample(rng))
    }

    /// Runs the shop for one shift and returns its final state.
    ///
    /// # Errors
    ///
    /// Returns an error if an event cannot be handled; this means a bug in
    /// the model itself, so the run is not worth continuing.
    pub fn run<R>(&self, rng: &mut R) -> eyre::Result<ShopOutcome>
    where
        R: Rng + ?Sized,
    {
        let mut engine = Engine::default();
        let machine = engine.add_device("machine");
        let backlog = engine.add_queue("backlog");

        let mut arrived = 0_u64;
        let mut next_job = 1_u64;

        engine.schedule(
            self.delay(&self.interarrival, rng),
            ShopEvent::Arrival.into(),
            TransactId::new(next_job),
        );
        engine.schedule(self.shift, ShopEvent::End.into(), TransactId::new(0));

        loop {
            let (kind, transact) = engine.cause()?;
            match ShopEvent::try_from(kind)? {
                ShopEvent::Arrival => {
                    arrived += 1;
                    log::debug!("Job {} arrives at {:?}", transact, engine.time());
                    engine.schedule(Duration::default(), ShopEvent::Seize.into(), transact);
                    next_job += 1;
                    engine.schedule(
                        self.delay(&self.interarrival, rng),
                        ShopEvent::Arrival.into(),
                        TransactId::new(next_job),
                    );
                }
                ShopEvent::Seize => {
                    if engine.device(machine).status().is_none() {
                        engine.device_mut(machine).reserve(transact)?;
                        let service = self.delay(&self.service, rng);
                        log::debug!("Job {} takes the machine for {:?}", transact, service);
                        engine.schedule(service, ShopEvent::Finish.into(), transact);
                    } else {
                        log::debug!("Job {} lines up in the backlog", transact);
                        engine.enqueue(backlog, transact, self.priority, self.stage);
                    }
                }
                ShopEvent::Finish => {
                    let done = engine.device_mut(machine).release()?;
                    log::debug!("Job {} leaves at {:?}", done, engine.time());
                    if engine.queue(backlog).length() > 0 {
                        let (next, _) = engine.head(backlog)?;
                        engine.schedule(Duration::default(), ShopEvent::Seize.into(), next);
                    }
                }
                ShopEvent::End => break,
            }
        }

        Ok(ShopOutcome {
            engine,
            machine,
            backlog,
            arrived,
        })
    }
}

/// A finished run, exposing the engine and its resources for reporting.
pub struct ShopOutcome {
    engine: Engine,
    machine: DeviceId,
    backlog: QueueId,
    arrived: u64,
}

impl ShopOutcome {
    /// The engine in its end-of-shift state.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The machine of the shop.
    #[must_use]
    pub fn machine(&self) -> &Device {
        self.engine.device(self.machine)
    }

    /// The backlog feeding the machine.
    #[must_use]
    pub fn backlog(&self) -> &Queue {
        self.engine.queue(self.backlog)
    }

    /// Number of jobs that arrived during the shift.
    #[must_use]
    pub fn arrived(&self) -> u64 {
        self.arrived
    }
}
