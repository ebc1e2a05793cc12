#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

//! General purpose discrete-event simulation kernel: a scheduler that
//! advances a logical clock by causing the earliest pending event, an
//! exclusive-use [`Device`], and a waiting [`Queue`], with resource
//! statistics maintained incrementally against the same clock.
//!
//! The [`Engine`] composes these and is the only mutator of simulation
//! time; resources read the clock through a [`ClockRef`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Simulation clock.
pub type Clock = Rc<Cell<Duration>>;

pub use device::Device;
pub use engine::{DeviceId, Engine, QueueId};
pub use error::Error;
pub use queue::{Priority, Queue, QueueItem, Stage};
pub use scheduler::{ClockRef, Event, EventKind, Scheduler, TransactId};

mod device;
mod engine;
mod error;
mod queue;
mod scheduler;
