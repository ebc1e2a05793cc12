//! Discrete-event simulation of a machine shop: jobs arrive at random
//! intervals and contend for a single machine, lining up in a backlog
//! whenever it is busy.

#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

pub use model::{MachineShop, ShopEvent, ShopOutcome};
pub use random::{DelayDistribution, DelaySampler};

pub mod config;
pub mod report;

mod model;
mod random;
