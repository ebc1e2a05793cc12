use std::convert::TryFrom;
use std::time::Duration;

use crate::{ClockRef, Error, TransactId};

/// A facility that serves exactly one transact at a time.
///
/// A device is either free or occupied by the transact that reserved it.
/// Service time is whatever elapses between [`reserve`](Device::reserve) and
/// [`release`](Device::release); the device itself never schedules anything,
/// the driving model does.
pub struct Device {
    name: String,
    clock: ClockRef,
    occupant: Option<TransactId>,
    reserved_at: Duration,
    completed: u64,
    busy_time: Duration,
}

impl Device {
    pub(crate) fn new(name: String, clock: ClockRef) -> Self {
        Self {
            name,
            clock,
            occupant: None,
            reserved_at: Duration::default(),
            completed: 0,
            busy_time: Duration::default(),
        }
    }

    /// Name the device was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Occupies the device with `transact`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceBusy`] if another transact currently occupies
    /// the device. The caller is expected to check
    /// [`status`](Device::status) first and queue the transact instead.
    pub fn reserve(&mut self, transact: TransactId) -> Result<(), Error> {
        if let Some(occupant) = self.occupant {
            return Err(Error::DeviceBusy {
                device: self.name.clone(),
                occupant,
                transact,
            });
        }
        self.occupant = Some(transact);
        self.reserved_at = self.clock.time();
        Ok(())
    }

    /// Frees the device, returning the transact that occupied it. The time
    /// since the matching [`reserve`](Device::reserve) counts towards
    /// [`busy_time`](Device::busy_time).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceIdle`] if the device is already free.
    pub fn release(&mut self) -> Result<TransactId, Error> {
        match self.occupant.take() {
            Some(occupant) => {
                self.busy_time += self.clock.time() - self.reserved_at;
                self.completed += 1;
                Ok(occupant)
            }
            None => Err(Error::DeviceIdle {
                device: self.name.clone(),
            }),
        }
    }

    /// The transact currently occupying the device, or `None` if it is free.
    #[must_use]
    pub fn status(&self) -> Option<TransactId> {
        self.occupant
    }

    /// Number of completed services, i.e. reserve/release pairs.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Total time spent serving over all completed services. Time since an
    /// unreleased reserve is not included.
    #[must_use]
    pub fn busy_time(&self) -> Duration {
        self.busy_time
    }

    /// Mean service time over completed services, or `None` if the device
    /// has not completed any.
    #[must_use]
    pub fn mean_service_time(&self) -> Option<Duration> {
        let completed = u32::try_from(self.completed).ok().filter(|&n| n > 0)?;
        Some(self.busy_time / completed)
    }

    /// Fraction of elapsed simulation time spent serving, in `0.0..=1.0`.
    /// Zero before the clock first advances.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        let total = self.clock.time().as_secs_f64();
        if total > 0.0 {
            self.busy_time.as_secs_f64() / total
        } else {
            0.0
        }
    }
}
