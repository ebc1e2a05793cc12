use crate::{EventKind, TransactId};

/// Failure of a kernel operation.
///
/// Every variant is a precondition violated by the driving model, not a
/// recoverable runtime condition: the kernel performs no I/O, so a failure
/// here always means a logic bug in the simulation built on top of it. The
/// variants carry the violating arguments so the run can be aborted with a
/// useful diagnostic.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// [`cause`](crate::Scheduler::cause) was called with nothing scheduled.
    /// Usually the driving model forgot to schedule its end-of-run event.
    #[error("no pending events to cause")]
    NoPendingEvents,

    /// [`cancel`](crate::Scheduler::cancel) found no event scheduled with the
    /// given kind for the given transact.
    #[error("no pending event of kind {kind} for transact {transact}")]
    NoMatchingEvent {
        /// Kind the cancellation looked for.
        kind: EventKind,
        /// Transact the cancellation looked for.
        transact: TransactId,
    },

    /// [`reserve`](crate::Device::reserve) on a device that is already busy.
    #[error("device {device} is busy with transact {occupant}, cannot reserve it for {transact}")]
    DeviceBusy {
        /// Name of the device.
        device: String,
        /// Transact currently occupying the device.
        occupant: TransactId,
        /// Transact that attempted the reservation.
        transact: TransactId,
    },

    /// [`release`](crate::Device::release) on a device that is already free.
    #[error("device {device} is already free, nothing to release")]
    DeviceIdle {
        /// Name of the device.
        device: String,
    },

    /// [`head`](crate::Queue::head) on a queue with no waiting transacts.
    #[error("queue {queue} is empty, nothing to dequeue")]
    EmptyQueue {
        /// Name of the queue.
        queue: String,
    },
}
