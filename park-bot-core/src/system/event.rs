//! Run Events
//!
//! Notifications for observers such as the status LED. They are published
//! without waiting: the control loop never depends on anyone listening.

use crate::error::ParkError;

/// Capacity of the event queue
pub const EVENT_QUEUE_SIZE: usize = 8;

/// Milestones of a run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The PID integral saturated on the negative side, the robot left the line
    LineLost,
    /// The recovery maneuver found the line again
    LineReacquired,
    /// A gap was confirmed next to an obstacle at `clear_distance`
    GapConfirmed { clear_distance: f32 },
    /// The parking maneuver was planned for `gap_length`
    ParkingStarted { gap_length: f32 },
    /// All motion commands executed, motors stopped
    ParkingComplete,
    /// The run ended with a fatal error, motors stopped
    ParkingAborted(ParkError),
}
