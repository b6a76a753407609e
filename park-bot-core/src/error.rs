//! Fatal run errors
//!
//! Only conditions that end the run live here. Sensor noise, false gaps and
//! integral saturation are absorbed where they happen and merely logged.

use core::fmt;

/// Reasons a run stops before the robot is parked
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParkError {
    /// The turning circles cannot touch for this gap, the planner would produce NaN
    GapInfeasible { gap_length: f32 },
    /// Parking was entered without a confirmed clear distance
    NoGapMeasurement,
    /// A motion command neither reached its tick target nor hit the bumper in time
    DriveTimeout { target_ticks: i32, reached_ticks: i32 },
    /// The line was not found again within the recovery timeout
    RecoveryTimeout,
    /// The run already ended; a robot parks once per power cycle
    AlreadyFinished,
}

impl fmt::Display for ParkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GapInfeasible { gap_length } => write!(f, "gap of {gap_length} cm is infeasible to park in"),
            Self::NoGapMeasurement => f.write_str("parking started without a confirmed gap"),
            Self::DriveTimeout {
                target_ticks,
                reached_ticks,
            } => write!(f, "drive timed out at {reached_ticks} of {target_ticks} ticks"),
            Self::RecoveryTimeout => f.write_str("line not reacquired before the recovery timeout"),
            Self::AlreadyFinished => f.write_str("run already finished"),
        }
    }
}

impl core::error::Error for ParkError {}
