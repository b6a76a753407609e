#![cfg_attr(not(test), no_std)]

//! Control core for the park-bot
//!
//! Everything with algorithmic content lives here, free of any HAL:
//! - PID line tracking and the line-recovery maneuver
//! - Reflectance and distance sampling tasks
//! - Parking gap detection with false-gap rejection
//! - Turning-circle parking planner and the ticked drive primitive
//!
//! Hardware is reached only through the traits in [`system::ports`], and
//! every sleep goes through [`embedded_hal_async::delay::DelayNs`]. The firmware
//! binds both to the RP2350; the integration tests bind them to a simulated robot.

// Must come first so the logging macros are visible in every module below
mod fmt;

pub mod config;
pub mod error;
/// Motion planning and execution
pub mod motion;
pub mod pid;
/// Shared state, events and collaborator contracts
pub mod system;
/// Concurrent tasks and the control state machine
pub mod task;

pub use config::RobotConfig;
pub use error::ParkError;
pub use system::state::SharedState;
