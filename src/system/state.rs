//! Run State
//!
//! The one [`SharedState`] block every task of this run talks through, plus
//! the robot configuration the tasks read it with.
//!
//! ```rust,ignore
//! use crate::system::state::STATE;
//!
//! let error = STATE.tracking_error();
//! ```

use park_bot_core::{RobotConfig, SharedState};

pub static STATE: SharedState = SharedState::new();

/// Configuration for this robot, measured on the tape used for the course
pub fn robot_config() -> RobotConfig {
    RobotConfig::default()
}
