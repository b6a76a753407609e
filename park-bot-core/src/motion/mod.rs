pub mod drive;
pub mod planner;

pub use drive::{DriveOutcome, Drivetrain, MotionCommand};
pub use planner::{plan, ParkingPlan};
