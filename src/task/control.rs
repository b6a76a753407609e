//! Control task
//!
//! Owns the motors and the bumper and runs the core state machine: line
//! following with recovery until a gap is confirmed, then the parking
//! maneuver. The run happens once per power cycle; afterwards the motors stay
//! braked and the task ends.

use defmt::{error, info};
use embassy_time::Delay;
use park_bot_core::motion::Drivetrain;
use park_bot_core::task::control::Controller;

use crate::system::encoder::Encoders;
use crate::system::motor::DriveMotors;
use crate::system::resources::{BumperResources, MotorDriverResources};
use crate::system::sensor::ContactBumper;
use crate::system::state::{robot_config, STATE};

#[embassy_executor::task]
pub async fn control(motors: MotorDriverResources, bumper: BumperResources) {
    let drivetrain = Drivetrain::new(DriveMotors::new(motors), ContactBumper::new(bumper), Encoders);
    let mut controller = Controller::new(&STATE, drivetrain, Delay, robot_config());

    match controller.run().await {
        Ok(report) => info!(
            "parked in {} cm gap, outcomes {}",
            report.gap_length, report.outcomes
        ),
        Err(e) => error!("run failed: {}", e),
    }
}
