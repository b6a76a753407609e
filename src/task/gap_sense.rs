//! Gap sensing task
//!
//! Binds the sideways ultrasonic sensor and the left wheel encoder to the
//! core's gap detection loop. Ends once a gap is confirmed or parking starts.

use embassy_time::Delay;
use park_bot_core::task::gap_sensor;

use crate::system::encoder::Encoders;
use crate::system::resources::GapSensorResources;
use crate::system::sensor::Ultrasonic;
use crate::system::state::{robot_config, STATE};

#[embassy_executor::task]
pub async fn gap_sense(r: GapSensorResources) {
    let config = robot_config();
    let mut sensor = Ultrasonic::new(r);
    gap_sensor::run(&STATE, &mut sensor, &Encoders, &mut Delay, &config.gap, &config.geometry).await;
}
