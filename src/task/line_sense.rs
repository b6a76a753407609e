//! Line sensing task
//!
//! Binds the reflectance sensor to the core's line sensor loop. Ends on its
//! own once parking starts.

use embassy_time::Delay;
use park_bot_core::task::line_sensor;

use crate::system::resources::LineSensorResources;
use crate::system::sensor::Reflectance;
use crate::system::state::{robot_config, STATE};

#[embassy_executor::task]
pub async fn line_sense(r: LineSensorResources) {
    let config = robot_config();
    let mut sensor = Reflectance::new(r);
    line_sensor::run(&STATE, &mut sensor, &mut Delay, &config.line).await;
}
