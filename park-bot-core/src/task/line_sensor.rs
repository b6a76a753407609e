//! Line Sensor Task
//!
//! Samples the reflectance sensor every few milliseconds and publishes the
//! tracking error: reading minus the tape/background midpoint. Negative means
//! the sensor sees more tape than floor.
//!
//! Stops on its own once the mode leaves line following / recovery.

use embedded_hal_async::delay::DelayNs;

use crate::config::LineConfig;
use crate::system::ports::{pause, LineSensor};
use crate::system::state::SharedState;

/// Signed deviation of `reflectance` from `midpoint`
pub fn tracking_error(reflectance: u8, midpoint: f32) -> f32 {
    f32::from(reflectance) - midpoint
}

pub async fn run<S, D>(state: &SharedState, sensor: &mut S, delay: &mut D, config: &LineConfig)
where
    S: LineSensor,
    D: DelayNs,
{
    let midpoint = config.midpoint();
    info!("line sensor started, midpoint {}", midpoint);

    while state.mode().is_sensing() {
        pause(delay, config.sample_period).await;

        let reflectance = sensor.read_reflectance().await;
        state.publish_tracking_error(tracking_error(reflectance, midpoint));
    }

    info!("line sensor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_reading_minus_midpoint() {
        assert_eq!(tracking_error(46, 46.0), 0.0);
        assert_eq!(tracking_error(34, 46.0), -12.0);
        assert_eq!(tracking_error(58, 46.0), 12.0);
    }
}
