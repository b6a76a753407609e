//! Drive Motion Primitive
//!
//! Executes one motion command: reset the encoders, set both wheel speeds,
//! then poll until the bumper reports contact or the leading wheel has turned
//! past the tick target. Motors are stopped on every exit path.
//!
//! # Tick Target
//! ```text
//! ticks = |distance| / (PI * wheel_diameter) * 360
//! ```
//! The leading wheel is the one with the larger commanded speed magnitude; it
//! covers the full arc length while the inner wheel covers less.
//!
//! # Stall Guard
//! A stalled motor or a dead encoder would otherwise keep the poll loop
//! spinning forever. After [`DriveConfig::timeout`] the command fails with
//! [`ParkError::DriveTimeout`].

use embedded_hal_async::delay::DelayNs;

use crate::config::{DriveConfig, ParkingGeometry};
use crate::error::ParkError;
use crate::system::ports::{pause, poll_budget, Bumper, Motors, Wheel, WheelEncoders};

/// One timed arc or straight drive
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionCommand {
    /// Signed travel of the leading wheel in centimetres, negative is reverse
    pub distance: f32,
    pub left_speed: i8,
    pub right_speed: i8,
}

impl MotionCommand {
    pub const fn new(distance: f32, left_speed: i8, right_speed: i8) -> Self {
        Self {
            distance,
            left_speed,
            right_speed,
        }
    }

    /// Straight travel at `speed`, direction taken from the sign of `distance`
    pub fn straight(distance: f32, speed: i8) -> Self {
        let speed = if distance < 0.0 { -speed.saturating_abs() } else { speed.saturating_abs() };
        Self::new(distance, speed, speed)
    }

    /// Wheel whose encoder decides when the command is done, right on ties
    pub fn leading_wheel(&self) -> Wheel {
        if self.left_speed.unsigned_abs() > self.right_speed.unsigned_abs() {
            Wheel::Left
        } else {
            Wheel::Right
        }
    }

    /// Encoder degrees the leading wheel turns to cover `distance`
    pub fn tick_target(&self, geometry: &ParkingGeometry) -> i32 {
        ticks_for_distance(self.distance, geometry)
    }
}

/// Encoder degrees for a travel of `distance` centimetres
pub fn ticks_for_distance(distance: f32, geometry: &ParkingGeometry) -> i32 {
    (distance.abs() / geometry.wheel_circumference() * 360.0) as i32
}

/// Why a motion command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveOutcome {
    /// The leading wheel passed the tick target
    TargetReached { ticks: i32 },
    /// The bumper hit something before the target
    BumperContact { ticks: i32 },
}

/// Motors, bumper and encoders used to execute motion commands
pub struct Drivetrain<M, B, E> {
    pub motors: M,
    pub bumper: B,
    pub encoders: E,
}

impl<M, B, E> Drivetrain<M, B, E>
where
    M: Motors,
    B: Bumper,
    E: WheelEncoders,
{
    pub fn new(motors: M, bumper: B, encoders: E) -> Self {
        Self {
            motors,
            bumper,
            encoders,
        }
    }

    /// Runs `command` to completion
    pub async fn drive<D: DelayNs>(
        &mut self,
        command: &MotionCommand,
        geometry: &ParkingGeometry,
        config: &DriveConfig,
        delay: &mut D,
    ) -> Result<DriveOutcome, ParkError> {
        let target = command.tick_target(geometry);
        let wheel = command.leading_wheel();
        let budget = poll_budget(config.timeout, config.poll_period);

        info!(
            "drive {} cm at L:{} R:{}, {} ticks on {}",
            command.distance, command.left_speed, command.right_speed, target, wheel
        );

        self.encoders.reset_both();
        self.motors.set_speeds(command.left_speed, command.right_speed);

        let mut polls = 0;
        let result = loop {
            let ticks = self.encoders.ticks(wheel).abs();
            if self.bumper.is_pressed() {
                break Ok(DriveOutcome::BumperContact { ticks });
            }
            if ticks > target {
                break Ok(DriveOutcome::TargetReached { ticks });
            }
            if polls >= budget {
                break Err(ParkError::DriveTimeout {
                    target_ticks: target,
                    reached_ticks: ticks,
                });
            }
            polls += 1;
            pause(delay, config.poll_period).await;
        };

        self.motors.stop();

        match &result {
            Ok(outcome) => debug!("drive finished: {}", outcome),
            Err(e) => error!("drive failed: {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_circumference_is_360_ticks() {
        let geometry = ParkingGeometry::default();
        let circumference = geometry.wheel_circumference();
        assert_eq!(ticks_for_distance(circumference * 2.0, &geometry), 720);
        assert_eq!(ticks_for_distance(-circumference, &geometry), 360);
        assert_eq!(ticks_for_distance(0.0, &geometry), 0);
    }

    #[test]
    fn leading_wheel_has_larger_magnitude() {
        assert_eq!(MotionCommand::new(-10.0, -60, -20).leading_wheel(), Wheel::Left);
        assert_eq!(MotionCommand::new(-10.0, -20, -60).leading_wheel(), Wheel::Right);
        assert_eq!(MotionCommand::new(10.0, 50, 50).leading_wheel(), Wheel::Right);
        assert_eq!(MotionCommand::new(10.0, -70, 30).leading_wheel(), Wheel::Left);
    }

    #[test]
    fn straight_follows_distance_sign() {
        assert_eq!(MotionCommand::straight(12.0, 50), MotionCommand::new(12.0, 50, 50));
        assert_eq!(MotionCommand::straight(-12.0, 50), MotionCommand::new(-12.0, -50, -50));
        assert_eq!(MotionCommand::straight(-12.0, -50), MotionCommand::new(-12.0, -50, -50));
    }
}
