//! Collaborator Contracts
//!
//! The core never touches a pin. Sensors, encoders and motors are reached
//! through these traits, implemented by the firmware for real hardware and by
//! the simulated robot in the tests.
//!
//! # Sharing
//! Each task owns its sensor exclusively, except the wheel encoders: the gap
//! task reads them while sensing and the drive primitive resets and reads them
//! while parking. [`WheelEncoders`] therefore works through `&self`.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

/// Wheel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wheel {
    Left,
    Right,
}

/// Downward reflectance sensor over the line
#[allow(async_fn_in_trait)]
pub trait LineSensor {
    /// Reflected light as a percentage (0-100)
    async fn read_reflectance(&mut self) -> u8;
}

/// Sideways distance sensor facing the parked obstacles
#[allow(async_fn_in_trait)]
pub trait DistanceSensor {
    /// Distance to the nearest obstacle in centimetres, `None` if the ping failed
    async fn read_distance(&mut self) -> Option<f32>;
}

/// Front/rear contact switch
pub trait Bumper {
    fn is_pressed(&mut self) -> bool;
}

/// Resettable wheel rotation counters
pub trait WheelEncoders {
    /// Rotation since the last reset in degrees
    fn ticks(&self, wheel: Wheel) -> i32;

    fn reset(&self, wheel: Wheel);

    fn reset_both(&self) {
        self.reset(Wheel::Left);
        self.reset(Wheel::Right);
    }
}

/// Differential drive motors
pub trait Motors {
    /// Signed speed, -100 (full reverse) to 100 (full forward)
    fn set_speed(&mut self, wheel: Wheel, speed: i8);

    fn set_speeds(&mut self, left: i8, right: i8) {
        self.set_speed(Wheel::Left, left);
        self.set_speed(Wheel::Right, right);
    }

    fn stop(&mut self) {
        self.set_speeds(0, 0);
    }
}

impl<T: WheelEncoders> WheelEncoders for &T {
    fn ticks(&self, wheel: Wheel) -> i32 {
        T::ticks(self, wheel)
    }

    fn reset(&self, wheel: Wheel) {
        T::reset(self, wheel)
    }
}

/// Sleeps for `period`, yielding to the other tasks
pub async fn pause<D: DelayNs>(delay: &mut D, period: Duration) {
    delay.delay_us(period.as_micros() as u32).await;
}

/// Number of `poll_period` sleeps that fit into `timeout`, at least one
pub fn poll_budget(timeout: Duration, poll_period: Duration) -> u32 {
    let poll = poll_period.as_micros().max(1);
    (timeout.as_micros() / poll).max(1) as u32
}
