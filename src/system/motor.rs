//! Drive Motors
//!
//! TB6612FNG dual H-bridge, motor A on the left wheel and motor B on the right.
//! Speeds are percent of full PWM duty, the sign picks the direction. Zero
//! brakes the motor (both inputs high) so motion commands end close to their
//! tick target instead of coasting past it.

use defmt::warn;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{self, Pwm, PwmOutput};
use park_bot_core::system::ports::{Motors, Wheel};
use tb6612fng::{DriveCommand, Motor};

use crate::system::resources::MotorDriverResources;

/// 10kHz suits the cheap DC gear motors
const PWM_FREQUENCY_HZ: u32 = 10_000;

type DriverMotor = Motor<Output<'static>, Output<'static>, PwmOutput<'static>>;

pub struct DriveMotors {
    left: DriverMotor,
    right: DriverMotor,
    standby: Output<'static>,
}

fn pwm_config() -> pwm::Config {
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq(); // 150MHz

    // Calculate minimum divider needed to keep period under 16-bit limit (65535)
    let divider = ((clock_freq_hz / PWM_FREQUENCY_HZ) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (PWM_FREQUENCY_HZ * divider as u32)) as u16 - 1;

    let mut config = pwm::Config::default();
    config.divider = divider.into();
    config.top = period;
    config
}

fn drive_command(speed: i8) -> DriveCommand {
    let duty = speed.unsigned_abs().min(100);
    match speed {
        s if s > 0 => DriveCommand::Forward(duty),
        s if s < 0 => DriveCommand::Backward(duty),
        _ => DriveCommand::Brake,
    }
}

impl DriveMotors {
    /// Configures the driver and takes it out of standby
    ///
    /// # Panics
    /// If the PWM channels cannot be split off their slices or the driver
    /// rejects its pins; both are wiring errors that leave nothing to run.
    pub fn new(r: MotorDriverResources) -> Self {
        let config = pwm_config();

        let (left_pwm, _) = Pwm::new_output_a(r.left_slice, r.left_pwm_pin, config.clone()).split();
        let left_pwm = left_pwm.expect("left motor PWM channel A not configured");
        let left = Motor::new(
            Output::new(r.left_forward_pin, Level::Low),
            Output::new(r.left_backward_pin, Level::Low),
            left_pwm,
        )
        .expect("left motor pins rejected");

        let (_, right_pwm) = Pwm::new_output_b(r.right_slice, r.right_pwm_pin, config).split();
        let right_pwm = right_pwm.expect("right motor PWM channel B not configured");
        let right = Motor::new(
            Output::new(r.right_forward_pin, Level::Low),
            Output::new(r.right_backward_pin, Level::Low),
            right_pwm,
        )
        .expect("right motor pins rejected");

        let mut motors = Self {
            left,
            right,
            standby: Output::new(r.standby_pin, Level::Low),
        };
        motors.stop();
        motors.standby.set_high();
        motors
    }
}

impl Motors for DriveMotors {
    fn set_speed(&mut self, wheel: Wheel, speed: i8) {
        let motor = match wheel {
            Wheel::Left => &mut self.left,
            Wheel::Right => &mut self.right,
        };
        if motor.drive(drive_command(speed)).is_err() {
            warn!("{} motor rejected speed {}", wheel, speed);
        }
    }
}
