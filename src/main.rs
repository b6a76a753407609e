//! Park-bot firmware entry point
//!
//! Initializes the hardware and starts the run: gap sensing first, line
//! sensing a second later, the control loop a second after that, so both
//! sensors have settled before the robot moves.

#![no_std]
#![no_main]

use crate::task::{control::control, gap_sense::gap_sense, indicate::indicate, line_sense::line_sense};
use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_time::{Duration, Timer};
use system::encoder;
use system::resources::{
    self, AssignedResources, BumperResources, GapSensorResources, LineSensorResources, MotorDriverResources,
    MotorEncoderResources, RGBLedResources,
};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Hardware bindings and run state
mod system;
/// Task implementations
mod task;

/// Time each sensor gets to settle before the next stage starts
const STARTUP_STAGE_DELAY: Duration = Duration::from_secs(1);

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // The ADC must exist before the line sensor task first reads it
    resources::init_adc(p.ADC);

    let r = split_resources!(p);

    // Counters must be running before the gap task reads travel from them
    encoder::init(r.motor_encoders);

    spawner.spawn(indicate(r.rgb_led)).unwrap();

    info!("starting gap sensing");
    spawner.spawn(gap_sense(r.gap_sensor)).unwrap();
    Timer::after(STARTUP_STAGE_DELAY).await;

    info!("starting line sensing");
    spawner.spawn(line_sense(r.line_sensor)).unwrap();
    Timer::after(STARTUP_STAGE_DELAY).await;

    info!("starting control");
    spawner.spawn(control(r.motor_driver, r.bumper)).unwrap();
}
