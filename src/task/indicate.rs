//! Status LED Indicator
//!
//! Drains the run events, logs them and shows them on the RGB LED:
//! - Line lost: red blinks, then off
//! - Line reacquired: green blinks, then off
//! - Gap confirmed / parking started: amber
//! - Parked: solid green
//! - Aborted: solid red

use defmt::info;
use embassy_rp::pwm::{self, Pwm, PwmOutput, SetDutyCycle};
use embassy_time::{Duration, Timer};
use park_bot_core::system::event::Event;

use crate::system::resources::RGBLedResources;
use crate::system::state::STATE;

/// Interval for LED blinking when signalling a line event
const BLINK_INTERVAL: Duration = Duration::from_millis(60);

/// Number of on/off cycles per blink signal
const BLINK_COUNT: usize = 3;

struct Led {
    red: PwmOutput<'static>,
    green: PwmOutput<'static>,
}

impl Led {
    /// Red and green duty in percent
    fn set(&mut self, red: u8, green: u8) {
        let _ = self.red.set_duty_cycle_percent(red);
        let _ = self.green.set_duty_cycle_percent(green);
    }

    fn off(&mut self) {
        self.set(0, 0);
    }

    async fn blink(&mut self, red: u8, green: u8) {
        for _ in 0..BLINK_COUNT {
            self.set(red, green);
            Timer::after(BLINK_INTERVAL).await;
            self.off();
            Timer::after(BLINK_INTERVAL).await;
        }
    }
}

#[embassy_executor::task]
pub async fn indicate(r: RGBLedResources) {
    // configure pwm for rgb led, 100Hz
    let desired_freq_hz = 100;
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq(); // 150MHz

    // Calculate minimum divider needed to keep period under 16-bit limit (65535)
    let divider = ((clock_freq_hz / desired_freq_hz) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (desired_freq_hz * divider as u32)) as u16 - 1;

    let mut config = pwm::Config::default();
    config.divider = divider.into();
    config.top = period;

    let (red, _) = Pwm::new_output_a(r.pwm_red, r.red_pin, config.clone()).split();
    let (green, _) = Pwm::new_output_a(r.pwm_green, r.green_pin, config).split();
    let mut led = Led {
        red: red.expect("red LED PWM channel A not configured"),
        green: green.expect("green LED PWM channel A not configured"),
    };
    led.off();

    loop {
        let event = STATE.next_event().await;
        info!("event: {}", event);

        match event {
            Event::LineLost => led.blink(100, 0).await,
            Event::LineReacquired => led.blink(0, 100).await,
            Event::GapConfirmed { .. } | Event::ParkingStarted { .. } => led.set(100, 40),
            Event::ParkingComplete => led.set(0, 100),
            Event::ParkingAborted(_) => led.set(100, 0),
        }
    }
}
