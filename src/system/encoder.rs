//! Wheel Encoders
//!
//! Counts encoder pulses with the PWM slices in input mode and turns them into
//! wheel degrees for the core.
//!
//! # Hardware
//! - One Hall channel per motor, rising edges counted by the slice counter
//! - 8 pulses per motor revolution, 120:1 gear ratio: 960 pulses per wheel turn
//! - The 16-bit slice counter wraps; it is read often enough (every
//!   millisecond while driving) that a single wrap between reads is the most
//!   that can happen
//!
//! A single channel cannot sense direction, so ticks only ever grow. The core
//! only uses magnitudes.
//!
//! The counters are shared by the gap task and the control task, hence the
//! static behind a blocking mutex and the zero-sized [`Encoders`] handle.

use core::cell::RefCell;

use embassy_rp::gpio::Pull;
use embassy_rp::pwm::{Config, InputMode, Pwm};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use park_bot_core::system::ports::{Wheel, WheelEncoders};

use crate::system::resources::MotorEncoderResources;

/// Encoder pulses per motor revolution
const PULSES_PER_MOTOR_REV: i32 = 8;
/// Motor gear ratio
const GEAR_RATIO: i32 = 120;
/// Encoder pulses per wheel revolution
const PULSES_PER_WHEEL_REV: i32 = PULSES_PER_MOTOR_REV * GEAR_RATIO; // 960

static COUNTERS: Mutex<CriticalSectionRawMutex, RefCell<Option<Counters>>> = Mutex::new(RefCell::new(None));

struct Channel {
    pwm: Pwm<'static>,
    last_raw: u16,
    pulses: i32,
}

impl Channel {
    fn new(pwm: Pwm<'static>) -> Self {
        pwm.set_counter(0);
        Self {
            pwm,
            last_raw: 0,
            pulses: 0,
        }
    }

    /// Folds the hardware counter into the running pulse total
    fn update(&mut self) -> i32 {
        let raw = self.pwm.counter();
        self.pulses += i32::from(raw.wrapping_sub(self.last_raw));
        self.last_raw = raw;
        self.pulses
    }

    fn reset(&mut self) {
        self.update();
        self.pulses = 0;
    }
}

struct Counters {
    left: Channel,
    right: Channel,
}

impl Counters {
    fn channel(&mut self, wheel: Wheel) -> &mut Channel {
        match wheel {
            Wheel::Left => &mut self.left,
            Wheel::Right => &mut self.right,
        }
    }
}

/// Sets up both PWM slices as rising-edge counters
///
/// Called once from main.rs before the tasks start.
pub fn init(r: MotorEncoderResources) {
    let config = Config::default();
    let left = Pwm::new_input(
        r.left_encoder_slice,
        r.left_encoder_pin,
        Pull::None,
        InputMode::RisingEdge,
        config.clone(),
    );
    let right = Pwm::new_input(
        r.right_encoder_slice,
        r.right_encoder_pin,
        Pull::None,
        InputMode::RisingEdge,
        config,
    );

    COUNTERS.lock(|counters| {
        *counters.borrow_mut() = Some(Counters {
            left: Channel::new(left),
            right: Channel::new(right),
        });
    });
}

/// Wheel degrees for a pulse count
fn pulses_to_degrees(pulses: i32) -> i32 {
    pulses * 360 / PULSES_PER_WHEEL_REV
}

/// Handle to the shared encoder counters
#[derive(Clone, Copy)]
pub struct Encoders;

impl WheelEncoders for Encoders {
    fn ticks(&self, wheel: Wheel) -> i32 {
        COUNTERS.lock(|counters| {
            counters
                .borrow_mut()
                .as_mut()
                .map_or(0, |counters| pulses_to_degrees(counters.channel(wheel).update()))
        })
    }

    fn reset(&self, wheel: Wheel) {
        COUNTERS.lock(|counters| {
            if let Some(counters) = counters.borrow_mut().as_mut() {
                counters.channel(wheel).reset();
            }
        });
    }
}
