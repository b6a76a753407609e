//! Hardware Resource Management
//!
//! Allocates the RP2350 pins and peripherals to the robot's components.
//!
//! # Resource Groups
//! - Line Sensor: analog reflectance sensor under the front of the robot
//! - Gap Sensor: HC-SR04 ultrasonic sensor facing sideways
//! - Bumper: contact switch on the rear
//! - Motor Control: TB6612FNG driver pins and PWM channels
//! - Motor Encoders: PWM input slices counting wheel encoder pulses
//! - RGB LED: PWM-controlled status LED
//!
//! # Shared Resources
//! The ADC is created once in main.rs and kept behind a mutex, tasks lock it
//! for the duration of a single conversion.

use assign_resources::assign_resources;
use embassy_rp::adc::InterruptHandler as AdcInterruptHandler;
use embassy_rp::adc::{Adc, Async as AdcAsync};
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, ADC};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/// Global ADC instance, `None` until [`init_adc`] ran
static ADC: Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> = Mutex::new(None);

/// Initializes the ADC peripheral.
///
/// Called once from main.rs before any task is spawned.
pub fn init_adc(adc: ADC) {
    let adc = Adc::new(adc, Irqs, embassy_rp::adc::Config::default());
    if let Ok(mut slot) = ADC.try_lock() {
        *slot = Some(adc);
    }
}

pub fn get_adc() -> &'static Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> {
    &ADC
}

assign_resources! {
    /// Reflectance sensor on ADC0
    line_sensor: LineSensorResources {
        adc_pin: PIN_26,
    },
    /// HC-SR04 ultrasonic distance sensor pins
    gap_sensor: GapSensorResources {
        trigger_pin: PIN_15,
        echo_pin: PIN_14,
    },
    /// Contact switch, pulled up, closes to ground
    bumper: BumperResources {
        pin: PIN_16,
    },
    /// TB6612FNG dual motor driver pins and PWM channels
    motor_driver: MotorDriverResources {
        standby_pin: PIN_22,
        // Motor A, left wheel
        left_slice: PWM_SLICE6,
        left_pwm_pin: PIN_28,
        left_forward_pin: PIN_21,
        left_backward_pin: PIN_20,
        // Motor B, right wheel
        right_slice: PWM_SLICE5,
        right_pwm_pin: PIN_27,
        right_forward_pin: PIN_19,
        right_backward_pin: PIN_18,
    },
    /// Motor encoder PWM input channels
    motor_encoders: MotorEncoderResources {
        left_encoder_slice: PWM_SLICE3,
        left_encoder_pin: PIN_7,
        right_encoder_slice: PWM_SLICE4,
        right_encoder_pin: PIN_9,
    },
    /// PWM-controlled RGB LED indicator pins
    rgb_led: RGBLedResources {
        pwm_red: PWM_SLICE1,
        pwm_green: PWM_SLICE2,
        red_pin: PIN_2,
        green_pin: PIN_4,
    },
}

bind_interrupts!(pub struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});
