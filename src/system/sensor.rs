//! Sensors
//!
//! Hardware side of the core's sensor contracts.
//!
//! # Reflectance
//! Analog phototransistor on ADC0. The 12-bit conversion is scaled to percent;
//! a failed conversion repeats the last good reading.
//!
//! # Ultrasonic
//! HC-SR04 facing sideways, driven by the async HC-SR04 driver in
//! centimetres at a fixed 21.5°C. Failed measurements come back as `None`.
//! Readings go through a 3-sample moving median to knock out single spurious
//! echoes.
//!
//! # Bumper
//! Contact switch to ground with the internal pull-up.

use defmt::{debug, warn};
use embassy_rp::adc::Channel;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use hcsr04_async::{Config, DistanceUnit, Hcsr04, TemperatureUnit};
use moving_median::MovingMedian;
use park_bot_core::system::ports::{Bumper, DistanceSensor, LineSensor};

use crate::system::resources::{get_adc, BumperResources, GapSensorResources, LineSensorResources};

/// Full scale of the 12-bit ADC
const ADC_FULL_SCALE: u32 = 4095;

/// Size of median filter window
const MEDIAN_WINDOW_SIZE: usize = 3;

/// Fixed ambient temperature in degrees Celsius for the speed of sound
const TEMPERATURE: f64 = 21.5;

pub struct Reflectance {
    channel: Channel<'static>,
    last: u8,
}

impl Reflectance {
    pub fn new(r: LineSensorResources) -> Self {
        Self {
            channel: Channel::new_pin(r.adc_pin, Pull::None),
            last: 0,
        }
    }
}

impl LineSensor for Reflectance {
    async fn read_reflectance(&mut self) -> u8 {
        let mut adc = get_adc().lock().await;
        let Some(adc) = adc.as_mut() else {
            warn!("ADC not initialized");
            return self.last;
        };
        match adc.read(&mut self.channel).await {
            Ok(raw) => self.last = (u32::from(raw).min(ADC_FULL_SCALE) * 100 / ADC_FULL_SCALE) as u8,
            Err(_) => warn!("reflectance conversion failed"),
        }
        self.last
    }
}

pub struct Ultrasonic {
    sensor: Hcsr04<Output<'static>, Input<'static>>,
    filter: MovingMedian<f64, MEDIAN_WINDOW_SIZE>,
}

impl Ultrasonic {
    pub fn new(r: GapSensorResources) -> Self {
        let config = Config {
            distance_unit: DistanceUnit::Centimeters,
            temperature_unit: TemperatureUnit::Celsius,
        };
        let trigger = Output::new(r.trigger_pin, Level::Low);
        let echo = Input::new(r.echo_pin, Pull::None);
        Self {
            sensor: Hcsr04::new(trigger, echo, config),
            filter: MovingMedian::new(),
        }
    }
}

impl DistanceSensor for Ultrasonic {
    async fn read_distance(&mut self) -> Option<f32> {
        match self.sensor.measure(TEMPERATURE).await {
            Ok(distance_cm) => {
                self.filter.add_value(distance_cm);
                Some(self.filter.median() as f32)
            }
            Err(e) => {
                debug!("no echo: {}", e);
                None
            }
        }
    }
}

pub struct ContactBumper {
    pin: Input<'static>,
}

impl ContactBumper {
    pub fn new(r: BumperResources) -> Self {
        Self {
            pin: Input::new(r.pin, Pull::Up),
        }
    }
}

impl Bumper for ContactBumper {
    fn is_pressed(&mut self) -> bool {
        self.pin.is_low()
    }
}
