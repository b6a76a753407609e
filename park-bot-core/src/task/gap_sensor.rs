//! Gap Sensor Task
//!
//! Looks sideways for a parking slot between obstacles.
//!
//! # Detection
//! - The first reading sets the baseline distance to the obstacle row
//! - While readings stay within the excess threshold, the baseline follows them
//! - A reading beyond baseline + threshold opens a gap window and snapshots
//!   the left wheel encoder
//! - Once the robot has travelled the confirmation distance inside the window
//!   (a full wheelbase by default), the gap is confirmed
//! - If the window closes before that, it was noise or a slot too short: the
//!   baseline moves to the current reading and the search continues
//!
//! While the robot recovers the line it turns in place and the sonar sweeps off
//! the obstacle row, so those readings only clear the baseline. Detection
//! starts over from the first reading after recovery.
//!
//! Failed pings are skipped. The task ends after confirming a gap, or when the
//! mode leaves line following / recovery.

use embedded_hal_async::delay::DelayNs;

use crate::config::{GapConfig, ParkingGeometry};
use crate::motion::drive::ticks_for_distance;
use crate::system::event::Event;
use crate::system::ports::{pause, DistanceSensor, Wheel, WheelEncoders};
use crate::system::state::{Mode, SharedState};

/// Result of feeding one reading to the [`GapDetector`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapUpdate {
    /// First reading after start or reset, now the baseline
    Baseline(f32),
    /// Reading close to the baseline
    Clear,
    /// Inside a gap window, `travel` ticks covered so far
    Excess { travel: i32 },
    /// A gap window closed too early
    Rejected { travel: i32 },
    /// A gap window stayed open for the full confirmation travel
    Confirmed { clear_distance: f32 },
}

/// Baseline tracking and gap confirmation
#[derive(Debug, Clone)]
pub struct GapDetector {
    excess_threshold: f32,
    confirm_ticks: i32,
    baseline: Option<f32>,
    window_start: Option<i32>,
    last_travel: i32,
}

impl GapDetector {
    pub fn new(config: &GapConfig, geometry: &ParkingGeometry) -> Self {
        Self::with_thresholds(
            config.excess_threshold(geometry),
            ticks_for_distance(config.confirm_travel(geometry), geometry),
        )
    }

    pub fn with_thresholds(excess_threshold: f32, confirm_ticks: i32) -> Self {
        Self {
            excess_threshold,
            confirm_ticks,
            baseline: None,
            window_start: None,
            last_travel: 0,
        }
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }

    pub fn confirm_ticks(&self) -> i32 {
        self.confirm_ticks
    }

    /// Forgets the baseline, the next reading seeds a new one
    pub fn reset_baseline(&mut self) {
        self.baseline = None;
        self.window_start = None;
        self.last_travel = 0;
    }

    /// Feeds a distance reading taken with the encoder at `ticks`
    pub fn update(&mut self, distance: f32, ticks: i32) -> GapUpdate {
        let Some(baseline) = self.baseline else {
            self.baseline = Some(distance);
            return GapUpdate::Baseline(distance);
        };

        if distance > baseline + self.excess_threshold {
            let start = *self.window_start.get_or_insert(ticks);
            let travel = (ticks - start).abs();
            self.last_travel = travel;
            if travel >= self.confirm_ticks {
                GapUpdate::Confirmed {
                    clear_distance: baseline,
                }
            } else {
                GapUpdate::Excess { travel }
            }
        } else {
            self.baseline = Some(distance);
            match self.window_start.take() {
                Some(_) => GapUpdate::Rejected {
                    travel: core::mem::take(&mut self.last_travel),
                },
                None => GapUpdate::Clear,
            }
        }
    }
}

pub async fn run<S, E, D>(
    state: &SharedState,
    sensor: &mut S,
    encoders: &E,
    delay: &mut D,
    config: &GapConfig,
    geometry: &ParkingGeometry,
) where
    S: DistanceSensor,
    E: WheelEncoders,
    D: DelayNs,
{
    let mut detector = GapDetector::new(config, geometry);
    info!("gap sensor started, confirming after {} ticks", detector.confirm_ticks());

    while state.mode().is_sensing() {
        pause(delay, config.sample_period).await;

        if state.take_baseline_reset() {
            debug!("gap baseline cleared");
            detector.reset_baseline();
        }

        let Some(distance) = sensor.read_distance().await else {
            debug!("distance reading failed, skipping");
            continue;
        };

        if state.mode() == Mode::Recovering {
            detector.reset_baseline();
            state.publish_gap_reading(None, distance);
            continue;
        }

        match detector.update(distance, encoders.ticks(Wheel::Left)) {
            GapUpdate::Confirmed { clear_distance } => {
                info!("gap confirmed next to obstacles at {} cm", clear_distance);
                state.confirm_gap(clear_distance, distance);
                state.notify(Event::GapConfirmed { clear_distance });
                break;
            }
            GapUpdate::Baseline(baseline) => debug!("gap baseline {} cm", baseline),
            GapUpdate::Rejected { travel } => debug!("gap closed after {} ticks, rejected", travel),
            GapUpdate::Clear | GapUpdate::Excess { .. } => {}
        }

        state.publish_gap_reading(detector.baseline(), distance);
    }

    info!("gap sensor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reading_is_baseline() {
        let mut detector = GapDetector::with_thresholds(10.0, 100);
        assert_eq!(detector.update(20.0, 0), GapUpdate::Baseline(20.0));
        assert_eq!(detector.baseline(), Some(20.0));
    }

    #[test]
    fn baseline_follows_readings_outside_gaps() {
        let mut detector = GapDetector::with_thresholds(10.0, 100);
        detector.update(20.0, 0);
        assert_eq!(detector.update(24.0, 5), GapUpdate::Clear);
        assert_eq!(detector.update(29.0, 10), GapUpdate::Clear);
        assert_eq!(detector.baseline(), Some(29.0));
    }

    #[test]
    fn threshold_must_be_exceeded() {
        let mut detector = GapDetector::with_thresholds(10.0, 100);
        detector.update(20.0, 0);
        assert_eq!(detector.update(30.0, 10), GapUpdate::Clear);
        assert_eq!(detector.update(40.5, 20), GapUpdate::Excess { travel: 0 });
    }

    #[test]
    fn confirms_after_full_travel_and_not_before() {
        let mut detector = GapDetector::with_thresholds(10.0, 100);
        detector.update(20.0, 0);
        assert_eq!(detector.update(45.0, 50), GapUpdate::Excess { travel: 0 });
        assert_eq!(detector.update(45.0, 120), GapUpdate::Excess { travel: 70 });
        assert_eq!(detector.update(45.0, 149), GapUpdate::Excess { travel: 99 });
        assert_eq!(
            detector.update(45.0, 150),
            GapUpdate::Confirmed { clear_distance: 20.0 }
        );
    }

    #[test]
    fn short_gap_is_rejected_and_rebaselined() {
        let mut detector = GapDetector::with_thresholds(10.0, 100);
        detector.update(20.0, 0);
        detector.update(45.0, 10);
        detector.update(45.0, 60);
        assert_eq!(detector.update(22.0, 80), GapUpdate::Rejected { travel: 50 });
        assert_eq!(detector.baseline(), Some(22.0));

        // A new window starts counting from scratch
        assert_eq!(detector.update(45.0, 90), GapUpdate::Excess { travel: 0 });
        assert_eq!(detector.update(45.0, 189), GapUpdate::Excess { travel: 99 });
    }

    #[test]
    fn travel_counts_reverse_rotation() {
        let mut detector = GapDetector::with_thresholds(10.0, 100);
        detector.update(20.0, 0);
        detector.update(45.0, -10);
        assert_eq!(
            detector.update(45.0, -110),
            GapUpdate::Confirmed { clear_distance: 20.0 }
        );
    }

    #[test]
    fn reset_reseeds_from_next_reading() {
        let mut detector = GapDetector::with_thresholds(10.0, 100);
        detector.update(20.0, 0);
        detector.update(45.0, 10);
        detector.reset_baseline();
        assert_eq!(detector.baseline(), None);
        assert_eq!(detector.update(45.0, 20), GapUpdate::Baseline(45.0));
        assert_eq!(detector.update(46.0, 200), GapUpdate::Clear);
    }

    #[test]
    fn default_confirmation_is_one_wheelbase() {
        let geometry = ParkingGeometry::default();
        let detector = GapDetector::new(&GapConfig::default(), &geometry);
        assert_eq!(detector.confirm_ticks(), ticks_for_distance(geometry.wheelbase, &geometry));
        assert_eq!(detector.confirm_ticks(), 383);
    }
}
