//! Tuning and vehicle configuration
//!
//! All constants the robot runs on, grouped by the task that consumes them.
//! Every struct is `Copy` so each task can own its slice of the configuration.
//!
//! # Units
//! - Lengths are centimetres
//! - Encoder ticks are degrees of wheel rotation (360 per revolution)
//! - Speeds are signed motor duty percentages (-100 to 100)
//! - Reflectance is a percentage (0-100)

use embassy_time::Duration;

/// Reflectance sampling and line reference
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineConfig {
    /// Reading over the taped line
    pub tape_reflectance: u8,
    /// Reading over the floor next to the line
    pub background_reflectance: u8,
    /// Manual shift of the midpoint, for lighting that skews one side
    pub offset_tweak: f32,
    /// Time between reflectance samples (about the fastest the sensor settles)
    pub sample_period: Duration,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            tape_reflectance: 34,
            background_reflectance: 58,
            offset_tweak: 0.0,
            sample_period: Duration::from_millis(3),
        }
    }
}

impl LineConfig {
    /// Reflectance the robot steers towards: halfway between tape and background
    pub fn midpoint(&self) -> f32 {
        (f32::from(self.tape_reflectance) + f32::from(self.background_reflectance)) / 2.0 + self.offset_tweak
    }
}

/// PID gains and integral clamp
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Symmetric bound of the integral accumulator
    pub integral_limit: f32,
}

impl PidGains {
    /// Classic Ziegler–Nichols PID tuning from a measured oscillation
    ///
    /// - `critical_gain`: proportional-only gain at which the robot oscillates steadily (Kc)
    /// - `oscillation_period`: period of that oscillation in seconds (Pc)
    /// - `loop_period`: control loop period in seconds (dT)
    ///
    /// ```text
    /// Kp = 0.6 * Kc
    /// Ki = 2 * Kp * dT / Pc * 0.5
    /// Kd = Kp * Pc / (8 * dT)
    /// ```
    ///
    /// Ki and Kd are expressed per control cycle rather than per second,
    /// which is why dT appears in both.
    pub fn ziegler_nichols(critical_gain: f32, oscillation_period: f32, loop_period: f32, integral_limit: f32) -> Self {
        let kp = 0.6 * critical_gain;
        Self {
            kp,
            ki: 0.5 * 2.0 * kp * loop_period / oscillation_period,
            kd: kp * oscillation_period / (8.0 * loop_period),
            integral_limit,
        }
    }
}

impl Default for PidGains {
    /// Kc = 2.5, Pc = 0.5 s, dT = 2 ms, giving Kp = 1.5, Ki = 0.006, Kd = 46.875
    fn default() -> Self {
        Self::ziegler_nichols(2.5, 0.5, 0.002, 5500.0)
    }
}

/// Line following drive parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FollowConfig {
    /// Wheel speed with zero correction
    pub base_speed: i8,
    /// Lowest wheel speed while following; 0 keeps both wheels rolling forward
    pub min_speed: i8,
    /// Highest wheel speed while following
    pub max_speed: i8,
    /// Time between control cycles
    pub control_period: Duration,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            base_speed: 80,
            min_speed: 0,
            max_speed: 100,
            control_period: Duration::from_millis(2),
        }
    }
}

/// Line re-acquisition maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecoveryConfig {
    /// Standstill before the counter-rotation starts
    pub settle: Duration,
    /// Magnitude of the opposite wheel speeds while turning around
    pub turn_speed: i8,
    /// Tracking error above which the line counts as found again
    pub reacquire_threshold: f32,
    /// Time between tracking error checks
    pub poll_period: Duration,
    /// Give up after this long; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            turn_speed: 40,
            reacquire_threshold: -5.0,
            poll_period: Duration::from_millis(2),
            timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Parking gap detection
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GapConfig {
    /// Time between distance samples (ultrasonic ranging is slow)
    pub sample_period: Duration,
    /// Distance increase over the baseline that opens a gap; track width when `None`
    pub excess_threshold: Option<f32>,
    /// Travel inside the gap needed to confirm it; wheelbase when `None`
    pub confirm_travel: Option<f32>,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(15),
            excess_threshold: None,
            confirm_travel: None,
        }
    }
}

impl GapConfig {
    pub fn excess_threshold(&self, geometry: &ParkingGeometry) -> f32 {
        self.excess_threshold.unwrap_or(geometry.track_width)
    }

    pub fn confirm_travel(&self, geometry: &ParkingGeometry) -> f32 {
        self.confirm_travel.unwrap_or(geometry.wheelbase)
    }
}

/// Fixed vehicle dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParkingGeometry {
    /// Distance between the wheel centres across the axle (4.625 in)
    pub track_width: f32,
    /// Distance between the axles (7.25 in)
    pub wheelbase: f32,
    pub wheel_diameter: f32,
    /// Radius traced under a full differential turn command (6 in)
    pub turning_radius: f32,
}

impl Default for ParkingGeometry {
    fn default() -> Self {
        Self {
            track_width: 11.7475,
            wheelbase: 18.415,
            wheel_diameter: 5.5,
            turning_radius: 15.24,
        }
    }
}

impl ParkingGeometry {
    /// Distance travelled per wheel revolution
    pub fn wheel_circumference(&self) -> f32 {
        core::f32::consts::PI * self.wheel_diameter
    }
}

/// Speeds and margins of the parking maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ManeuverConfig {
    /// Lateral offset between the current and the parked turning circle; track width when `None`
    pub lateral_offset: Option<f32>,
    pub creep_speed: i8,
    /// Faster wheel during the reverse arcs
    pub arc_outer_speed: i8,
    /// Slower wheel during the reverse arcs
    pub arc_inner_speed: i8,
    /// Extra travel on the straightening arc
    pub overshoot_margin: f32,
}

impl Default for ManeuverConfig {
    fn default() -> Self {
        Self {
            lateral_offset: None,
            creep_speed: 50,
            arc_outer_speed: 60,
            arc_inner_speed: 20,
            overshoot_margin: 2.0,
        }
    }
}

impl ManeuverConfig {
    pub fn lateral_offset(&self, geometry: &ParkingGeometry) -> f32 {
        self.lateral_offset.unwrap_or(geometry.track_width)
    }
}

/// Drive primitive polling
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveConfig {
    /// Time between bumper/encoder checks
    pub poll_period: Duration,
    /// Longest a single motion command may run before it counts as stalled
    pub timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Complete robot configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RobotConfig {
    pub line: LineConfig,
    pub pid: PidGains,
    pub follow: FollowConfig,
    pub recovery: RecoveryConfig,
    pub gap: GapConfig,
    pub geometry: ParkingGeometry,
    pub maneuver: ManeuverConfig,
    pub drive: DriveConfig,
}
