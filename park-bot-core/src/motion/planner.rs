//! Parallel Parking Planner
//!
//! Plans the maneuver from turning-circle geometry. The robot's current
//! turning circle and the circle it must end on inside the slot are two
//! circles of the vehicle's turning radius R. Backing along the first circle
//! and then the second (mirrored) one puts the robot into the slot, provided
//! the circles touch: their centres must be exactly 2R - T apart, T being the
//! track width.
//!
//! # Geometry
//! ```text
//! current centre  x = R - T/2                 y = 0
//! parked centre   x = dx - R + T/2            y = dy
//! circle dx       = dx - 2R + T
//! needed y        = sqrt((2R - T)^2 - circle_dx^2)
//! creep           = 2 * (needed_y - dy)
//! angle           = atan((dy + needed_y) / circle_dx)
//! ```
//! `dx` is half the measured gap length and `dy` the lateral offset between the
//! circles. The creep moves the robot forward until the circles touch, then two
//! reverse arcs of `R * |angle|` swing it in and straighten it out.
//!
//! # Feasibility
//! A gap shorter than `2R - T` is too small to park in. When `|circle_dx|`
//! exceeds `2R - T` the circles cannot touch and the square root has a
//! negative radicand. Both are reported as [`ParkError::GapInfeasible`], never
//! as NaN motion commands.

use libm::{atanf, sqrtf};

use crate::config::{ManeuverConfig, ParkingGeometry};
use crate::error::ParkError;
use crate::motion::drive::MotionCommand;

/// The three motion commands of a parking maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParkingPlan {
    /// Straight travel that aligns the turning circles
    pub creep: MotionCommand,
    /// Reverse arc into the slot
    pub entry_arc: MotionCommand,
    /// Mirrored reverse arc that straightens the robot
    pub straighten_arc: MotionCommand,
    /// Angle swept by each arc in radians
    pub sweep: f32,
}

impl ParkingPlan {
    /// Commands in execution order
    pub fn commands(&self) -> [MotionCommand; 3] {
        [self.creep, self.entry_arc, self.straighten_arc]
    }
}

/// Angle of the tangent between two circles whose centres are offset by (`dx`, `dy`)
pub fn get_angle_between_circles(dx: f32, dy: f32) -> f32 {
    atanf(dy / dx)
}

/// Shortest gap the robot can park in: turning diameter less track width
pub fn min_gap_length(geometry: &ParkingGeometry) -> f32 {
    2.0 * geometry.turning_radius - geometry.track_width
}

/// Vertical centre offset at which circles `circle_dx` apart horizontally touch
///
/// `None` when they are too far apart horizontally to ever touch.
pub fn needed_park_y(circle_dx: f32, geometry: &ParkingGeometry) -> Option<f32> {
    let centre_distance = 2.0 * geometry.turning_radius - geometry.track_width;
    let radicand = centre_distance * centre_distance - circle_dx * circle_dx;
    if radicand < 0.0 || !radicand.is_finite() {
        return None;
    }
    Some(sqrtf(radicand))
}

/// Plans the parking maneuver for the confirmed `gap_length`
///
/// Pure: the same inputs always produce the same plan.
pub fn plan(gap_length: f32, geometry: &ParkingGeometry, maneuver: &ManeuverConfig) -> Result<ParkingPlan, ParkError> {
    let infeasible = ParkError::GapInfeasible { gap_length };
    if !gap_length.is_finite() {
        return Err(infeasible);
    }
    if gap_length < min_gap_length(geometry) {
        warn!("gap {} shorter than {}, too small to park", gap_length, min_gap_length(geometry));
        return Err(infeasible);
    }

    let radius = geometry.turning_radius;
    let dx = gap_length / 2.0;
    let dy = maneuver.lateral_offset(geometry);

    let current_centre_x = radius - geometry.track_width / 2.0;
    let parked_centre_x = dx - radius + geometry.track_width / 2.0;
    let circle_dx = parked_centre_x - current_centre_x;

    let needed_y = needed_park_y(circle_dx, geometry).ok_or(infeasible)?;
    let angle = get_angle_between_circles(circle_dx, dy + needed_y);
    if !angle.is_finite() {
        return Err(infeasible);
    }
    let sweep = angle.abs();
    let arc_length = radius * sweep;

    let plan = ParkingPlan {
        creep: MotionCommand::straight(2.0 * (needed_y - dy), maneuver.creep_speed),
        entry_arc: MotionCommand::new(
            -arc_length,
            -maneuver.arc_outer_speed,
            -maneuver.arc_inner_speed,
        ),
        straighten_arc: MotionCommand::new(
            -(arc_length + maneuver.overshoot_margin),
            -maneuver.arc_inner_speed,
            -maneuver.arc_outer_speed,
        ),
        sweep,
    };

    if plan.commands().iter().any(|command| !command.distance.is_finite()) {
        return Err(infeasible);
    }

    debug!(
        "plan for gap {}: circle dx {}, needed y {}, sweep {}",
        gap_length, circle_dx, needed_y, sweep
    );
    Ok(plan)
}
