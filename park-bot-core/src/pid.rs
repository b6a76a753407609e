//! PID steering controller
//!
//! Turns the signed tracking error into a wheel speed offset. The integral
//! doubles as the line-lost detector: sustained drift to the negative side
//! (the robot has run off the end of the tape) drives the accumulator into its
//! lower clamp, which raises a one-shot signal for the control loop.

use crate::config::PidGains;

#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral: f32,
    previous_error: f32,
    line_lost: bool,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            previous_error: 0.0,
            line_lost: false,
        }
    }

    /// Steering correction for one control cycle
    ///
    /// Positive output speeds up the left wheel and slows the right one.
    pub fn compute(&mut self, error: f32) -> f32 {
        let limit = self.gains.integral_limit;

        let proportional = self.gains.kp * error;

        let was_at_floor = self.integral <= -limit;
        self.integral = (self.integral + error).clamp(-limit, limit);
        if !was_at_floor && self.integral <= -limit {
            self.line_lost = true;
        }
        let integral = self.gains.ki * self.integral;

        let derivative = self.gains.kd * (error - self.previous_error);
        self.previous_error = error;

        proportional + integral + derivative
    }

    /// Consumes the line-lost signal
    pub fn take_line_lost(&mut self) -> bool {
        core::mem::take(&mut self.line_lost)
    }

    /// Clears the accumulator, the derivative memory and any pending signal
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.line_lost = false;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn previous_error(&self) -> f32 {
        self.previous_error
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }
}
