//! Main Control Loop
//!
//! Single writer of the run mode. Each cycle reads the shared state and acts
//! on the current mode:
//!
//! - `LineFollowing`: steer with the PID correction. A confirmed gap switches
//!   to `Parking`, a line-lost signal to `Recovering`.
//! - `Recovering`: stop, counter-rotate until the line is back, reset the PID
//!   and the gap baseline, resume following.
//! - `Parking`: plan the maneuver for the confirmed gap and execute it.
//! - `Done`: terminal, motors stopped.
//!
//! Leaving the sensing modes is what stops the line and gap sensor tasks.
//!
//! # Failures
//! An infeasible gap, a drive or recovery timeout, and a missing gap
//! measurement all end the run: motors stop, the mode becomes `Done` and a
//! [`Event::ParkingAborted`] goes out before the error is returned.

use embedded_hal_async::delay::DelayNs;

use crate::config::{FollowConfig, RobotConfig};
use crate::error::ParkError;
use crate::motion::drive::{DriveOutcome, Drivetrain};
use crate::motion::planner::{plan, ParkingPlan};
use crate::pid::PidController;
use crate::system::event::Event;
use crate::system::ports::{pause, poll_budget, Bumper, Motors, WheelEncoders};
use crate::system::state::{Mode, SharedState};

/// What a completed parking run did
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParkingReport {
    pub gap_length: f32,
    pub plan: ParkingPlan,
    /// One outcome per plan command, in execution order
    pub outcomes: [DriveOutcome; 3],
}

/// Left and right wheel speeds for a steering `correction`
///
/// Both are clamped into the follow speed range.
pub fn wheel_speeds(correction: f32, config: &FollowConfig) -> (i8, i8) {
    let base = f32::from(config.base_speed);
    let min = f32::from(config.min_speed);
    let max = f32::from(config.max_speed);
    let left = (base + correction).clamp(min, max);
    let right = (base - correction).clamp(min, max);
    (left as i8, right as i8)
}

pub struct Controller<'a, M, B, E, D> {
    state: &'a SharedState,
    drivetrain: Drivetrain<M, B, E>,
    delay: D,
    config: RobotConfig,
    pid: PidController,
}

impl<'a, M, B, E, D> Controller<'a, M, B, E, D>
where
    M: Motors,
    B: Bumper,
    E: WheelEncoders,
    D: DelayNs,
{
    pub fn new(state: &'a SharedState, drivetrain: Drivetrain<M, B, E>, delay: D, config: RobotConfig) -> Self {
        Self {
            state,
            drivetrain,
            delay,
            pid: PidController::new(config.pid),
            config,
        }
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn drivetrain(&self) -> &Drivetrain<M, B, E> {
        &self.drivetrain
    }

    /// Runs the state machine until the robot is parked or the run fails
    pub async fn run(&mut self) -> Result<ParkingReport, ParkError> {
        info!("control loop started");
        loop {
            match self.state.mode() {
                Mode::LineFollowing => {
                    if self.state.gap_confirmed() {
                        self.state.set_mode(Mode::Parking);
                        continue;
                    }
                    self.follow();
                    pause(&mut self.delay, self.config.follow.control_period).await;
                }
                Mode::Recovering => self.recover().await?,
                Mode::Parking => return self.park().await,
                Mode::Done => return Err(ParkError::AlreadyFinished),
            }
        }
    }

    /// One line-following cycle
    pub fn follow(&mut self) {
        let error = self.state.tracking_error();
        let correction = self.pid.compute(error);
        let (left, right) = wheel_speeds(correction, &self.config.follow);
        self.drivetrain.motors.set_speeds(left, right);

        if self.pid.take_line_lost() {
            warn!("line lost, integral at {}", self.pid.integral());
            self.drivetrain.motors.stop();
            self.state.notify(Event::LineLost);
            self.state.set_mode(Mode::Recovering);
        }
    }

    /// Turns in place until the tracking error rises above the reacquire threshold
    pub async fn recover(&mut self) -> Result<(), ParkError> {
        let config = self.config.recovery;
        self.drivetrain.motors.stop();
        pause(&mut self.delay, config.settle).await;

        self.drivetrain.motors.set_speeds(-config.turn_speed, config.turn_speed);

        let budget = config.timeout.map(|timeout| poll_budget(timeout, config.poll_period));
        let mut polls = 0;
        while self.state.tracking_error() <= config.reacquire_threshold {
            if budget.is_some_and(|budget| polls >= budget) {
                return Err(self.abort(ParkError::RecoveryTimeout));
            }
            polls += 1;
            pause(&mut self.delay, config.poll_period).await;
        }

        self.drivetrain.motors.stop();
        self.pid.reset();
        self.state.request_baseline_reset();
        info!("line reacquired after {} polls", polls);
        self.state.notify(Event::LineReacquired);
        self.state.set_mode(Mode::LineFollowing);
        Ok(())
    }

    /// Plans and executes the parking maneuver for the confirmed gap
    pub async fn park(&mut self) -> Result<ParkingReport, ParkError> {
        self.drivetrain.motors.stop();
        self.state.set_mode(Mode::Parking);

        let Some(gap_length) = self.state.gap_observation().gap_length() else {
            return Err(self.abort(ParkError::NoGapMeasurement));
        };

        let plan = match plan(gap_length, &self.config.geometry, &self.config.maneuver) {
            Ok(plan) => plan,
            Err(e) => return Err(self.abort(e)),
        };
        info!("parking in gap of {} cm", gap_length);
        self.state.notify(Event::ParkingStarted { gap_length });

        let mut outcomes = [DriveOutcome::TargetReached { ticks: 0 }; 3];
        for (outcome, command) in outcomes.iter_mut().zip(plan.commands()) {
            *outcome = match self
                .drivetrain
                .drive(&command, &self.config.geometry, &self.config.drive, &mut self.delay)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => return Err(self.abort(e)),
            };
            if let DriveOutcome::BumperContact { ticks } = *outcome {
                warn!("bumper contact after {} ticks", ticks);
            }
        }

        self.state.set_mode(Mode::Done);
        self.state.notify(Event::ParkingComplete);
        info!("parked");

        Ok(ParkingReport {
            gap_length,
            plan,
            outcomes,
        })
    }

    fn abort(&mut self, error: ParkError) -> ParkError {
        error!("run aborted: {}", error);
        self.drivetrain.motors.stop();
        self.state.set_mode(Mode::Done);
        self.state.notify(Event::ParkingAborted(error));
        error
    }
}
