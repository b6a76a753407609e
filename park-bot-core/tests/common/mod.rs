//! Simulated robot for the integration tests
//!
//! A discrete-event clock shared by every task: a sleeping task only wakes
//! once every other sleeper with an earlier deadline has woken, and the clock
//! jumps straight to its deadline. Wheels integrate encoder degrees from the
//! commanded speed while the clock advances.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use embedded_hal_async::delay::DelayNs;
use park_bot_core::system::event::Event;
use park_bot_core::system::ports::{Bumper, DistanceSensor, LineSensor, Motors, Wheel, WheelEncoders};
use park_bot_core::system::state::SharedState;

/// Encoder degrees per millisecond at speed 100
pub const DEGREES_PER_MS_AT_FULL_SPEED: f64 = 0.8;

/// What the scripted sensors get to look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub now_ms: f64,
    /// Total wheel rotation since the start, never reset
    pub odometer: (f64, f64),
    pub speeds: (i8, i8),
}

#[derive(Default)]
pub struct Sim {
    now_ns: Cell<u64>,
    speeds: Cell<(i8, i8)>,
    odometer: Cell<(f64, f64)>,
    encoder_offset: Cell<(f64, f64)>,
    stalled: Cell<bool>,
    bumper_at_ns: Cell<Option<u64>>,
    sleepers: RefCell<Vec<(u64, u64)>>,
    next_sleeper: Cell<u64>,
    speed_log: RefCell<Vec<(i8, i8)>>,
}

impl Sim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ns.get() as f64 / 1e6
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            now_ms: self.now_ms(),
            odometer: self.odometer.get(),
            speeds: self.speeds.get(),
        }
    }

    pub fn speeds(&self) -> (i8, i8) {
        self.speeds.get()
    }

    /// Every speed pair ever commanded, in order
    pub fn speed_log(&self) -> Vec<(i8, i8)> {
        self.speed_log.borrow().clone()
    }

    /// Wheels stop turning whatever the motors are told
    pub fn stall(&self, stalled: bool) {
        self.stalled.set(stalled);
    }

    /// Bumper reads pressed from `ms` after the start on
    pub fn press_bumper_at(&self, ms: u64) {
        self.bumper_at_ns.set(Some(ms * 1_000_000));
    }

    fn set_speeds(&self, speeds: (i8, i8)) {
        self.speeds.set(speeds);
        self.speed_log.borrow_mut().push(speeds);
    }

    fn advance_to(&self, deadline: u64) {
        let now = self.now_ns.get();
        if deadline <= now {
            return;
        }
        if !self.stalled.get() {
            let elapsed_ms = (deadline - now) as f64 / 1e6;
            let (left_speed, right_speed) = self.speeds.get();
            let (left, right) = self.odometer.get();
            let rate = DEGREES_PER_MS_AT_FULL_SPEED * elapsed_ms / 100.0;
            self.odometer
                .set((left + f64::from(left_speed) * rate, right + f64::from(right_speed) * rate));
        }
        self.now_ns.set(deadline);
    }

    fn register(&self, deadline: u64) -> u64 {
        let id = self.next_sleeper.get();
        self.next_sleeper.set(id + 1);
        self.sleepers.borrow_mut().push((id, deadline));
        id
    }

    fn unregister(&self, id: u64) {
        self.sleepers.borrow_mut().retain(|(sleeper, _)| *sleeper != id);
    }

    fn try_wake(&self, id: u64, deadline: u64) -> bool {
        if self.now_ns.get() < deadline {
            let earliest = self.sleepers.borrow().iter().map(|(_, at)| *at).min();
            if earliest.is_some_and(|earliest| earliest < deadline) {
                return false;
            }
            self.advance_to(deadline);
        }
        self.unregister(id);
        true
    }

    pub fn delay(&self) -> SimDelay<'_> {
        SimDelay { sim: self }
    }

    pub fn motors(&self) -> SimMotors<'_> {
        SimMotors { sim: self }
    }

    pub fn bumper(&self) -> SimBumper<'_> {
        SimBumper { sim: self }
    }

    pub fn encoders(&self) -> SimEncoders<'_> {
        SimEncoders { sim: self }
    }
}

pub struct Sleep<'a> {
    sim: &'a Sim,
    id: u64,
    deadline: u64,
}

impl Future for Sleep<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.sim.try_wake(self.id, self.deadline) {
            Poll::Ready(())
        } else {
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

impl Drop for Sleep<'_> {
    fn drop(&mut self) {
        self.sim.unregister(self.id);
    }
}

pub struct SimDelay<'a> {
    sim: &'a Sim,
}

impl DelayNs for SimDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        let deadline = self.sim.now_ns.get() + u64::from(ns);
        let id = self.sim.register(deadline);
        Sleep {
            sim: self.sim,
            id,
            deadline,
        }
        .await
    }
}

pub struct SimMotors<'a> {
    sim: &'a Sim,
}

impl Motors for SimMotors<'_> {
    fn set_speed(&mut self, wheel: Wheel, speed: i8) {
        let (left, right) = self.sim.speeds();
        match wheel {
            Wheel::Left => self.sim.set_speeds((speed, right)),
            Wheel::Right => self.sim.set_speeds((left, speed)),
        }
    }

    fn set_speeds(&mut self, left: i8, right: i8) {
        self.sim.set_speeds((left, right));
    }
}

pub struct SimBumper<'a> {
    sim: &'a Sim,
}

impl Bumper for SimBumper<'_> {
    fn is_pressed(&mut self) -> bool {
        self.sim
            .bumper_at_ns
            .get()
            .is_some_and(|at| self.sim.now_ns.get() >= at)
    }
}

pub struct SimEncoders<'a> {
    sim: &'a Sim,
}

impl WheelEncoders for SimEncoders<'_> {
    fn ticks(&self, wheel: Wheel) -> i32 {
        let (left, right) = self.sim.odometer.get();
        let (left_offset, right_offset) = self.sim.encoder_offset.get();
        match wheel {
            Wheel::Left => (left - left_offset) as i32,
            Wheel::Right => (right - right_offset) as i32,
        }
    }

    fn reset(&self, wheel: Wheel) {
        let (left, right) = self.sim.odometer.get();
        let (left_offset, right_offset) = self.sim.encoder_offset.get();
        match wheel {
            Wheel::Left => self.sim.encoder_offset.set((left, right_offset)),
            Wheel::Right => self.sim.encoder_offset.set((left_offset, right)),
        }
    }
}

/// Reflectance sensor driven by a script over the robot's state
pub struct ScriptedLine<'a, F> {
    sim: &'a Sim,
    script: F,
}

impl<'a, F: FnMut(&Snapshot) -> u8> ScriptedLine<'a, F> {
    pub fn new(sim: &'a Sim, script: F) -> Self {
        Self { sim, script }
    }
}

impl<F: FnMut(&Snapshot) -> u8> LineSensor for ScriptedLine<'_, F> {
    async fn read_reflectance(&mut self) -> u8 {
        (self.script)(&self.sim.snapshot())
    }
}

/// Distance sensor driven by a script over the robot's state
pub struct ScriptedDistance<'a, F> {
    sim: &'a Sim,
    script: F,
}

impl<'a, F: FnMut(&Snapshot) -> Option<f32>> ScriptedDistance<'a, F> {
    pub fn new(sim: &'a Sim, script: F) -> Self {
        Self { sim, script }
    }
}

impl<F: FnMut(&Snapshot) -> Option<f32>> DistanceSensor for ScriptedDistance<'_, F> {
    async fn read_distance(&mut self) -> Option<f32> {
        (self.script)(&self.sim.snapshot())
    }
}

/// Obstacle row at `near` cm with an opening at `far` cm while the left
/// odometer is within `opening` degrees
pub fn obstacle_row(near: f32, far: f32, opening: std::ops::Range<f64>) -> impl FnMut(&Snapshot) -> Option<f32> {
    move |snapshot| {
        if opening.contains(&snapshot.odometer.0) {
            Some(far)
        } else {
            Some(near)
        }
    }
}

pub fn drain_events(state: &SharedState) -> Vec<Event> {
    std::iter::from_fn(|| state.try_next_event()).collect()
}
