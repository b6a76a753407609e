mod common;

use common::*;
use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_time::Duration;
use park_bot_core::config::{FollowConfig, RecoveryConfig, RobotConfig};
use park_bot_core::motion::Drivetrain;
use park_bot_core::pid::PidController;
use park_bot_core::system::event::Event;
use park_bot_core::system::ports::pause;
use park_bot_core::system::state::{Mode, SharedState};
use park_bot_core::task::control::Controller;
use park_bot_core::task::line_sensor;
use park_bot_core::ParkError;

fn slow_config() -> RobotConfig {
    RobotConfig {
        follow: FollowConfig {
            base_speed: 50,
            ..FollowConfig::default()
        },
        ..RobotConfig::default()
    }
}

fn controller<'a>(
    sim: &'a Sim,
    state: &'a SharedState,
    config: RobotConfig,
) -> Controller<'a, SimMotors<'a>, SimBumper<'a>, SimEncoders<'a>, SimDelay<'a>> {
    Controller::new(
        state,
        Drivetrain::new(sim.motors(), sim.bumper(), sim.encoders()),
        sim.delay(),
        config,
    )
}

/// Drives sustained negative error into the controller until it gives up on the line
fn lose_line<M, B, E, D>(state: &SharedState, controller: &mut Controller<'_, M, B, E, D>) -> usize
where
    M: park_bot_core::system::ports::Motors,
    B: park_bot_core::system::ports::Bumper,
    E: park_bot_core::system::ports::WheelEncoders,
    D: embedded_hal_async::delay::DelayNs,
{
    state.publish_tracking_error(-16.0);
    let mut cycles = 0;
    while state.mode() == Mode::LineFollowing {
        controller.follow();
        cycles += 1;
        assert!(cycles < 10_000, "line never lost");
    }
    cycles
}

#[test]
fn alternating_error_keeps_corrections_bounded() {
    let config = slow_config();
    let mut pid = PidController::new(config.pid);
    let gains = config.pid;
    let bound = gains.kp * 5.0 + gains.ki * 5.0 + gains.kd * 10.0;

    for cycle in 0..100 {
        let error = if cycle % 2 == 0 { 5.0 } else { -5.0 };
        let correction = pid.compute(error);
        assert!(correction.abs() <= bound + 1e-3, "cycle {cycle}: {correction}");
    }
    assert!(!pid.take_line_lost());
}

#[test]
fn alternating_readings_never_reverse_the_wheels() {
    let sim = Sim::new();
    let state = SharedState::new();
    let config = slow_config();
    let mut controller = controller(&sim, &state, config);

    let mut readings = [41u8, 51].into_iter().cycle();
    let mut sensor = ScriptedLine::new(&sim, move |_: &Snapshot| readings.next().unwrap_or(46));
    let mut sensor_delay = sim.delay();
    let mut control_delay = sim.delay();

    block_on(join(
        line_sensor::run(&state, &mut sensor, &mut sensor_delay, &config.line),
        async {
            for _ in 0..100 {
                pause(&mut control_delay, config.line.sample_period).await;
                controller.follow();
            }
            assert_eq!(state.mode(), Mode::LineFollowing);
            state.set_mode(Mode::Done);
        },
    ));

    let speeds = sim.speed_log();
    assert_eq!(speeds.len(), 100);
    for (left, right) in speeds {
        assert!((0..=100).contains(&left), "left {left}");
        assert!((0..=100).contains(&right), "right {right}");
    }
    assert!(controller.pid().integral().abs() <= 10.0);
    assert!(drain_events(&state).is_empty());
}

#[test]
fn sustained_negative_error_signals_line_lost_once() {
    let sim = Sim::new();
    let state = SharedState::new();
    let mut controller = controller(&sim, &state, slow_config());

    // 5500 / 16 rounds up to 344 cycles before the integral hits its floor
    assert_eq!(lose_line(&state, &mut controller), 344);
    assert_eq!(state.mode(), Mode::Recovering);
    assert_eq!(controller.pid().integral(), -5500.0);
    assert_eq!(sim.speeds(), (0, 0));
    assert_eq!(drain_events(&state), vec![Event::LineLost]);
}

#[test]
fn recovery_counter_rotates_until_line_is_back() {
    let sim = Sim::new();
    let state = SharedState::new();
    let config = slow_config();
    let mut controller = controller(&sim, &state, config);
    lose_line(&state, &mut controller);

    // Over the tape until the robot has spun for 60 ms, then back on the edge
    let mut spin_started = None;
    let mut sensor = ScriptedLine::new(&sim, move |snapshot: &Snapshot| {
        if snapshot.speeds.0 < 0 && snapshot.speeds.1 > 0 {
            spin_started.get_or_insert(snapshot.now_ms);
        }
        match spin_started {
            Some(start) if snapshot.now_ms - start >= 60.0 => 46,
            _ => 30,
        }
    });
    let mut sensor_delay = sim.delay();

    let recovered_at = block_on(join(
        line_sensor::run(&state, &mut sensor, &mut sensor_delay, &config.line),
        async {
            let result = controller.recover().await;
            assert_eq!(result, Ok(()));
            assert_eq!(state.mode(), Mode::LineFollowing);
            assert_eq!(controller.pid().integral(), 0.0);
            assert_eq!(controller.pid().previous_error(), 0.0);
            let at = sim.now_ms();
            state.set_mode(Mode::Done);
            at
        },
    ))
    .1;

    let speeds = sim.speed_log();
    assert!(speeds.contains(&(-40, 40)));
    assert_eq!(speeds.last(), Some(&(0, 0)));
    // settle plus at least the scripted spin
    assert!(recovered_at >= 160.0, "recovered at {recovered_at} ms");
    assert!(state.take_baseline_reset());
    assert_eq!(drain_events(&state), vec![Event::LineLost, Event::LineReacquired]);
}

#[test]
fn recovery_gives_up_after_timeout() {
    let sim = Sim::new();
    let state = SharedState::new();
    let config = RobotConfig {
        recovery: RecoveryConfig {
            timeout: Some(Duration::from_millis(50)),
            ..RecoveryConfig::default()
        },
        ..slow_config()
    };
    let mut controller = controller(&sim, &state, config);
    lose_line(&state, &mut controller);

    assert_eq!(block_on(controller.recover()), Err(ParkError::RecoveryTimeout));
    assert_eq!(state.mode(), Mode::Done);
    assert_eq!(sim.speeds(), (0, 0));
    assert!(!state.take_baseline_reset());
    assert_eq!(
        drain_events(&state),
        vec![Event::LineLost, Event::ParkingAborted(ParkError::RecoveryTimeout)]
    );
}
