//! Shared Run State
//!
//! The small block of state the three tasks communicate through:
//! - Tracking error (written by the line sensor task)
//! - Gap observation (written by the gap sensor task)
//! - Mode (written by the control loop)
//! - Baseline reset requests (control loop to gap sensor task)
//! - Run events (anyone to observers)
//!
//! # Access Pattern
//! Every field has a single writer. Readers take the latest value through a
//! short critical section and never wait on a writer; a reading at most one
//! sampling period old is good enough for control. The gap confirmation is
//! sticky: once set it stays set for the rest of the run.
//!
//! ```rust,ignore
//! static STATE: SharedState = SharedState::new();
//! STATE.publish_tracking_error(-3.0);
//! let error = STATE.tracking_error();
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use crate::system::event::{Event, EVENT_QUEUE_SIZE};

/// Top-level run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// PID line following while the gap sensor looks for a slot
    LineFollowing,
    /// Turning in place until the line is found again
    Recovering,
    /// Executing the parking maneuver, sensing has stopped
    Parking,
    /// Motors stopped, run over
    Done,
}

impl Mode {
    /// Whether the sampling tasks should keep running
    pub fn is_sensing(self) -> bool {
        matches!(self, Mode::LineFollowing | Mode::Recovering)
    }
}

/// What the gap sensor currently knows about the side of the road
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GapObservation {
    /// Baseline distance to the obstacle row, `None` until the first reading
    pub clear_distance: Option<f32>,
    /// Latest raw distance reading
    pub current_distance: Option<f32>,
    /// A full gap has been driven past
    pub confirmed: bool,
}

impl GapObservation {
    /// Distance that sizes the parking maneuver, available once confirmed
    pub fn gap_length(&self) -> Option<f32> {
        if self.confirmed {
            self.clear_distance
        } else {
            None
        }
    }
}

/// State container shared by the control loop and the sampling tasks
pub struct SharedState {
    tracking_error: Mutex<CriticalSectionRawMutex, Cell<f32>>,
    gap: Mutex<CriticalSectionRawMutex, Cell<GapObservation>>,
    mode: Mutex<CriticalSectionRawMutex, Cell<Mode>>,
    baseline_reset: Signal<CriticalSectionRawMutex, ()>,
    events: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_SIZE>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    /// Fresh state: line following, zero error, nothing observed yet
    pub const fn new() -> Self {
        Self {
            tracking_error: Mutex::new(Cell::new(0.0)),
            gap: Mutex::new(Cell::new(GapObservation {
                clear_distance: None,
                current_distance: None,
                confirmed: false,
            })),
            mode: Mutex::new(Cell::new(Mode::LineFollowing)),
            baseline_reset: Signal::new(),
            events: Channel::new(),
        }
    }

    pub fn tracking_error(&self) -> f32 {
        self.tracking_error.lock(|error| error.get())
    }

    /// Replaces the tracking error, latest value wins
    pub fn publish_tracking_error(&self, error: f32) {
        self.tracking_error.lock(|cell| cell.set(error));
    }

    pub fn gap_observation(&self) -> GapObservation {
        self.gap.lock(|gap| gap.get())
    }

    /// Records the latest baseline and raw reading, keeping the confirmation flag
    pub fn publish_gap_reading(&self, clear_distance: Option<f32>, current_distance: f32) {
        self.gap.lock(|gap| {
            let confirmed = gap.get().confirmed;
            gap.set(GapObservation {
                clear_distance,
                current_distance: Some(current_distance),
                confirmed,
            });
        });
    }

    /// Marks the gap as confirmed, the flag never clears again within the run
    pub fn confirm_gap(&self, clear_distance: f32, current_distance: f32) {
        self.gap.lock(|gap| {
            gap.set(GapObservation {
                clear_distance: Some(clear_distance),
                current_distance: Some(current_distance),
                confirmed: true,
            });
        });
    }

    pub fn gap_confirmed(&self) -> bool {
        self.gap_observation().confirmed
    }

    pub fn mode(&self) -> Mode {
        self.mode.lock(|mode| mode.get())
    }

    /// Changes the mode; only the control loop calls this
    pub fn set_mode(&self, new_mode: Mode) {
        let old_mode = self.mode.lock(|mode| mode.replace(new_mode));
        if old_mode != new_mode {
            info!("mode {} -> {}", old_mode, new_mode);
        }
    }

    /// Asks the gap sensor task to drop its baseline and re-seed it
    pub fn request_baseline_reset(&self) {
        self.baseline_reset.signal(());
    }

    /// Consumes a pending baseline reset request
    pub fn take_baseline_reset(&self) -> bool {
        self.baseline_reset.try_take().is_some()
    }

    /// Publishes an event without waiting; dropped if nobody drains the queue
    pub fn notify(&self, event: Event) {
        if self.events.try_send(event).is_err() {
            warn!("event queue full, dropping {}", event);
        }
    }

    /// Waits for the next event
    pub async fn next_event(&self) -> Event {
        self.events.receive().await
    }

    /// Takes the next event if one is queued
    pub fn try_next_event(&self) -> Option<Event> {
        self.events.try_receive().ok()
    }
}
