//! Shared run state and the contracts to the outside world
pub mod event;
pub mod ports;
pub mod state;
