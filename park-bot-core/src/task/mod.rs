pub mod control;
pub mod gap_sensor;
pub mod line_sensor;
