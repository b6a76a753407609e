pub mod control;
pub mod gap_sense;
pub mod indicate;
pub mod line_sense;
