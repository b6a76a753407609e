pub mod encoder;
pub mod motor;
pub mod resources;
pub mod sensor;
pub mod state;
