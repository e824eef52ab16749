//! Simulation log reading: the frame stream and the max-speed prepass.

pub(crate) mod max_speed;
pub(crate) mod particle;
pub(crate) mod reader;
