//! Frame pipeline: parse, detect rewinds, render, hand off to a sink.

pub(crate) mod clock;
pub(crate) mod driver;
