//! Frame rendering: coordinate/color mapping and CPU rasterization.

pub(crate) mod backend;
pub(crate) mod color;
pub(crate) mod cpu;
pub(crate) mod mapping;
pub(crate) mod text;
