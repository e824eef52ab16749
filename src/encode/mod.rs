//! Encoding sinks.
//!
//! Sinks consume rendered frames in delivery order and are driven by the pipeline.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub(crate) mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub(crate) mod sink;
