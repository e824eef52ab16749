//! particle-video renders 2D particle simulation logs into MP4 videos.
//!
//! A log is a sequence of timestep blocks. Each block is a timestamp line followed by one
//! `x,y,vx,vy,r` line per particle. The pipeline:
//!
//! - Scans the log once for the largest particle speed (the color scale)
//! - Streams timesteps through a [`VideoDriver`], dropping any that rewind the video clock
//! - Rasterizes each kept timestep on the CPU ([`FrameRenderer`])
//! - Hands frames to a [`FrameSink`]; [`FfmpegSink`] pipes them into the system `ffmpeg`
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Render configuration and output naming.
pub mod config;
/// Encoding sinks.
pub mod encode;
/// Parse, rewind detection, render and sink hand-off.
pub mod pipeline;
/// Coordinate and color mapping plus CPU rasterization.
pub mod render;
/// Simulation log reading.
pub mod trajectory;

pub use crate::foundation::core::{BezPath, Canvas, Fps, FrameIndex, Point, Rgba8};
pub use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};

pub use crate::config::{MARGIN_PX, RenderConfig, derive_output_path};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::pipeline::clock::{FrameDecision, RewindClock};
pub use crate::pipeline::driver::{
    DriverState, PipelineOpts, RenderStats, VideoDriver, render_snapshot, render_to_mp4,
    render_to_sink,
};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::color::{SLOW_HUE, normalized_speed, speed_to_color, speed_to_hue};
pub use crate::render::cpu::FrameRenderer;
pub use crate::render::mapping::{BoardMapping, OUTLINE_WIDTH_PX, label_font_px};
pub use crate::trajectory::max_speed::{scan_max_speed, scan_max_speed_from};
pub use crate::trajectory::particle::{Frame, Particle};
pub use crate::trajectory::reader::FrameReader;
