use crate::config::RenderConfig;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};
use crate::pipeline::clock::{FrameDecision, RewindClock};
use crate::render::backend::FrameRGBA;
use crate::render::cpu::FrameRenderer;
use crate::trajectory::max_speed::scan_max_speed;
use crate::trajectory::particle::Frame;
use crate::trajectory::reader::FrameReader;
use std::path::Path;
use std::sync::mpsc;

/// Options controlling pipeline behavior beyond the render configuration.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Frames that may wait between the renderer and the encoder thread. `0` is a rendezvous:
    /// the next frame is only rendered once the encoder has taken the previous one.
    pub channel_capacity: usize,
    /// Stop after this many rendered frames.
    pub max_frames: Option<u64>,
    /// Keep one of every `stride` timesteps, starting with the first. Must be at least 1.
    pub stride: u64,
    /// Draw text overlays (collision counter, particle ids) when a font is available.
    pub draw_text: bool,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            channel_capacity: 0,
            max_frames: None,
            stride: 1,
            draw_text: true,
        }
    }
}

/// Summary of a pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct RenderStats {
    /// Timestep frames read from the log, including those dropped by the stride.
    pub frames_parsed: u64,
    /// Frames rendered and delivered to the sink.
    pub frames_rendered: u64,
    /// Timesteps skipped because they rewound the video clock.
    pub rewinds: u64,
    /// Color normalization denominator from the prepass.
    pub max_speed: f64,
}

/// Lifecycle of a [`VideoDriver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// No frame delivered yet.
    BeforeFirstFrame,
    /// At least one frame delivered; accepting more.
    Streaming,
    /// Input exhausted; waiting for the sink to finish.
    Draining,
    /// Sink finished.
    Closed,
}

/// Turns parsed timesteps into rendered frames, skipping rewinds.
pub struct VideoDriver {
    state: DriverState,
    clock: RewindClock,
    renderer: FrameRenderer,
    max_frames: Option<u64>,
    stride: u64,
    last_particle_count: Option<usize>,
    stats: RenderStats,
}

impl VideoDriver {
    /// Create a driver in [`DriverState::BeforeFirstFrame`].
    pub fn new(renderer: FrameRenderer, fps: Fps, max_speed: f64, max_frames: Option<u64>) -> Self {
        Self {
            state: DriverState::BeforeFirstFrame,
            clock: RewindClock::new(fps),
            renderer,
            max_frames,
            stride: 1,
            last_particle_count: None,
            stats: RenderStats {
                max_speed,
                ..RenderStats::default()
            },
        }
    }

    /// Keep only every `stride`-th timestep (`0` is treated as 1).
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Statistics so far.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// `true` once `max_frames` frames have been rendered.
    pub fn is_full(&self) -> bool {
        self.max_frames
            .is_some_and(|max| self.stats.frames_rendered >= max)
    }

    /// Consider one timestep. Returns the rendered frame unless it was a rewind.
    pub fn process(&mut self, frame: &Frame) -> ParticleVideoResult<Option<(FrameIndex, FrameRGBA)>> {
        if matches!(self.state, DriverState::Draining | DriverState::Closed) {
            return Err(ParticleVideoError::render(format!(
                "driver cannot accept frames in state {:?}",
                self.state
            )));
        }
        if self.is_full() {
            return Ok(None);
        }
        let seen = self.stats.frames_parsed;
        self.stats.frames_parsed += 1;
        if !seen.is_multiple_of(self.stride) {
            return Ok(None);
        }
        self.check_particle_count(frame);

        match self.clock.admit(frame.time) {
            FrameDecision::Rewind { collisions } => {
                self.stats.rewinds = collisions;
                tracing::debug!(
                    time = frame.time,
                    clock = self.clock.current_time(),
                    collisions,
                    "rewound timestep skipped"
                );
                Ok(None)
            }
            FrameDecision::Render { index, collisions } => {
                let rgba = self.renderer.render(&frame.particles, Some(collisions))?;
                self.stats.frames_rendered += 1;
                self.state = DriverState::Streaming;
                tracing::trace!(frame = index.0, time = frame.time, "rendered frame");
                Ok(Some((index, rgba)))
            }
        }
    }

    /// Input is exhausted; the sink is now being finalized.
    pub fn finish_input(&mut self) {
        self.state = DriverState::Draining;
    }

    /// The sink finished successfully.
    pub fn close(&mut self) {
        self.state = DriverState::Closed;
    }

    fn check_particle_count(&mut self, frame: &Frame) {
        let n = frame.particles.len();
        if let Some(prev) = self.last_particle_count
            && prev != n
        {
            tracing::warn!(
                time = frame.time,
                particles = n,
                previous = prev,
                "particle count changed between timesteps"
            );
        }
        self.last_particle_count = Some(n);
    }
}

enum SinkMsg {
    Frame(FrameIndex, FrameRGBA),
    Finish,
}

enum ProduceError {
    Disconnected,
    Failed(ParticleVideoError),
}

impl From<ParticleVideoError> for ProduceError {
    fn from(e: ParticleVideoError) -> Self {
        Self::Failed(e)
    }
}

fn build_driver(
    input: &Path,
    cfg: &RenderConfig,
    opts: &PipelineOpts,
) -> ParticleVideoResult<(VideoDriver, FrameReader<std::io::BufReader<std::fs::File>>)> {
    cfg.validate()?;
    if opts.stride == 0 {
        return Err(ParticleVideoError::config("stride must be at least 1"));
    }
    let fps = cfg.frame_rate()?;
    let max_speed = scan_max_speed(input)?;
    let renderer = if opts.draw_text {
        FrameRenderer::new(cfg, max_speed)?
    } else {
        FrameRenderer::without_text(cfg, max_speed)?
    };
    let reader = FrameReader::open(input)?;
    Ok((
        VideoDriver::new(renderer, fps, max_speed, opts.max_frames).with_stride(opts.stride),
        reader,
    ))
}

/// Convert the log at `input` into frames delivered to `sink`.
///
/// Runs the max-speed prepass, then streams timesteps through the [`VideoDriver`]. The sink runs
/// on its own thread behind a bounded channel, so a slow sink blocks rendering. With the default
/// rendezvous channel at most two frames exist at once: the one the sink is consuming and the one
/// being rendered. On any failure the
/// sink is aborted instead of finalized.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn render_to_sink(
    input: &Path,
    cfg: &RenderConfig,
    opts: &PipelineOpts,
    sink: &mut dyn FrameSink,
) -> ParticleVideoResult<RenderStats> {
    let (mut driver, reader) = build_driver(input, cfg, opts)?;
    sink.begin(SinkConfig {
        width: cfg.width,
        height: cfg.height,
        fps: cfg.frame_rate()?,
    })?;

    let sink_ref: &mut dyn FrameSink = &mut *sink;
    let res = std::thread::scope(|scope| -> ParticleVideoResult<()> {
        let (tx, rx) = mpsc::sync_channel::<SinkMsg>(opts.channel_capacity);

        let enc = scope.spawn(move || -> ParticleVideoResult<()> {
            loop {
                match rx.recv() {
                    Ok(SinkMsg::Frame(idx, frame)) => sink_ref.push_frame(idx, &frame)?,
                    Ok(SinkMsg::Finish) => return sink_ref.end(),
                    Err(_) => {
                        return Err(ParticleVideoError::encoder(
                            "frame producer stopped before end of stream",
                        ));
                    }
                }
            }
        });

        let produced = produce(&mut driver, reader, &tx);
        drop(tx);
        let encoded = enc
            .join()
            .map_err(|_| ParticleVideoError::encoder("encoder thread panicked"))?;

        match (produced, encoded) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(ProduceError::Failed(e)), _) => Err(e),
            (_, Err(e)) => Err(e),
            (Err(ProduceError::Disconnected), Ok(())) => Err(ParticleVideoError::encoder(
                "encoder stopped accepting frames",
            )),
        }
    });

    match res {
        Ok(()) => {
            driver.close();
            let stats = driver.stats();
            tracing::info!(
                frames_parsed = stats.frames_parsed,
                frames_rendered = stats.frames_rendered,
                rewinds = stats.rewinds,
                max_speed = stats.max_speed,
                "pipeline finished"
            );
            Ok(stats)
        }
        Err(e) => {
            sink.abort();
            Err(e)
        }
    }
}

fn produce(
    driver: &mut VideoDriver,
    reader: impl Iterator<Item = ParticleVideoResult<Frame>>,
    tx: &mpsc::SyncSender<SinkMsg>,
) -> Result<(), ProduceError> {
    for frame in reader {
        let frame = frame?;
        if let Some((idx, rgba)) = driver.process(&frame)? {
            tx.send(SinkMsg::Frame(idx, rgba))
                .map_err(|_| ProduceError::Disconnected)?;
        }
        if driver.is_full() {
            tracing::debug!(frames = driver.stats().frames_rendered, "max frames reached");
            break;
        }
    }
    driver.finish_input();
    tx.send(SinkMsg::Finish)
        .map_err(|_| ProduceError::Disconnected)
}

/// Encode the log at `input` into an MP4 at `out_path` with the system `ffmpeg`.
pub fn render_to_mp4(
    input: &Path,
    out_path: &Path,
    cfg: &RenderConfig,
    opts: &PipelineOpts,
    overwrite: bool,
) -> ParticleVideoResult<RenderStats> {
    let mut sink_opts = FfmpegSinkOpts::new(out_path);
    sink_opts.overwrite = overwrite;
    let mut sink = FfmpegSink::new(sink_opts);
    render_to_sink(input, cfg, opts, &mut sink)
}

/// Render only the `index`-th video frame (0-based, rewinds excluded).
#[tracing::instrument(skip_all, fields(input = %input.display(), index = index))]
pub fn render_snapshot(
    input: &Path,
    cfg: &RenderConfig,
    opts: &PipelineOpts,
    index: u64,
) -> ParticleVideoResult<FrameRGBA> {
    let (mut driver, reader) = build_driver(input, cfg, opts)?;
    for frame in reader {
        if let Some((idx, rgba)) = driver.process(&frame?)?
            && idx.0 == index
        {
            return Ok(rgba);
        }
        if driver.is_full() {
            break;
        }
    }
    Err(ParticleVideoError::config(format!(
        "frame {index} requested, but '{}' only yields {} video frames",
        input.display(),
        driver.stats().frames_rendered
    )))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/driver.rs"]
mod tests;
