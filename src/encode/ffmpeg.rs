use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

// Output: h264, yuv420p, no audio.
const OUTPUT_ARGS: &[&str] = &[
    "-an",
    "-c:v",
    "libx264",
    "-crf",
    "20",
    "-preset",
    "fast",
    "-pix_fmt",
    "yuv420p",
    "-movflags",
    "+faststart",
];

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Replace `out_path` when it already exists.
    pub overwrite: bool,
    /// Color that translucent pixels are flattened onto (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Options writing to `out_path`, overwriting, flattened over black.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that pipes raw RGBA frames into a system `ffmpeg` process.
///
/// `push_frame` blocks while ffmpeg's stdin pipe is full, so a slow encoder throttles the
/// pipeline instead of frames piling up in memory. If ffmpeg exits early the next write fails
/// and the returned error carries ffmpeg's stderr.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<EncoderProcess>,
}

impl FfmpegSink {
    /// Create a sink; nothing is spawned until [`FrameSink::begin`].
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
        }
    }

    fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });
        cmd.args(["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"]);
        cmd.arg("-s").arg(format!("{}x{}", cfg.width, cfg.height));
        // Input rate for rawvideo must precede `-i`.
        cmd.arg("-r").arg(cfg.fps.get().to_string());
        cmd.args(["-i", "pipe:0"]);
        cmd.args(OUTPUT_ARGS);
        cmd.arg(&self.opts.out_path);
        cmd
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ParticleVideoResult<()> {
        check_dimensions(&cfg)?;
        if self.encoder.is_some() {
            return Err(ParticleVideoError::encoder("ffmpeg sink already started"));
        }

        let out = &self.opts.out_path;
        ensure_parent_dir(out)?;
        if !self.opts.overwrite && out.exists() {
            return Err(ParticleVideoError::config(format!(
                "output file '{}' already exists",
                out.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(ParticleVideoError::encoder(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let cmd = self.command(&cfg);
        tracing::debug!(?cmd, "spawning ffmpeg");
        self.encoder = Some(EncoderProcess::spawn(cmd, cfg)?);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ParticleVideoResult<()> {
        let bg = self.opts.bg_rgba;
        let enc = self
            .encoder
            .as_mut()
            .ok_or_else(|| ParticleVideoError::encoder("ffmpeg sink not started"))?;

        if enc.last_idx.is_some_and(|last| idx <= last) {
            return Err(ParticleVideoError::encoder(format!(
                "ffmpeg sink received frame {} out of order",
                idx.0
            )));
        }
        if (frame.width, frame.height) != (enc.cfg.width, enc.cfg.height) {
            return Err(ParticleVideoError::encoder(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, enc.cfg.width, enc.cfg.height
            )));
        }
        flatten_to_opaque_rgba8(&mut enc.opaque, &frame.data, frame.premultiplied, bg)?;
        enc.last_idx = Some(idx);

        let written = match enc.stdin.as_mut() {
            Some(stdin) => stdin.write_all(&enc.opaque),
            None => return Err(ParticleVideoError::encoder("ffmpeg stdin already closed")),
        };
        match written {
            Ok(()) => Ok(()),
            Err(e) => match self.encoder.take() {
                Some(enc) => Err(enc.fail(e)),
                None => Err(ParticleVideoError::encoder(e.to_string())),
            },
        }
    }

    fn end(&mut self) -> ParticleVideoResult<()> {
        self.encoder
            .take()
            .ok_or_else(|| ParticleVideoError::encoder("ffmpeg sink not started"))?
            .finish()
    }

    fn abort(&mut self) {
        if let Some(enc) = self.encoder.take() {
            enc.kill();
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

/// A running ffmpeg child with its stdin and a thread collecting stderr.
struct EncoderProcess {
    cfg: SinkConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    opaque: Vec<u8>,
    last_idx: Option<FrameIndex>,
}

impl EncoderProcess {
    fn spawn(mut cmd: Command, cfg: SinkConfig) -> ParticleVideoResult<Self> {
        let mut child = cmd.spawn().map_err(|e| {
            ParticleVideoError::encoder(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });
        if stdin.is_none() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ParticleVideoError::encoder("ffmpeg stdin was not captured"));
        }

        Ok(Self {
            cfg,
            child,
            stdin,
            stderr,
            opaque: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            last_idx: None,
        })
    }

    fn stderr_text(&mut self) -> String {
        let bytes = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes).trim().to_string()
    }

    /// Close stdin and wait for ffmpeg to write the container.
    fn finish(mut self) -> ParticleVideoResult<()> {
        drop(self.stdin.take());
        let status = self.child.wait().map_err(|e| {
            ParticleVideoError::encoder(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr = self.stderr_text();
        if !status.success() {
            return Err(ParticleVideoError::encoder(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }
        tracing::debug!(frames = self.last_idx.map_or(0, |i| i.0 + 1), "ffmpeg finished");
        Ok(())
    }

    /// Reap ffmpeg after a failed write and describe why the pipe closed.
    fn fail(mut self, write_err: std::io::Error) -> ParticleVideoError {
        drop(self.stdin.take());
        let status = self.child.wait();
        let stderr = self.stderr_text();
        match status {
            Ok(status) => ParticleVideoError::encoder(format!(
                "ffmpeg stopped accepting frames ({write_err}); exited with status {status}: {stderr}"
            )),
            Err(_) => ParticleVideoError::encoder(format!(
                "failed to write frame to ffmpeg stdin: {write_err}: {stderr}"
            )),
        }
    }

    fn kill(mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = self.stderr_text();
    }
}

fn check_dimensions(cfg: &SinkConfig) -> ParticleVideoResult<()> {
    if cfg.width == 0 || cfg.height == 0 {
        return Err(ParticleVideoError::config(
            "ffmpeg sink width/height must be non-zero",
        ));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(ParticleVideoError::config(format!(
            "ffmpeg sink needs even dimensions for yuv420p, got {}x{}",
            cfg.width, cfg.height
        )));
    }
    Ok(())
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    premultiplied: bool,
    bg_rgba: [u8; 4],
) -> ParticleVideoResult<()> {
    if dst.len() != src.len() || !src.len().is_multiple_of(4) {
        return Err(ParticleVideoError::encoder(format!(
            "frame holds {} bytes, expected {}",
            src.len(),
            dst.len()
        )));
    }
    for (out, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        out.copy_from_slice(&over_background([px[0], px[1], px[2], px[3]], premultiplied, bg_rgba));
    }
    Ok(())
}

fn over_background(px: [u8; 4], premultiplied: bool, bg: [u8; 4]) -> [u8; 4] {
    let alpha = u16::from(px[3]);
    if alpha == 255 {
        return px;
    }
    let keep = 255 - alpha;
    let mut out = [0, 0, 0, 255];
    for ((o, &fg), &b) in out.iter_mut().zip(&px[..3]).zip(&bg[..3]) {
        let fg = if premultiplied {
            u16::from(fg)
        } else {
            mul_div255_u16(u16::from(fg), alpha)
        };
        *o = (fg + mul_div255_u16(u16::from(b), keep)).min(255) as u8;
    }
    out
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ParticleVideoResult<()> {
    use anyhow::Context as _;

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory '{}'", parent.display())
            })?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Return `true` when `ffmpeg -version` runs successfully from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
