//! Validated render configuration and output naming.

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};
use std::path::{Path, PathBuf};

/// Pixel margin kept between the shorter video edge and the board.
pub const MARGIN_PX: f64 = 20.0;

/// `vello_cpu` surfaces are addressed with `u16` dimensions.
const MAX_DIM: u32 = u16::MAX as u32;

/// Immutable rendering configuration, fixed once per conversion run.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Side length of the square board, in simulation units.
    pub board_size: f64,
    /// Height of the slot opening on the board's right edge, in simulation units.
    pub slot_size: f64,
    /// Video width in pixels.
    pub width: u32,
    /// Video height in pixels.
    pub height: u32,
    /// Video frames per second.
    pub fps: u32,
    /// Draw each particle's index inside its circle.
    pub particle_ids: bool,
    /// Font file used for text overlays. `None` resolves a system sans-serif face.
    pub font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            board_size: 1.0,
            slot_size: 0.5,
            width: 500,
            height: 500,
            fps: 24,
            particle_ids: false,
            font: None,
        }
    }
}

impl RenderConfig {
    /// Reject values that cannot produce a drawable video.
    pub fn validate(&self) -> ParticleVideoResult<()> {
        if !self.board_size.is_finite() || self.board_size <= 0.0 {
            return Err(ParticleVideoError::config(
                "board size must be a finite positive number",
            ));
        }
        if !self.slot_size.is_finite() || self.slot_size <= 0.0 {
            return Err(ParticleVideoError::config(
                "slot size must be a finite positive number",
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ParticleVideoError::config(
                "video width/height must be positive integers",
            ));
        }
        if self.width > MAX_DIM || self.height > MAX_DIM {
            return Err(ParticleVideoError::config(format!(
                "video size {}x{} exceeds the maximum of {MAX_DIM}x{MAX_DIM}",
                self.width, self.height
            )));
        }
        if f64::from(self.width.min(self.height)) <= 2.0 * MARGIN_PX {
            return Err(ParticleVideoError::config(format!(
                "video width/height must both exceed {} pixels to fit the board margin",
                2.0 * MARGIN_PX
            )));
        }
        Fps::new(self.fps)?;
        Ok(())
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Output frame rate.
    pub fn frame_rate(&self) -> ParticleVideoResult<Fps> {
        Fps::new(self.fps)
    }
}

/// Derive the output path for `input`: its base name with the extension replaced by `ext`,
/// placed in `out_dir`.
///
/// `runs/N_300.txt` with `mp4` becomes `<out_dir>/N_300.mp4`.
pub fn derive_output_path(input: &Path, out_dir: &Path, ext: &str) -> ParticleVideoResult<PathBuf> {
    let stem = input
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ParticleVideoError::config(format!(
                "input path '{}' has no file name",
                input.display()
            ))
        })?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(ext);
    Ok(out_dir.join(name))
}
