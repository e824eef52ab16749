use crate::config::{MARGIN_PX, RenderConfig};
use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};

/// Affine map from board coordinates to pixels, plus the board outline.
///
/// `scale` fits the board into the shorter video edge minus a margin on both sides. The board is
/// offset by a third of the horizontal slack and half of the vertical slack, which leaves room on
/// the right for the slot protrusion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardMapping {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    board_size: f64,
    slot_size: f64,
}

impl BoardMapping {
    /// Build the mapping for a `width`x`height` video.
    pub fn new(
        width: u32,
        height: u32,
        board_size: f64,
        slot_size: f64,
    ) -> ParticleVideoResult<Self> {
        if !board_size.is_finite() || board_size <= 0.0 {
            return Err(ParticleVideoError::config("board size must be positive"));
        }
        let (w, h) = (f64::from(width), f64::from(height));
        let scale = (w.min(h) - 2.0 * MARGIN_PX) / board_size;
        if scale <= 0.0 {
            return Err(ParticleVideoError::config(format!(
                "video {width}x{height} leaves no room for the board inside a {MARGIN_PX}px margin"
            )));
        }
        let board_px = board_size * scale;
        Ok(Self {
            scale,
            offset_x: (w - board_px) / 3.0,
            offset_y: (h - board_px) / 2.0,
            board_size,
            slot_size,
        })
    }

    /// Mapping for a validated [`RenderConfig`].
    pub fn from_config(cfg: &RenderConfig) -> ParticleVideoResult<Self> {
        Self::new(cfg.width, cfg.height, cfg.board_size, cfg.slot_size)
    }

    /// Pixels per board unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Pixel position of the board's left edge.
    pub fn offset_x(&self) -> f64 {
        self.offset_x
    }

    /// Pixel position of the board's top edge.
    pub fn offset_y(&self) -> f64 {
        self.offset_y
    }

    /// Map a board position to pixels.
    pub fn map_point(&self, x: f64, y: f64) -> Point {
        Point::new(self.offset_x + x * self.scale, self.offset_y + y * self.scale)
    }

    /// Map a board length (radius) to pixels.
    pub fn map_radius(&self, r: f64) -> f64 {
        r * self.scale
    }

    /// Vertices of the board outline, closed (the last vertex repeats the first).
    ///
    /// The square board has an opening of `slot_size` centered on its right edge, leading into a
    /// second chamber one board-width long.
    pub fn outline_vertices(&self) -> [Point; 9] {
        let s = self.scale;
        let b = self.board_size;
        let l = self.slot_size;
        let (ox, oy) = (self.offset_x, self.offset_y);

        let right = ox + b * s;
        let far_right = ox + 2.0 * b * s;
        let bottom = oy + b * s;
        let slot_top = oy + ((b - l) / 2.0) * s;
        let slot_bottom = oy + ((b + l) / 2.0) * s;

        [
            Point::new(ox, oy),
            Point::new(right, oy),
            Point::new(right, slot_top),
            Point::new(far_right, slot_top),
            Point::new(far_right, slot_bottom),
            Point::new(right, slot_bottom),
            Point::new(right, bottom),
            Point::new(ox, bottom),
            Point::new(ox, oy),
        ]
    }

    /// The outline as a closed path.
    pub fn outline_path(&self) -> BezPath {
        let vertices = self.outline_vertices();
        let mut path = BezPath::new();
        path.move_to(vertices[0]);
        for v in &vertices[1..vertices.len() - 1] {
            path.line_to(*v);
        }
        path.close_path();
        path
    }
}

/// Font size for a particle id label: 1.5x the pixel radius, never below 8px.
pub fn label_font_px(radius_px: f64) -> f64 {
    (radius_px * 1.5).max(8.0)
}

/// Line width of the board outline in pixels.
pub const OUTLINE_WIDTH_PX: f64 = 2.0;

#[cfg(test)]
#[path = "../../tests/unit/render/mapping.rs"]
mod tests;
