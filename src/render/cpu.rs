use crate::config::RenderConfig;
use crate::foundation::core::{BezPath, Canvas, Rgba8};
use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};
use crate::render::backend::FrameRGBA;
use crate::render::color::speed_to_color;
use crate::render::mapping::{BoardMapping, OUTLINE_WIDTH_PX, label_font_px};
use crate::render::text::{TextLayoutEngine, resolve_font};
use crate::trajectory::particle::Particle;
use vello_cpu::kurbo::Shape as _;

const COUNTER_FONT_PX: f32 = 20.0;
const COUNTER_ORIGIN: (f64, f64) = (10.0, 10.0);
const CIRCLE_TOLERANCE: f64 = 0.1;

/// CPU frame renderer powered by `vello_cpu`.
///
/// Draw order: black background, white board outline, optional collision counter, particles
/// colored by speed, optional particle ids.
pub struct FrameRenderer {
    canvas: Canvas,
    mapping: BoardMapping,
    outline: vello_cpu::kurbo::BezPath,
    particle_ids: bool,
    max_speed: f64,
    text: Option<TextLayoutEngine>,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl FrameRenderer {
    /// Build a renderer for `cfg`, with colors normalized against `max_speed`.
    ///
    /// Text overlays use the configured font, or a system sans-serif face. Without any usable font
    /// the overlays are skipped.
    pub fn new(cfg: &RenderConfig, max_speed: f64) -> ParticleVideoResult<Self> {
        let text = match resolve_font(cfg.font.as_deref())? {
            Some(font) => Some(TextLayoutEngine::new(font)?),
            None => {
                tracing::warn!("no font available; collision counter and particle ids are not drawn");
                None
            }
        };
        Self::build(cfg, max_speed, text)
    }

    /// Build a renderer that never draws text.
    pub fn without_text(cfg: &RenderConfig, max_speed: f64) -> ParticleVideoResult<Self> {
        Self::build(cfg, max_speed, None)
    }

    fn build(
        cfg: &RenderConfig,
        max_speed: f64,
        text: Option<TextLayoutEngine>,
    ) -> ParticleVideoResult<Self> {
        cfg.validate()?;
        let mapping = BoardMapping::from_config(cfg)?;
        let width: u16 = cfg
            .width
            .try_into()
            .map_err(|_| ParticleVideoError::config("video width exceeds u16"))?;
        let height: u16 = cfg
            .height
            .try_into()
            .map_err(|_| ParticleVideoError::config("video height exceeds u16"))?;

        Ok(Self {
            canvas: cfg.canvas(),
            outline: bezpath_to_cpu(&mapping.outline_path()),
            mapping,
            particle_ids: cfg.particle_ids,
            max_speed,
            text,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Coordinate mapping in use.
    pub fn mapping(&self) -> &BoardMapping {
        &self.mapping
    }

    /// Whether text overlays can be drawn.
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Render one timestep. `collisions` draws the counter overlay when set.
    pub fn render(
        &mut self,
        particles: &[Particle],
        collisions: Option<u64>,
    ) -> ParticleVideoResult<FrameRGBA> {
        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        ctx.set_paint(cpu_color(Rgba8::BLACK));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));

        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(OUTLINE_WIDTH_PX));
        ctx.set_paint(cpu_color(Rgba8::WHITE));
        ctx.stroke_path(&self.outline);

        if let (Some(count), Some(text)) = (collisions, self.text.as_mut()) {
            let block = text.layout(&format!("Collisions: {count}"), COUNTER_FONT_PX, Rgba8::WHITE)?;
            text.draw(ctx, &block, COUNTER_ORIGIN.0, COUNTER_ORIGIN.1);
        }

        for (i, p) in particles.iter().enumerate() {
            let center = self.mapping.map_point(p.x, p.y);
            let radius = self.mapping.map_radius(p.r);
            if radius.is_nan() || radius <= 0.0 {
                continue;
            }

            ctx.set_paint(cpu_color(speed_to_color(p.speed, self.max_speed)));
            let circle = vello_cpu::kurbo::Circle::new((center.x, center.y), radius);
            ctx.fill_path(&circle.to_path(CIRCLE_TOLERANCE));

            if self.particle_ids
                && let Some(text) = self.text.as_mut()
            {
                let block = text.layout(
                    &i.to_string(),
                    label_font_px(radius) as f32,
                    Rgba8::BLACK,
                )?;
                text.draw(
                    ctx,
                    &block,
                    center.x - block.width() / 2.0,
                    center.y - block.height() / 2.0,
                );
            }
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
