use crate::foundation::core::Rgba8;
use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};
use anyhow::Context as _;
use std::path::Path;

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Raw font file bytes plus the face index inside the file.
#[derive(Clone, Debug)]
pub(crate) struct FontBytes {
    pub(crate) data: Vec<u8>,
    pub(crate) index: u32,
}

/// Resolve the overlay font: an explicit file, else the system sans-serif face.
///
/// Returns `Ok(None)` when no explicit font is given and the system has no fonts.
pub(crate) fn resolve_font(explicit: Option<&Path>) -> ParticleVideoResult<Option<FontBytes>> {
    if let Some(path) = explicit {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font file '{}'", path.display()))?;
        return Ok(Some(FontBytes { data, index: 0 }));
    }

    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let query = usvg::fontdb::Query {
        families: &[
            usvg::fontdb::Family::SansSerif,
            usvg::fontdb::Family::Serif,
            usvg::fontdb::Family::Monospace,
        ],
        ..Default::default()
    };
    let Some(id) = db.query(&query).or_else(|| db.faces().next().map(|f| f.id)) else {
        return Ok(None);
    };
    Ok(db.with_face_data(id, |data, index| FontBytes {
        data: data.to_vec(),
        index,
    }))
}

/// Laid-out text ready to draw at a pixel origin.
pub(crate) struct TextBlock {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
}

impl TextBlock {
    pub(crate) fn width(&self) -> f64 {
        f64::from(self.layout.width())
    }

    pub(crate) fn height(&self) -> f64 {
        f64::from(self.layout.height())
    }
}

/// Parley contexts bound to a single registered font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl TextLayoutEngine {
    /// Register `font` and keep it for every subsequent layout.
    pub(crate) fn new(font: FontBytes) -> ParticleVideoResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.data.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ParticleVideoError::render("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ParticleVideoError::render("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font.data),
                font.index,
            ),
        })
    }

    /// Shape a single line of text.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        color: Rgba8,
    ) -> ParticleVideoResult<TextBlock> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ParticleVideoError::render(
                "text size must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(
            color,
        )));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(TextBlock { layout })
    }

    /// Fill the glyphs of `block` with its top-left corner at `(x, y)`.
    pub(crate) fn draw(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        block: &TextBlock,
        x: f64,
        y: f64,
    ) {
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
        for line in block.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}
