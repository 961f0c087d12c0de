use std::borrow::Cow;

use crate::{
    foundation::{
        color::Color,
        core::{Affine, Point},
        error::{BoardError, BoardResult},
    },
    text::{
        font::FontSpec,
        wrap::{ApproxMetrics, TextMeasure},
    },
};

/// Brush carried through Parley layouts; glyph color is applied at draw time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush;

struct RegisteredFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Text shaping for measurement and drawing.
///
/// With registered fonts, lines are shaped with Parley and drawn as glyph runs. Without any,
/// widths come from [`ApproxMetrics`] and nothing is drawn.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    fonts: Vec<RegisteredFont>,
    fallback: ApproxMetrics,
    warned_no_fonts: bool,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: Vec::new(),
            fallback: ApproxMetrics::default(),
            warned_no_fonts: false,
        }
    }

    pub fn with_fallback(mut self, fallback: ApproxMetrics) -> Self {
        self.fallback = fallback;
        self
    }

    /// Register font bytes (TTF/OTF); returns the family name they resolve under.
    pub fn register_font(&mut self, bytes: Vec<u8>) -> BoardResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| BoardError::validation("no font families registered from font bytes"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| BoardError::validation("registered font family has no name"))?
            .to_string();

        tracing::debug!(%family, "registered font");
        self.fonts.push(RegisteredFont {
            family: family.clone(),
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        });
        Ok(family)
    }

    pub fn has_fonts(&self) -> bool {
        !self.fonts.is_empty()
    }

    /// First registered font matching the font's family list, else the first registered font.
    fn resolve(&self, font: &FontSpec) -> Option<(String, vello_cpu::peniko::FontData)> {
        let found = font
            .family_list()
            .find_map(|name| {
                self.fonts
                    .iter()
                    .find(|f| f.family.eq_ignore_ascii_case(name))
            })
            .or_else(|| self.fonts.first())?;
        Some((found.family.clone(), found.data.clone()))
    }

    fn layout_line(&mut self, text: &str, family: String, font: &FontSpec) -> parley::Layout<TextBrush> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size_px as f32));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(font.weight())),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Draw one line with its top-left corner at `origin` (logical pixels under `base`).
    pub(crate) fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        base: Affine,
        text: &str,
        font: &FontSpec,
        color: Color,
        origin: Point,
    ) {
        let Some((family, data)) = self.resolve(font) else {
            if !self.warned_no_fonts {
                tracing::warn!("no fonts registered; text is measured but not drawn");
                self.warned_no_fonts = true;
            }
            return;
        };
        let layout = self.layout_line(text, family, font);

        let transform = base * Affine::translate((origin.x, origin.y));
        ctx.set_transform(vello_cpu::kurbo::Affine::new(transform.as_coeffs()));
        ctx.set_paint(color.to_cpu());
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
}

impl TextMeasure for TextEngine {
    fn line_width(&mut self, text: &str, font: &FontSpec) -> f64 {
        match self.resolve(font) {
            Some((family, _)) => f64::from(self.layout_line(text, family, font).width()),
            None => self.fallback.line_width(text, font),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/engine.rs"]
mod tests;
