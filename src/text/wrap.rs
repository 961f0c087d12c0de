use crate::text::font::FontSpec;

/// Measures the advance width of a single line of text.
pub trait TextMeasure {
    fn line_width(&mut self, text: &str, font: &FontSpec) -> f64;
}

/// Deterministic width estimate used when no font is registered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApproxMetrics {
    pub advance_em: f64,
    pub bold_advance_em: f64,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            advance_em: 0.55,
            bold_advance_em: 0.6,
        }
    }
}

impl TextMeasure for ApproxMetrics {
    fn line_width(&mut self, text: &str, font: &FontSpec) -> f64 {
        let em = if font.is_bold() {
            self.bold_advance_em
        } else {
            self.advance_em
        };
        text.chars().count() as f64 * font.size_px * em
    }
}

/// Greedy word-wrapped text block.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Widest line, rounded.
    pub width: f64,
    /// `lines.len() * line_height`.
    pub height: f64,
    pub line_height: f64,
    /// Width lines were wrapped against.
    pub limit: f64,
}

/// Effective wrap width: the requested width capped to the surface minus a 16px gutter,
/// never narrower than 120px.
pub fn wrap_limit(max_width: Option<f64>, surface_width: f64) -> f64 {
    let gutter = surface_width - 16.0;
    max_width
        .filter(|w| *w > 0.0)
        .unwrap_or(gutter)
        .min(gutter)
        .max(120.0)
}

/// Break `text` on whitespace so no line exceeds the wrap limit unless it is a single word.
pub fn wrap_text(
    measure: &mut dyn TextMeasure,
    text: &str,
    font: &FontSpec,
    max_width: Option<f64>,
    surface_width: f64,
) -> WrappedText {
    let limit = wrap_limit(max_width, surface_width);
    let line_height = font.line_height();
    let mut lines = Vec::new();
    let mut widest = 0.0f64;
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_owned()
        } else {
            format!("{line} {word}")
        };
        if !line.is_empty() && measure.line_width(&candidate, font) > limit {
            widest = widest.max(measure.line_width(&line, font));
            lines.push(std::mem::replace(&mut line, word.to_owned()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        widest = widest.max(measure.line_width(&line, font));
        lines.push(line);
    }

    WrappedText {
        width: widest.round(),
        height: (lines.len() as f64 * line_height).round(),
        line_height,
        limit,
        lines,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
