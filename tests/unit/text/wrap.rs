use super::*;

/// Every character is 10px wide.
struct Mono;

impl TextMeasure for Mono {
    fn line_width(&mut self, text: &str, _font: &FontSpec) -> f64 {
        text.chars().count() as f64 * 10.0
    }
}

fn font() -> FontSpec {
    FontSpec::parse("20px sans-serif").unwrap()
}

#[test]
fn limit_clamps_to_surface_and_floor() {
    assert_eq!(wrap_limit(None, 800.0), 784.0);
    assert_eq!(wrap_limit(Some(300.0), 800.0), 300.0);
    assert_eq!(wrap_limit(Some(2000.0), 800.0), 784.0);
    assert_eq!(wrap_limit(Some(50.0), 800.0), 120.0);
    assert_eq!(wrap_limit(None, 100.0), 120.0);
    assert_eq!(wrap_limit(Some(0.0), 800.0), 784.0);
}

#[test]
fn greedy_wrap_breaks_between_words() {
    // Limit 120px = 12 chars.
    let w = wrap_text(&mut Mono, "aaaa bbbb cccc dddd", &font(), Some(120.0), 800.0);
    assert_eq!(w.lines, ["aaaa bbbb", "cccc dddd"]);
    assert_eq!(w.width, 90.0);
    assert_eq!(w.line_height, 24.0);
    assert_eq!(w.height, 48.0);
    assert_eq!(w.limit, 120.0);
}

#[test]
fn overlong_single_word_stays_on_its_own_line() {
    let w = wrap_text(&mut Mono, "tiny enormouslylongword x", &font(), Some(120.0), 800.0);
    assert_eq!(w.lines, ["tiny", "enormouslylongword", "x"]);
    assert_eq!(w.width, 180.0);
}

#[test]
fn empty_and_whitespace_text_has_no_lines() {
    let w = wrap_text(&mut Mono, "   \n ", &font(), None, 800.0);
    assert!(w.lines.is_empty());
    assert_eq!((w.width, w.height), (0.0, 0.0));
}

#[test]
fn approx_metrics_are_deterministic_and_weight_aware() {
    let mut m = ApproxMetrics::default();
    let regular = FontSpec::parse("10px serif").unwrap();
    let bold = FontSpec::parse("bold 10px serif").unwrap();
    assert!((m.line_width("abcd", &regular) - 22.0).abs() < 1e-9);
    assert!((m.line_width("abcd", &bold) - 24.0).abs() < 1e-9);
}
