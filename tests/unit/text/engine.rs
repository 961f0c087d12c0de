use super::*;

fn system_font() -> Option<Vec<u8>> {
    [
        "tests/data/fonts/Inconsolata-Regular.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
}

#[test]
fn falls_back_to_approx_metrics_without_fonts() {
    let mut engine = TextEngine::new();
    assert!(!engine.has_fonts());
    let font = FontSpec::parse("10px serif").unwrap();
    assert!((engine.line_width("abcd", &font) - 22.0).abs() < 1e-9);
}

#[test]
fn draw_without_fonts_is_a_no_op() {
    let mut engine = TextEngine::new();
    let mut ctx = vello_cpu::RenderContext::new(8, 8);
    engine.draw_line(
        &mut ctx,
        Affine::IDENTITY,
        "hi",
        &FontSpec::default(),
        Color::BLACK,
        Point::ZERO,
    );
    let mut pixmap = vello_cpu::Pixmap::new(8, 8);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    assert!(pixmap.data_as_u8_slice().iter().all(|&b| b == 0));
}

#[test]
fn registered_font_measures_with_parley() {
    let Some(bytes) = system_font() else {
        return;
    };
    let mut engine = TextEngine::new();
    let family = engine.register_font(bytes).unwrap();
    assert!(!family.trim().is_empty());

    let font = FontSpec::parse(&format!("24px \"{family}\"")).unwrap();
    let short = engine.line_width("ab", &font);
    let long = engine.line_width("abababab", &font);
    assert!(short > 0.0);
    assert!(long > short * 3.0);
}

#[test]
fn rejects_non_font_bytes() {
    let mut engine = TextEngine::new();
    assert!(engine.register_font(b"not a font".to_vec()).is_err());
}
