use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(Color::parse("#ffffff").unwrap(), Color::WHITE);
    assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);

    let c = Color::parse("#0000ff80").unwrap();
    assert!((c.b - 1.0).abs() < 1e-9);
    assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);

    assert!(Color::parse("#12345").is_err());
    assert!(Color::parse("#gggggg").is_err());
}

#[test]
fn parses_rgba_function() {
    let c = Color::parse("rgba(17, 24, 39, 0.22)").unwrap();
    assert_eq!(c.to_straight_rgba8(), [17, 24, 39, 56]);

    let c = Color::parse("rgb(255 0 0)").unwrap();
    assert_eq!(c.to_straight_rgba8(), [255, 0, 0, 255]);
}

#[test]
fn parses_hsl_and_keywords() {
    let c = Color::parse("hsl(0, 100%, 50%)").unwrap();
    assert_eq!(c.to_straight_rgba8(), [255, 0, 0, 255]);
    assert_eq!(Color::parse("White").unwrap(), Color::WHITE);
    assert!(Color::parse("chartreuse-ish").is_err());
}

#[test]
fn serde_uses_css_strings() {
    let c: Color = serde_json::from_value(json!("#111827")).unwrap();
    assert_eq!(c.to_straight_rgba8(), [17, 24, 39, 255]);
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#111827"));

    let c: Color = serde_json::from_value(json!({"r": 0.0, "g": 0.0, "b": 1.0})).unwrap();
    assert_eq!(c, Color::rgba(0.0, 0.0, 1.0, 1.0));
}
