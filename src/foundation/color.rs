use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::{
    core::Rgba8Premul,
    error::{BoardError, BoardResult},
};

/// Straight-alpha color with normalized components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// 8-bit channels with alpha in `0..=1`, as written in `rgba(17, 24, 39, 0.22)`.
    pub fn rgba8(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            a.clamp(0.0, 1.0),
        )
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn to_straight_rgba8(self) -> [u8; 4] {
        [
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            to_u8(self.a),
        ]
    }

    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        let [r, g, b, a] = self.to_straight_rgba8();
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }

    pub(crate) fn to_cpu(self) -> vello_cpu::peniko::Color {
        let [r, g, b, a] = self.to_straight_rgba8();
        vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
    }

    /// Parse a CSS color: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`, `hsl()`,
    /// `hsla()` or a handful of keywords.
    pub fn parse(s: &str) -> BoardResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).map_err(BoardError::validation);
        }
        let lower = s.to_ascii_lowercase();
        if let Some((name, args)) = split_function(&lower) {
            return parse_function(name, args).map_err(BoardError::validation);
        }
        named(&lower).ok_or_else(|| BoardError::validation(format!("unknown color \"{s}\"")))
    }
}

fn to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl FromStr for Color {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_straight_rgba8();
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Css(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Css(s) => Color::parse(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Color::rgba(r, g, b, a)),
        }
    }
}

fn parse_hex(s: &str) -> Result<Color, String> {
    fn nibble(c: u8) -> Result<u8, String> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| format!("invalid hex digit '{}'", c as char))
    }

    let bytes = s.as_bytes();
    let channels: Vec<u8> = match bytes.len() {
        3 | 4 => bytes
            .iter()
            .map(|&c| nibble(c).map(|n| n * 17))
            .collect::<Result<_, _>>()?,
        6 | 8 => bytes
            .chunks_exact(2)
            .map(|pair| Ok(nibble(pair[0])? * 16 + nibble(pair[1])?))
            .collect::<Result<_, String>>()?,
        _ => {
            return Err("hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA".to_owned());
        }
    };

    let a = channels.get(3).copied().unwrap_or(255);
    Ok(Color::rgba(
        f64::from(channels[0]) / 255.0,
        f64::from(channels[1]) / 255.0,
        f64::from(channels[2]) / 255.0,
        f64::from(a) / 255.0,
    ))
}

fn split_function(s: &str) -> Option<(&str, &str)> {
    let open = s.find('(')?;
    let inner = s[open + 1..].strip_suffix(')')?;
    Some((s[..open].trim(), inner))
}

fn parse_function(name: &str, args: &str) -> Result<Color, String> {
    let parts: Vec<&str> = args
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("{name}() expects 3 or 4 components"));
    }
    let alpha = match parts.get(3) {
        Some(p) => parse_component(p, 1.0)?,
        None => 1.0,
    };

    match name {
        "rgb" | "rgba" => {
            let r = parse_component(parts[0], 255.0)?;
            let g = parse_component(parts[1], 255.0)?;
            let b = parse_component(parts[2], 255.0)?;
            Ok(Color::rgba(r / 255.0, g / 255.0, b / 255.0, alpha))
        }
        "hsl" | "hsla" => {
            let h = parts[0]
                .trim_end_matches("deg")
                .parse::<f64>()
                .map_err(|_| format!("invalid hue \"{}\"", parts[0]))?;
            let s = parse_component(parts[1], 1.0)?;
            let l = parse_component(parts[2], 1.0)?;
            Ok(hsla_to_rgba(h, s, l, alpha))
        }
        _ => Err(format!("unsupported color function \"{name}\"")),
    }
}

/// Parse a number or percentage; percentages are relative to `full`.
fn parse_component(p: &str, full: f64) -> Result<f64, String> {
    if let Some(pct) = p.strip_suffix('%') {
        let v = pct
            .parse::<f64>()
            .map_err(|_| format!("invalid percentage \"{p}\""))?;
        return Ok((v / 100.0 * full).clamp(0.0, full));
    }
    let v = p
        .parse::<f64>()
        .map_err(|_| format!("invalid number \"{p}\""))?;
    Ok(v.clamp(0.0, full))
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> Color {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    if s == 0.0 {
        return Color::rgba(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    Color::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}

fn named(s: &str) -> Option<Color> {
    let c = match s {
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        "transparent" => Color::rgba(0.0, 0.0, 0.0, 0.0),
        "red" => Color::rgba(1.0, 0.0, 0.0, 1.0),
        "green" => Color::rgba(0.0, 128.0 / 255.0, 0.0, 1.0),
        "blue" => Color::rgba(0.0, 0.0, 1.0, 1.0),
        "gray" | "grey" => Color::rgba(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0, 1.0),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
