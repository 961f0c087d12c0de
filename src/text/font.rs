use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BoardError, BoardResult};

pub const DEFAULT_FONT: &str = "bold 48px ui-sans-serif, system-ui, sans-serif";

/// CSS-style font shorthand: `[style/weight words] <size>px <family list>`.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Words preceding the size, e.g. `bold` or `italic 600`.
    pub prefix: String,
    pub size_px: f64,
    pub families: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            prefix: "bold".to_owned(),
            size_px: 48.0,
            families: "ui-sans-serif, system-ui, sans-serif".to_owned(),
        }
    }
}

impl FontSpec {
    pub fn parse(s: &str) -> BoardResult<Self> {
        let s = s.trim();
        let mut prefix = Vec::new();
        let mut rest = s;
        loop {
            let (word, tail) = match rest.split_once(char::is_whitespace) {
                Some((w, t)) => (w, t.trim_start()),
                None => (rest, ""),
            };
            if word.is_empty() {
                return Err(BoardError::validation(format!(
                    "font \"{s}\" has no pixel size"
                )));
            }
            // `48px/1.2` line-height suffixes are accepted and ignored.
            let size_token = word.split('/').next().unwrap_or(word);
            if let Some(px) = size_token.strip_suffix("px") {
                let size_px = px
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .ok_or_else(|| BoardError::validation(format!("invalid font size \"{word}\"")))?;
                let families = if tail.is_empty() { "sans-serif" } else { tail };
                return Ok(Self {
                    prefix: prefix.join(" "),
                    size_px,
                    families: families.to_owned(),
                });
            }
            prefix.push(word);
            rest = tail;
        }
    }

    pub fn with_size_px(&self, size_px: f64) -> Self {
        Self {
            size_px: size_px.round().max(1.0),
            ..self.clone()
        }
    }

    /// Numeric weight from the prefix; 400 when none is given.
    pub fn weight(&self) -> u16 {
        self.prefix
            .split_whitespace()
            .find_map(|w| match w {
                "normal" => Some(400),
                "bold" | "bolder" => Some(700),
                "lighter" => Some(300),
                _ => w.parse::<u16>().ok().filter(|v| (1..=1000).contains(v)),
            })
            .unwrap_or(400)
    }

    pub fn is_bold(&self) -> bool {
        self.weight() >= 600
    }

    /// Family names without quotes, in preference order.
    pub fn family_list(&self) -> impl Iterator<Item = &str> {
        self.families
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
    }

    /// Line advance: `round(size * 1.2)`.
    pub fn line_height(&self) -> f64 {
        (self.size_px * 1.2).round()
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.prefix.is_empty() {
            write!(f, "{} ", self.prefix)?;
        }
        write!(f, "{}px {}", self.size_px, self.families)
    }
}

impl FromStr for FontSpec {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FontSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FontSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FontSpec::parse(&s).map_err(serde::de::Error::custom)
    }
}
