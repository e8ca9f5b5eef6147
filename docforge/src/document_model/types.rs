//! Shared type definitions

use crate::error::InvalidColor;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Value of the OOXML `w:jc` attribute for this alignment
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Kind of list a list item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Bulleted list
    Bullet,
    /// Numbered list (decimal at the first level)
    Numbered,
}

impl ListKind {
    /// Name of the style a list item of this kind is rendered with
    pub fn style_name(self) -> &'static str {
        match self {
            ListKind::Bullet => "ListBullet",
            ListKind::Numbered => "ListNumber",
        }
    }
}

/// An RGB color triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

    /// Uppercase `RRGGBB` form, as OOXML expects in `w:val` / `w:fill`
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

impl FromStr for Rgb {
    type Err = InvalidColor;

    /// Parse `RRGGBB`, optionally prefixed with `#`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidColor(s.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| InvalidColor(s.to_string()))
        };

        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_parse_and_hex() {
        let gold: Rgb = "#F0B90B".parse().unwrap();
        assert_eq!(gold, Rgb(0xF0, 0xB9, 0x0B));
        assert_eq!(gold.hex(), "F0B90B");
        assert_eq!("333333".parse::<Rgb>().unwrap(), Rgb(0x33, 0x33, 0x33));
        assert_eq!(gold.to_string(), "#F0B90B");
    }

    #[test]
    fn test_rgb_rejects_malformed() {
        assert!("F0B90".parse::<Rgb>().is_err());
        assert!("GGGGGG".parse::<Rgb>().is_err());
        assert_eq!(
            "red".parse::<Rgb>(),
            Err(InvalidColor("red".to_string()))
        );
    }

    #[test]
    fn test_alignment_ooxml_values() {
        assert_eq!(Alignment::default(), Alignment::Left);
        assert_eq!(Alignment::Justify.as_ooxml(), "both");
        assert_eq!(Alignment::Center.as_ooxml(), "center");
    }
}
