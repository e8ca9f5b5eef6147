//! Named paragraph styles and the table theme
//!
//! Every style referenced by a block must be defined here when the document
//! is rendered. Resolution never falls back to a default style.

use crate::document_model::{Alignment, RunOverrides, Rgb};
use crate::error::DocumentError;
use std::collections::BTreeMap;

/// Highest heading level with a built-in style (`Heading9`)
pub const MAX_HEADING_LEVEL: u8 = 9;

/// Style of a level-0 heading
pub const TITLE_STYLE: &str = "Title";

/// Name of the style used by a heading of the given level
///
/// Level 0 is the document title.
pub fn heading_style_name(level: u8) -> String {
    if level == 0 {
        TITLE_STYLE.to_string()
    } else {
        format!("Heading{}", level)
    }
}

/// Heading level a style name stands for, if it is a built-in heading style
///
/// `Title` is level 0 and `Heading1`-`Heading9` are levels 1-9.
pub fn heading_level_of_style(name: &str) -> Option<u8> {
    if name == TITLE_STYLE {
        return Some(0);
    }
    name.strip_prefix("Heading")
        .and_then(|digits| digits.parse::<u8>().ok())
        .filter(|level| (1..=MAX_HEADING_LEVEL).contains(level))
}

/// Visual attributes of one named style
#[derive(Debug, Clone, PartialEq)]
pub struct StyleAttributes {
    /// Font family (e.g., "Calibri")
    pub font_family: String,

    /// Font size in points
    pub size_pt: f32,

    /// Text color
    pub color: Rgb,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Paragraph alignment
    pub alignment: Alignment,
}

impl StyleAttributes {
    /// Create plain, black, left-aligned attributes
    pub fn new(font_family: impl Into<String>, size_pt: f32) -> Self {
        Self {
            font_family: font_family.into(),
            size_pt,
            color: Rgb::BLACK,
            bold: false,
            italic: false,
            alignment: Alignment::Left,
        }
    }

    /// Make the style bold
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Make the style italic
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Set the text color
    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Set the paragraph alignment
    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Font size in half-points, the unit OOXML uses for `w:sz`
    pub fn half_points(&self) -> u32 {
        (self.size_pt * 2.0).round().max(1.0) as u32
    }

    /// Layer run-level overrides on top of these attributes
    pub fn with_overrides(&self, overrides: &RunOverrides) -> StyleAttributes {
        StyleAttributes {
            font_family: self.font_family.clone(),
            size_pt: overrides.size_pt.unwrap_or(self.size_pt),
            color: overrides.color.unwrap_or(self.color),
            bold: overrides.bold.unwrap_or(self.bold),
            italic: overrides.italic.unwrap_or(self.italic),
            alignment: self.alignment,
        }
    }
}

/// Border and shading theme applied to every table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTheme {
    /// Color of all table borders
    pub border_color: Rgb,

    /// Border width in eighths of a point
    pub border_size: u8,

    /// Background fill of header cells, `None` for no shading
    pub header_fill: Option<Rgb>,

    /// Horizontal placement of the table on the page
    pub alignment: Alignment,
}

impl Default for TableTheme {
    fn default() -> Self {
        Self {
            border_color: Rgb(0x4F, 0x81, 0xBD),
            border_size: 4,
            header_fill: Some(Rgb(0xDB, 0xE5, 0xF1)),
            alignment: Alignment::Center,
        }
    }
}

/// Named collection of style definitions
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    styles: BTreeMap<String, StyleAttributes>,
    table_theme: TableTheme,
}

impl StyleSheet {
    /// Create a style sheet without any style defined
    pub fn empty() -> Self {
        Self {
            styles: BTreeMap::new(),
            table_theme: TableTheme::default(),
        }
    }

    /// Register a style, replacing any existing definition with the same name
    ///
    /// The replacement is whole; attributes are never merged.
    ///
    /// # Returns
    /// * `Some(StyleAttributes)` - The definition that was replaced
    /// * `None` - The name was not defined before
    pub fn define(
        &mut self,
        name: impl Into<String>,
        attributes: StyleAttributes,
    ) -> Option<StyleAttributes> {
        self.styles.insert(name.into(), attributes)
    }

    /// Look up a style by name
    ///
    /// # Returns
    /// * `Ok(&StyleAttributes)` - The style definition
    /// * `Err(DocumentError::UnknownStyle)` - No style with that name exists
    pub fn resolve(&self, name: &str) -> Result<&StyleAttributes, DocumentError> {
        self.styles
            .get(name)
            .ok_or_else(|| DocumentError::UnknownStyle {
                name: name.to_string(),
            })
    }

    /// Check if a style is defined
    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    /// Highest `n` such that `Heading1` through `Heading{n}` are all defined
    pub fn max_heading_level(&self) -> u8 {
        (1..=MAX_HEADING_LEVEL)
            .take_while(|level| self.contains(&heading_style_name(*level)))
            .last()
            .unwrap_or(0)
    }

    /// Styles in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleAttributes)> {
        self.styles.iter().map(|(name, attrs)| (name.as_str(), attrs))
    }

    /// Number of defined styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if no style is defined
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// The table theme
    pub fn table_theme(&self) -> &TableTheme {
        &self.table_theme
    }

    /// Replace the table theme
    pub fn set_table_theme(&mut self, theme: TableTheme) {
        self.table_theme = theme;
    }
}

impl Default for StyleSheet {
    /// Built-in styles: `Normal`, `Title`, `Heading1`-`Heading9`,
    /// `ListBullet` and `ListNumber`
    fn default() -> Self {
        const FONT: &str = "Calibri";
        let accent = Rgb(0x4F, 0x81, 0xBD);
        let dark_accent = Rgb(0x24, 0x3F, 0x60);
        let grey = Rgb(0x40, 0x40, 0x40);

        let mut sheet = Self::empty();
        let normal = StyleAttributes::new(FONT, 11.0);

        sheet.define("Normal", normal.clone());
        sheet.define("ListBullet", normal.clone());
        sheet.define("ListNumber", normal);
        sheet.define(
            "Title",
            StyleAttributes::new(FONT, 26.0).color(Rgb(0x17, 0x36, 0x5D)),
        );

        // Progressively smaller and lighter with depth
        let headings = [
            StyleAttributes::new(FONT, 14.0).bold().color(Rgb(0x36, 0x5F, 0x91)),
            StyleAttributes::new(FONT, 13.0).bold().color(accent),
            StyleAttributes::new(FONT, 11.0).bold().color(accent),
            StyleAttributes::new(FONT, 11.0).bold().italic().color(accent),
            StyleAttributes::new(FONT, 11.0).color(dark_accent),
            StyleAttributes::new(FONT, 11.0).italic().color(dark_accent),
            StyleAttributes::new(FONT, 11.0).italic().color(grey),
            StyleAttributes::new(FONT, 10.0).color(grey),
            StyleAttributes::new(FONT, 10.0).italic().color(grey),
        ];
        for (level, attrs) in (1..=MAX_HEADING_LEVEL).zip(headings) {
            sheet.define(heading_style_name(level), attrs);
        }

        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles_exist() {
        let sheet = StyleSheet::default();
        for name in ["Normal", "Title", "ListBullet", "ListNumber", "Heading1", "Heading9"] {
            assert!(sheet.contains(name), "missing default style {}", name);
        }
        assert_eq!(sheet.len(), 13);
        assert_eq!(sheet.max_heading_level(), 9);
        assert!(sheet.resolve("Heading1").unwrap().bold);
    }

    #[test]
    fn test_resolve_unknown_style_fails() {
        let sheet = StyleSheet::default();
        match sheet.resolve("Callout") {
            Err(DocumentError::UnknownStyle { name }) => assert_eq!(name, "Callout"),
            other => panic!("expected UnknownStyle, got {:?}", other),
        }
        assert!(StyleSheet::empty().resolve("Normal").is_err());
    }

    #[test]
    fn test_define_overwrites_whole_definition() {
        let mut sheet = StyleSheet::default();
        let replaced = sheet.define("Heading1", StyleAttributes::new("Arial", 20.0));

        assert!(replaced.unwrap().bold);
        let heading = sheet.resolve("Heading1").unwrap();
        assert_eq!(heading.font_family, "Arial");
        // Not merged with the previous bold definition
        assert!(!heading.bold);
        assert_eq!(heading.color, Rgb::BLACK);
    }

    #[test]
    fn test_max_heading_level_requires_contiguous_levels() {
        let mut sheet = StyleSheet::empty();
        assert_eq!(sheet.max_heading_level(), 0);

        sheet.define("Heading1", StyleAttributes::new("Calibri", 14.0));
        sheet.define("Heading2", StyleAttributes::new("Calibri", 13.0));
        sheet.define("Heading4", StyleAttributes::new("Calibri", 11.0));
        assert_eq!(sheet.max_heading_level(), 2);
    }

    #[test]
    fn test_overrides_layer_on_base() {
        let base = StyleAttributes::new("Calibri", 11.0).align(Alignment::Center);
        let overrides = RunOverrides {
            bold: Some(true),
            size_pt: Some(14.0),
            ..Default::default()
        };

        let effective = base.with_overrides(&overrides);
        assert!(effective.bold);
        assert!(!effective.italic);
        assert_eq!(effective.size_pt, 14.0);
        assert_eq!(effective.half_points(), 28);
        assert_eq!(effective.alignment, Alignment::Center);
        assert_eq!(effective.font_family, "Calibri");
    }

    #[test]
    fn test_heading_style_names() {
        assert_eq!(heading_style_name(0), "Title");
        assert_eq!(heading_style_name(3), "Heading3");
        assert_eq!(heading_level_of_style("Title"), Some(0));
        assert_eq!(heading_level_of_style("Heading9"), Some(9));
        assert_eq!(heading_level_of_style("Heading10"), None);
        assert_eq!(heading_level_of_style("Normal"), None);
    }
}
