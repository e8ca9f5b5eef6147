//! Text run representation with inline style overrides
//!
//! A text run is a span of text sharing one set of overrides. The overrides
//! are layered on top of the paragraph's base style when the document is
//! rendered, so a run only records what differs from that style.

use super::types::Rgb;

/// Inline formatting layered on top of a paragraph's base style
///
/// Every field is optional: `None` means "inherit from the base style".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunOverrides {
    /// Bold override
    pub bold: Option<bool>,

    /// Italic override
    pub italic: Option<bool>,

    /// Text color override
    pub color: Option<Rgb>,

    /// Font size override in points
    pub size_pt: Option<f32>,
}

impl RunOverrides {
    /// Check if this run overrides nothing
    pub fn is_empty(&self) -> bool {
        self.bold.is_none() && self.italic.is_none() && self.color.is_none() && self.size_pt.is_none()
    }
}

/// A span of text with consistent formatting
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Inline overrides applied on top of the paragraph style
    pub overrides: RunOverrides,
}

impl TextRun {
    /// Create a new plain text run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            overrides: RunOverrides::default(),
        }
    }

    /// Make this run bold
    pub fn bold(mut self) -> Self {
        self.overrides.bold = Some(true);
        self
    }

    /// Make this run italic
    pub fn italic(mut self) -> Self {
        self.overrides.italic = Some(true);
        self
    }

    /// Set the text color of this run
    pub fn color(mut self, color: Rgb) -> Self {
        self.overrides.color = Some(color);
        self
    }

    /// Set the font size of this run in points
    pub fn size(mut self, size_pt: f32) -> Self {
        self.overrides.size_pt = Some(size_pt);
        self
    }

    /// Check if this text run has any formatting applied
    pub fn has_formatting(&self) -> bool {
        !self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_run_has_no_formatting() {
        let run = TextRun::new("Hello");
        assert_eq!(run.text, "Hello");
        assert!(!run.has_formatting());
    }

    #[test]
    fn test_builder_sets_overrides() {
        let run = TextRun::new("Deployer Address: ")
            .bold()
            .size(13.0)
            .color(Rgb(0xF0, 0xB9, 0x0B));

        assert_eq!(run.overrides.bold, Some(true));
        assert_eq!(run.overrides.italic, None);
        assert_eq!(run.overrides.size_pt, Some(13.0));
        assert_eq!(run.overrides.color, Some(Rgb(0xF0, 0xB9, 0x0B)));
        assert!(run.has_formatting());
    }
}
