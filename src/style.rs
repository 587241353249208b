//! Text styling: colors, styles and the span tree.
//!
//! A [`Style`] leaves every option unset by default; styles compose by
//! right-biased override, and a fully-resolved [`StyleResolved`] is
//! what the shaper consumes. Content is a recursive [`Span`] tree of
//! plain strings and styled nodes; flattening yields styled text runs
//! in document order.

use crate::error::{Error, Result};
use crate::fonts::{helvetica, Font, Typeface};
use crate::geom::Pt;
use crate::text::hyphenate::Hyphens;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red component
    pub r: f64,
    /// Green component
    pub g: f64,
    /// Blue component
    pub b: f64,
}

impl Rgb {
    /// Black, the default text color.
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Create a color, clamping components into `[0, 1]`.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }
}

impl From<(f64, f64, f64)> for Rgb {
    fn from((r, g, b): (f64, f64, f64)) -> Self {
        Rgb::new(r, g, b)
    }
}

/// Settings for the visual style of text. All fields are optional;
/// unset fields inherit from the surrounding style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// Typeface to use
    pub font: Option<Typeface>,
    /// Font size in points (must be positive)
    pub size: Option<Pt>,
    /// Bold variant selection
    pub bold: Option<bool>,
    /// Italic variant selection
    pub italic: Option<bool>,
    /// Text color
    pub color: Option<Rgb>,
    /// Line spacing as a multiple of the font size
    pub line_spacing: Option<f64>,
    /// Hyphenation setting
    pub hyphens: Option<Hyphens>,
}

impl Style {
    /// A style with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the typeface.
    pub fn with_font(mut self, font: Typeface) -> Self {
        self.font = Some(font);
        self
    }

    /// Set the font size in points.
    pub fn with_size(mut self, size: Pt) -> Self {
        self.size = Some(size);
        self
    }

    /// Select the bold variant.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Select the italic variant.
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Set the text color.
    pub fn with_color(mut self, color: impl Into<Rgb>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the line spacing ratio.
    pub fn with_line_spacing(mut self, ratio: f64) -> Self {
        self.line_spacing = Some(ratio);
        self
    }

    /// Set the hyphenation provider.
    pub fn with_hyphens(mut self, hyphens: Hyphens) -> Self {
        self.hyphens = Some(hyphens);
        self
    }

    /// Disable hyphenation.
    pub fn without_hyphens(mut self) -> Self {
        self.hyphens = Some(Hyphens::Off);
        self
    }

    /// Right-biased composition: fields set on `self` win over `base`.
    pub fn over(&self, base: &Style) -> Style {
        Style {
            font: self.font.clone().or_else(|| base.font.clone()),
            size: self.size.or(base.size),
            bold: self.bold.or(base.bold),
            italic: self.italic.or(base.italic),
            color: self.color.or(base.color),
            line_spacing: self.line_spacing.or(base.line_spacing),
            hyphens: self.hyphens.clone().or_else(|| base.hyphens.clone()),
        }
    }

    /// Resolve against a fully-resolved base style.
    pub fn resolve(&self, base: &StyleResolved) -> Result<StyleResolved> {
        if let Some(size) = self.size {
            if !(size > 0.0) {
                return Err(Error::InvalidInput(format!(
                    "font size must be positive, got {size}"
                )));
            }
        }
        if let Some(spacing) = self.line_spacing {
            if !(spacing > 0.0) {
                return Err(Error::InvalidInput(format!(
                    "line spacing must be positive, got {spacing}"
                )));
            }
        }
        Ok(StyleResolved {
            face: self.font.clone().unwrap_or_else(|| base.face.clone()),
            size: self.size.unwrap_or(base.size),
            bold: self.bold.unwrap_or(base.bold),
            italic: self.italic.unwrap_or(base.italic),
            color: self.color.unwrap_or(base.color),
            line_spacing: self.line_spacing.unwrap_or(base.line_spacing),
            hyphens: self.hyphens.clone().unwrap_or_else(|| base.hyphens.clone()),
        })
    }
}

impl From<Typeface> for Style {
    fn from(font: Typeface) -> Self {
        Style::new().with_font(font)
    }
}

impl From<Rgb> for Style {
    fn from(color: Rgb) -> Self {
        Style::new().with_color(color)
    }
}

/// A style with every field resolved; what the shaper works with.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleResolved {
    /// Typeface (variant selected by `bold`/`italic`)
    pub face: Typeface,
    /// Font size in points
    pub size: Pt,
    /// Bold flag
    pub bold: bool,
    /// Italic flag
    pub italic: bool,
    /// Text color
    pub color: Rgb,
    /// Line spacing ratio
    pub line_spacing: f64,
    /// Hyphenation setting
    pub hyphens: Hyphens,
}

impl StyleResolved {
    /// The concrete font variant this style renders with.
    pub fn font(&self) -> &Font {
        self.face.select(self.bold, self.italic)
    }

    /// Baseline-to-baseline distance in points.
    pub fn lead(&self) -> Pt {
        self.size * self.line_spacing
    }

    /// Whether two styles can kern across their boundary (same font
    /// and size).
    pub fn kerns_with(&self, other: &StyleResolved) -> bool {
        self.size == other.size && *self.font() == *other.font()
    }
}

impl Default for StyleResolved {
    /// Helvetica regular, 12 pt, black, line spacing 1.25, English
    /// fallback hyphenation.
    fn default() -> Self {
        Self {
            face: helvetica(),
            size: 12.0,
            bold: false,
            italic: false,
            color: Rgb::BLACK,
            line_spacing: 1.25,
            hyphens: Hyphens::fallback(),
        }
    }
}

/// A fragment of styled content: either a plain string or a styled
/// node with children.
#[derive(Debug, Clone)]
pub enum Span {
    /// Plain text, styled by the surrounding context
    Leaf(String),
    /// A styled node; the style overrides the context for its children
    Node(Style, Vec<Span>),
}

impl Span {
    /// A styled node with the given children.
    pub fn styled(style: impl Into<Style>, children: Vec<Span>) -> Span {
        Span::Node(style.into(), children)
    }

    /// A styled piece of text.
    pub fn text(text: impl Into<String>, style: impl Into<Style>) -> Span {
        Span::Node(style.into(), vec![Span::Leaf(text.into())])
    }
}

impl From<&str> for Span {
    fn from(s: &str) -> Self {
        Span::Leaf(s.to_string())
    }
}

impl From<String> for Span {
    fn from(s: String) -> Self {
        Span::Leaf(s)
    }
}

/// Flatten a span tree into styled text runs in document order.
///
/// The fold threads a resolved style accumulator through the tree:
/// each node resolves its style against the inherited one and passes
/// the result down.
pub fn flatten(spans: &[Span], base: &StyleResolved) -> Result<Vec<(String, StyleResolved)>> {
    let mut runs = Vec::new();
    flatten_into(spans, base, &mut runs)?;
    Ok(runs)
}

fn flatten_into(
    spans: &[Span],
    base: &StyleResolved,
    out: &mut Vec<(String, StyleResolved)>,
) -> Result<()> {
    for span in spans {
        match span {
            Span::Leaf(text) => {
                if !text.is_empty() {
                    out.push((text.clone(), base.clone()));
                }
            },
            Span::Node(style, children) => {
                let resolved = style.resolve(base)?;
                flatten_into(children, &resolved, out)?;
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::times_roman;

    #[test]
    fn test_style_composition_child_wins() {
        let parent = Style::new().with_size(14.0).with_bold(true);
        let child = Style::new().with_size(24.0);
        let merged = child.over(&parent);
        assert_eq!(merged.size, Some(24.0));
        assert_eq!(merged.bold, Some(true));
    }

    #[test]
    fn test_resolve_inherits_unset_fields() {
        let base = StyleResolved::default();
        let resolved = Style::new().with_bold(true).resolve(&base).unwrap();
        assert!(resolved.bold);
        assert_eq!(resolved.size, 12.0);
        assert_eq!(resolved.color, Rgb::BLACK);
    }

    #[test]
    fn test_resolve_rejects_bad_size() {
        let base = StyleResolved::default();
        assert!(Style::new().with_size(0.0).resolve(&base).is_err());
        assert!(Style::new().with_size(-4.0).resolve(&base).is_err());
    }

    #[test]
    fn test_lead_default() {
        assert_eq!(StyleResolved::default().lead(), 15.0);
    }

    #[test]
    fn test_flatten_nested() {
        let base = StyleResolved::default();
        let spans = vec![
            Span::from("plain "),
            Span::styled(
                Style::new().with_size(20.0),
                vec![
                    Span::from("big "),
                    Span::styled(Style::new().with_bold(true), vec![Span::from("bold")]),
                ],
            ),
            Span::from(" tail"),
        ];
        let runs = flatten(&spans, &base).unwrap();
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[0].0, "plain ");
        assert_eq!(runs[1].1.size, 20.0);
        assert!(!runs[1].1.bold);
        assert!(runs[2].1.bold);
        assert_eq!(runs[2].1.size, 20.0);
        assert_eq!(runs[3].1.size, 12.0);
    }

    #[test]
    fn test_rgb_clamps() {
        let c = Rgb::new(1.5, -0.2, 0.5);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
    }

    #[test]
    fn test_typeface_into_style() {
        let style: Style = times_roman().into();
        assert!(style.font.is_some());
        assert!(style.size.is_none());
    }
}
