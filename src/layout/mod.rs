//! Block layout: paragraphs and rules flowing through column frames.
//!
//! Blocks are the auto-paginated content model: a paragraph of styled
//! spans, or a horizontal rule. The frame filler distributes their
//! lines over columns and pages, honoring orphan/widow avoidance.

pub mod frame;
pub mod pages;

pub use frame::{fill_blocks, Column, LaidPage};
pub use pages::{AutoPage, Page, PageTemplate, Rotation};

use crate::geom::{Pt, Sides};
use crate::style::{Rgb, Span, Style};

/// Horizontal alignment of paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Ragged right
    #[default]
    Left,
    /// Centered
    Center,
    /// Ragged left
    Right,
    /// Both edges flush; the last line stays left-aligned
    Justify,
}

/// A block-level element laid out by [`AutoPage`].
#[derive(Debug, Clone)]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),
    /// A horizontal rule
    Rule(Rule),
}

impl From<Paragraph> for Block {
    fn from(p: Paragraph) -> Self {
        Block::Paragraph(p)
    }
}

impl From<Rule> for Block {
    fn from(r: Rule) -> Self {
        Block::Rule(r)
    }
}

impl From<&str> for Block {
    fn from(text: &str) -> Self {
        Block::Paragraph(Paragraph::new(text))
    }
}

/// A paragraph of styled text.
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// Content spans
    pub spans: Vec<Span>,
    /// Style applied over the document style
    pub style: Style,
    /// Horizontal alignment
    pub align: Align,
    /// First-line indent in points
    pub indent: Pt,
    /// Use the optimum-fit (Knuth–Plass) breaker
    pub optimal: bool,
    /// Avoid orphan and widow lines at frame boundaries
    pub avoid_orphans: bool,
}

impl Paragraph {
    /// A left-aligned paragraph with default style, using the optimal
    /// breaker and orphan avoidance.
    pub fn new(content: impl Into<Span>) -> Self {
        Self {
            spans: vec![content.into()],
            style: Style::new(),
            align: Align::Left,
            indent: 0.0,
            optimal: true,
            avoid_orphans: true,
        }
    }

    /// A paragraph from multiple spans.
    pub fn from_spans(spans: Vec<Span>) -> Self {
        Self {
            spans,
            ..Self::new("")
        }
    }

    /// Set the paragraph style.
    pub fn with_style(mut self, style: impl Into<Style>) -> Self {
        self.style = style.into();
        self
    }

    /// Set the alignment.
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Set the first-line indent.
    pub fn with_indent(mut self, indent: Pt) -> Self {
        self.indent = indent;
        self
    }

    /// Choose between the optimal and the greedy breaker.
    pub fn with_optimal(mut self, optimal: bool) -> Self {
        self.optimal = optimal;
        self
    }

    /// Enable or disable orphan/widow avoidance.
    pub fn with_avoid_orphans(mut self, avoid: bool) -> Self {
        self.avoid_orphans = avoid;
        self
    }
}

/// A horizontal rule spanning the column width.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Space around the rule
    pub margin: Sides,
    /// Stroke color
    pub stroke_color: Rgb,
    /// Stroke width in points
    pub stroke_width: Pt,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            margin: Sides::new(6.0, 0.0, 6.0, 0.0),
            stroke_color: Rgb::BLACK,
            stroke_width: 1.0,
        }
    }
}

impl Rule {
    /// A black 1pt rule with 6pt vertical margins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the margins.
    pub fn with_margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    /// Set the stroke color.
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.stroke_color = color;
        self
    }

    /// Set the stroke width.
    pub fn with_width(mut self, width: Pt) -> Self {
        self.stroke_width = width;
        self
    }

    /// Total height the rule consumes in a column.
    pub fn height(&self) -> Pt {
        self.margin.top + self.stroke_width + self.margin.bottom
    }
}
