//! Absolutely positioned drawables.
//!
//! Pages can carry content at fixed positions: stroked lines, rects,
//! ellipses, and text boxes. Text boxes reuse the paragraph pipeline
//! at a fixed width, without pagination.

use crate::error::Result;
use crate::geom::{Point, Pt};
use crate::layout::frame::line_segments;
use crate::layout::Align;
use crate::style::{flatten, Rgb, Span, Style, StyleResolved};
use crate::text::linebreak::{break_lines, BreakParams};
use crate::text::shape::{shape_paragraph, ShapeReport};
use crate::writer::content::{PageItem, PlacedLine, Shape, TextBlock};

/// Something that can be drawn at a fixed position on a page.
#[derive(Debug, Clone)]
pub enum Drawable {
    /// A stroked straight line
    Line(Line),
    /// A rectangle
    Rect(Rect),
    /// An ellipse
    Ellipse(Ellipse),
    /// A block of text at a fixed position
    TextBox(TextBox),
}

/// A straight stroked line between two points.
#[derive(Debug, Clone)]
pub struct Line {
    /// Start point
    pub from: Point,
    /// End point
    pub to: Point,
    /// Stroke color
    pub stroke: Rgb,
    /// Stroke width in points
    pub stroke_width: Pt,
}

impl Line {
    /// A black 1pt line.
    pub fn new(from: impl Into<Point>, to: impl Into<Point>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            stroke: Rgb::BLACK,
            stroke_width: 1.0,
        }
    }

    /// Set the stroke color.
    pub fn with_stroke(mut self, color: Rgb) -> Self {
        self.stroke = color;
        self
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone)]
pub struct Rect {
    /// Bottom-left corner
    pub origin: Point,
    /// Width in points
    pub width: Pt,
    /// Height in points
    pub height: Pt,
    /// Fill color, if any
    pub fill: Option<Rgb>,
    /// Stroke color, if any
    pub stroke: Option<Rgb>,
    /// Stroke width in points
    pub stroke_width: Pt,
}

impl Rect {
    /// An unfilled, black-stroked rectangle.
    pub fn new(origin: impl Into<Point>, width: Pt, height: Pt) -> Self {
        Self {
            origin: origin.into(),
            width,
            height,
            fill: None,
            stroke: Some(Rgb::BLACK),
            stroke_width: 1.0,
        }
    }

    /// Set the fill color.
    pub fn with_fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    /// Set the stroke color, or `None` to disable stroking.
    pub fn with_stroke(mut self, color: Option<Rgb>) -> Self {
        self.stroke = color;
        self
    }
}

/// An axis-aligned ellipse.
#[derive(Debug, Clone)]
pub struct Ellipse {
    /// Center point
    pub center: Point,
    /// Horizontal radius
    pub rx: Pt,
    /// Vertical radius
    pub ry: Pt,
    /// Fill color, if any
    pub fill: Option<Rgb>,
    /// Stroke color, if any
    pub stroke: Option<Rgb>,
    /// Stroke width in points
    pub stroke_width: Pt,
}

impl Ellipse {
    /// An unfilled, black-stroked ellipse.
    pub fn new(center: impl Into<Point>, rx: Pt, ry: Pt) -> Self {
        Self {
            center: center.into(),
            rx,
            ry,
            fill: None,
            stroke: Some(Rgb::BLACK),
            stroke_width: 1.0,
        }
    }

    /// Set the fill color.
    pub fn with_fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }
}

/// Text drawn at a fixed position.
///
/// With a width the text wraps inside `[origin.x, origin.x + width]`;
/// without one, only hard newlines break lines and `origin` anchors
/// the first baseline according to the alignment.
#[derive(Debug, Clone)]
pub struct TextBox {
    /// First baseline anchor (left edge for left-aligned text)
    pub origin: Point,
    /// Content spans
    pub spans: Vec<Span>,
    /// Style applied over the document style
    pub style: Style,
    /// Horizontal alignment
    pub align: Align,
    /// Wrapping width in points, if the text should wrap
    pub width: Option<Pt>,
}

impl TextBox {
    /// An unwrapped, left-aligned text box.
    pub fn new(origin: impl Into<Point>, content: impl Into<Span>) -> Self {
        Self {
            origin: origin.into(),
            spans: vec![content.into()],
            style: Style::new(),
            align: Align::Left,
            width: None,
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: impl Into<Style>) -> Self {
        self.style = style.into();
        self
    }

    /// Set the alignment.
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Set a wrapping width.
    pub fn with_width(mut self, width: Pt) -> Self {
        self.width = Some(width);
        self
    }
}

impl From<Line> for Drawable {
    fn from(v: Line) -> Self {
        Drawable::Line(v)
    }
}

impl From<Rect> for Drawable {
    fn from(v: Rect) -> Self {
        Drawable::Rect(v)
    }
}

impl From<Ellipse> for Drawable {
    fn from(v: Ellipse) -> Self {
        Drawable::Ellipse(v)
    }
}

impl From<TextBox> for Drawable {
    fn from(v: TextBox) -> Self {
        Drawable::TextBox(v)
    }
}

impl Drawable {
    /// Render into display-list items.
    pub fn render(&self, base: &StyleResolved, report: &mut ShapeReport) -> Result<Vec<PageItem>> {
        match self {
            Drawable::Line(l) => Ok(vec![PageItem::Shape(Shape::Line {
                from: l.from,
                to: l.to,
                color: l.stroke,
                width: l.stroke_width,
            })]),
            Drawable::Rect(r) => Ok(vec![PageItem::Shape(Shape::Rect {
                origin: r.origin,
                width: r.width,
                height: r.height,
                fill: r.fill,
                stroke: r.stroke.map(|c| (c, r.stroke_width)),
            })]),
            Drawable::Ellipse(e) => Ok(vec![PageItem::Shape(Shape::Ellipse {
                center: e.center,
                rx: e.rx,
                ry: e.ry,
                fill: e.fill,
                stroke: e.stroke.map(|c| (c, e.stroke_width)),
            })]),
            Drawable::TextBox(t) => t.render(base, report),
        }
    }
}

impl TextBox {
    fn render(&self, base: &StyleResolved, report: &mut ShapeReport) -> Result<Vec<PageItem>> {
        let style = self.style.resolve(base)?;
        let runs = flatten(&self.spans, &style)?;
        let justify = self.align == Align::Justify;
        let (atoms, shape_report) = shape_paragraph(&runs, justify);
        report.merge(shape_report);

        // Without a width, lines break only at hard newlines.
        let wrap = self.width.unwrap_or(f64::MAX);
        let lines = break_lines(&atoms, &|_| wrap, self.width.is_some(), &BreakParams::default());

        let mut placed = Vec::with_capacity(lines.len());
        let mut baseline = self.origin.y;
        let fallback_lead = style.lead();
        for (i, line) in lines.iter().enumerate() {
            if line.overfull {
                report.overfull_lines += 1;
            }
            let (segments, visual_width) = line_segments(&atoms, line, self.align);
            let lead = segments_lead(&atoms, line, fallback_lead);
            if i > 0 {
                baseline -= lead;
            }
            let x = match (self.align, self.width) {
                (Align::Left | Align::Justify, _) => self.origin.x,
                (Align::Center, Some(w)) => self.origin.x + (w - visual_width) / 2.0,
                (Align::Right, Some(w)) => self.origin.x + w - visual_width,
                // Anchored text: origin is the center / right edge.
                (Align::Center, None) => self.origin.x - visual_width / 2.0,
                (Align::Right, None) => self.origin.x - visual_width,
            };
            placed.push(PlacedLine {
                x,
                y: baseline,
                segments,
            });
        }
        Ok(vec![PageItem::Text(TextBlock { lines: placed })])
    }
}

fn segments_lead(
    atoms: &[crate::text::atoms::Atom],
    line: &crate::text::linebreak::Line,
    fallback: Pt,
) -> Pt {
    use crate::text::atoms::Atom;
    let mut lead: Pt = 0.0;
    for atom in &atoms[line.start..line.end.min(atoms.len())] {
        if let Atom::Box { runs, .. } = atom {
            for run in runs {
                lead = lead.max(run.lead());
            }
        }
    }
    if lead == 0.0 {
        fallback
    } else {
        lead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> StyleResolved {
        StyleResolved::default()
    }

    #[test]
    fn test_line_renders_shape() {
        let mut report = ShapeReport::default();
        let items = Drawable::from(Line::new((0.0, 0.0), (100.0, 100.0)))
            .render(&base(), &mut report)
            .unwrap();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], PageItem::Shape(Shape::Line { .. })));
    }

    #[test]
    fn test_textbox_single_line_at_origin() {
        let mut report = ShapeReport::default();
        let tb = TextBox::new((100.0, 500.0), "Hello");
        let items = Drawable::from(tb).render(&base(), &mut report).unwrap();
        let PageItem::Text(block) = &items[0] else {
            panic!("expected text");
        };
        assert_eq!(block.lines.len(), 1);
        assert_eq!(block.lines[0].x, 100.0);
        assert_eq!(block.lines[0].y, 500.0);
    }

    #[test]
    fn test_textbox_newlines_break_without_width() {
        let mut report = ShapeReport::default();
        let tb = TextBox::new((0.0, 100.0), "A\nB");
        let items = Drawable::from(tb).render(&base(), &mut report).unwrap();
        let PageItem::Text(block) = &items[0] else {
            panic!("expected text");
        };
        assert_eq!(block.lines.len(), 2);
        assert_eq!(block.lines[0].y, 100.0);
        // Default lead is 15pt.
        assert_eq!(block.lines[1].y, 85.0);
        assert_eq!(block.lines[1].x, 0.0);
    }

    #[test]
    fn test_textbox_wraps_at_width() {
        let mut report = ShapeReport::default();
        let tb = TextBox::new((0.0, 100.0), "several words that need wrapping here")
            .with_width(80.0);
        let items = Drawable::from(tb).render(&base(), &mut report).unwrap();
        let PageItem::Text(block) = &items[0] else {
            panic!("expected text");
        };
        assert!(block.lines.len() > 1);
    }

    #[test]
    fn test_textbox_substitution_reported() {
        let mut report = ShapeReport::default();
        let tb = TextBox::new((0.0, 0.0), "漢字");
        Drawable::from(tb).render(&base(), &mut report).unwrap();
        assert_eq!(report.substitutions, 2);
    }
}
