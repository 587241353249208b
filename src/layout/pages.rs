//! Pages and page templates.
//!
//! A [`Page`] is a sheet with a size, rotation, margins, optional
//! explicit columns, and absolutely positioned drawables. An
//! [`AutoPage`] flows blocks through pages produced by a template,
//! which is either a fixed page or a function of the page index.

use crate::draw::Drawable;
use crate::geom::{Pt, Sides};
use crate::layout::{Block, Column};
use crate::units::{inch, A4};
use std::sync::Arc;

/// Page rotation, in clockwise degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// No rotation
    #[default]
    Deg0,
    /// 90° clockwise
    Deg90,
    /// Upside down
    Deg180,
    /// 270° clockwise
    Deg270,
}

impl Rotation {
    /// The value of the `/Rotate` page attribute.
    pub fn degrees(self) -> i64 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// A single page: size, rotation, margins, columns and drawables.
#[derive(Debug, Clone)]
pub struct Page {
    /// Absolutely positioned content
    pub drawables: Vec<Drawable>,
    /// Page size (width, height) in points
    pub size: (Pt, Pt),
    /// Page rotation
    pub rotation: Rotation,
    /// Margins used to derive the default column
    pub margin: Sides,
    /// Explicit layout columns; when empty, one column is derived
    /// from the size and margins
    pub columns: Vec<Column>,
}

impl Default for Page {
    /// A blank A4 page with one-inch margins.
    fn default() -> Self {
        Self {
            drawables: Vec::new(),
            size: A4,
            rotation: Rotation::Deg0,
            margin: Sides::uniform(inch(1.0)),
            columns: Vec::new(),
        }
    }
}

impl Page {
    /// A blank A4 page with one-inch margins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    pub fn with_size(mut self, size: (Pt, Pt)) -> Self {
        self.size = size;
        self
    }

    /// Set the rotation.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the margins.
    pub fn with_margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    /// Set explicit layout columns.
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Add an absolutely positioned drawable.
    pub fn add(mut self, drawable: impl Into<Drawable>) -> Self {
        self.drawables.push(drawable.into());
        self
    }

    /// The columns content flows through: the explicit ones, or a
    /// single column inside the margins.
    pub fn effective_columns(&self) -> Vec<Column> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }
        let (w, h) = self.size;
        vec![Column {
            x: self.margin.left,
            y: self.margin.bottom,
            width: w - self.margin.left - self.margin.right,
            height: h - self.margin.top - self.margin.bottom,
        }]
    }
}

/// Where auto-paginated content gets its pages from.
#[derive(Clone)]
pub enum PageTemplate {
    /// The same page layout for every page
    Fixed(Page),
    /// A function from page index (zero-based) to page
    Generator(Arc<dyn Fn(usize) -> Page + Send + Sync>),
}

impl PageTemplate {
    /// Produce the page for the given index.
    pub fn page(&self, index: usize) -> Page {
        match self {
            PageTemplate::Fixed(page) => page.clone(),
            PageTemplate::Generator(f) => f(index),
        }
    }
}

impl Default for PageTemplate {
    fn default() -> Self {
        PageTemplate::Fixed(Page::default())
    }
}

impl From<Page> for PageTemplate {
    fn from(page: Page) -> Self {
        PageTemplate::Fixed(page)
    }
}

impl std::fmt::Debug for PageTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageTemplate::Fixed(page) => f.debug_tuple("Fixed").field(page).finish(),
            PageTemplate::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// Content flowed automatically across as many pages as it needs.
#[derive(Debug, Clone)]
pub struct AutoPage {
    /// The blocks to lay out, in order
    pub blocks: Vec<Block>,
    /// Template for the pages the content flows through
    pub template: PageTemplate,
}

impl AutoPage {
    /// Flow the given blocks through default A4 pages.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            template: PageTemplate::default(),
        }
    }

    /// Flow a single paragraph of text through default pages.
    pub fn text(content: impl Into<crate::style::Span>) -> Self {
        Self::new(vec![Block::Paragraph(crate::layout::Paragraph::new(
            content,
        ))])
    }

    /// Set the page template.
    pub fn with_template(mut self, template: impl Into<PageTemplate>) -> Self {
        self.template = template.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_is_a4_with_inch_margins() {
        let page = Page::default();
        assert_eq!(page.size, (595.0, 842.0));
        let cols = page.effective_columns();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].x, 72.0);
        assert_eq!(cols[0].width, 595.0 - 144.0);
        assert_eq!(cols[0].height, 842.0 - 144.0);
    }

    #[test]
    fn test_explicit_columns_win() {
        let col = Column {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 400.0,
        };
        let page = Page::new().with_columns(vec![col]);
        assert_eq!(page.effective_columns().len(), 1);
        assert_eq!(page.effective_columns()[0].width, 100.0);
    }

    #[test]
    fn test_generator_template() {
        let template = PageTemplate::Generator(Arc::new(|i| {
            Page::new().with_margin(inch(1.0) + i as f64)
        }));
        assert_eq!(template.page(0).margin.left, 72.0);
        assert_eq!(template.page(3).margin.left, 75.0);
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::Deg0.degrees(), 0);
        assert_eq!(Rotation::Deg270.degrees(), 270);
    }
}
