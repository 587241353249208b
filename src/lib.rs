// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::match_like_matches_macro)]
#![warn(missing_docs)]

//! # folio
//!
//! Declarative PDF typesetting: styled Unicode text and embedded
//! TrueType fonts in, a justified, hyphenated, kerned, column-aware
//! page layout out, serialized as byte-exact PDF 1.7.
//!
//! ## Pipeline
//!
//! ```text
//! styled tree → shaping → box/glue/penalty stream → line breaker
//!             → lines → column filler (orphan control) → frames
//!             → content-stream emitter + font subsetter → PDF writer
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use folio::Document;
//!
//! # fn main() -> folio::Result<()> {
//! let doc = Document::from_text("Olá Mundo!");
//! let file = std::fs::File::create("hello.pdf")?;
//! doc.write_into(file)?;
//! # Ok(())
//! # }
//! ```
//!
//! Styled, multi-page content:
//!
//! ```no_run
//! use folio::layout::{AutoPage, Block, Paragraph, Align};
//! use folio::style::{Span, Style};
//! use folio::{fonts, Document, DocPage};
//!
//! # fn main() -> folio::Result<()> {
//! let para = Paragraph::from_spans(vec![
//!     Span::from("The "),
//!     Span::text("optimum", Style::new().with_bold(true)),
//!     Span::from(" fit."),
//! ])
//! .with_align(Align::Justify);
//!
//! let doc = Document::new(vec![DocPage::Auto(AutoPage::new(vec![
//!     Block::Paragraph(para),
//! ]))])
//! .with_style(Style::new().with_font(fonts::times_roman()));
//! doc.write_into(std::fs::File::create("styled.pdf")?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Determinism
//!
//! With the default configuration the output is a pure function of
//! the document: no timestamps, sorted dictionary keys, fixed number
//! formatting, and font subset tags derived from the used-glyph set.

pub mod document;
pub mod draw;
pub mod error;
pub mod fonts;
pub mod geom;
pub mod layout;
pub mod object;
pub mod style;
pub mod text;
pub mod units;
pub mod writer;

pub use document::{DocPage, Document, WriteReport, WriterConfig};
pub use draw::{Drawable, Ellipse, Line, Rect, TextBox};
pub use error::{Error, Result};
pub use fonts::{Font, Standard14, TrueTypeFont, Typeface};
pub use geom::{Point, Pt, Sides};
pub use layout::{Align, AutoPage, Block, Page, Paragraph, Rule};
pub use style::{Rgb, Span, Style};
