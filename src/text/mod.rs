//! The typesetting pipeline: shaping, hyphenation and line breaking.
//!
//! ```text
//! (text, style) runs
//!     ↓ [shape]      glyph runs + box/glue/penalty atoms
//!     ↓ [linebreak]  greedy or Knuth–Plass break sequence
//!     → lines, consumed by the frame filler
//! ```

pub mod atoms;
pub mod hyphenate;
pub mod linebreak;
pub mod shape;

pub use atoms::Atom;
pub use hyphenate::{EnglishFallback, Hyphenate, Hyphens};
pub use linebreak::{break_lines, BreakParams, Line};
pub use shape::{shape_paragraph, Glyph, ShapeReport, ShapedRun};
