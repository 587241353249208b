//! PDF emission: object serialization, content streams, and the
//! streaming file writer.
//!
//! ## Architecture
//!
//! ```text
//! PageItem[] (display list from layout)
//!     ↓
//! [content] (display list → content stream operators)
//!     ↓
//! [PdfWriter] (header, numbered objects, xref, trailer)
//!     ↓
//! [ObjectSerializer] (objects → PDF syntax)
//!     ↓
//! PDF bytes
//! ```

pub mod content;
pub mod pdf;
pub mod serializer;
pub mod xref;

pub use content::{PageItem, PlacedLine, Segment, Shape, TextBlock};
pub use pdf::PdfWriter;
pub use serializer::ObjectSerializer;
pub use xref::XRefBuilder;
