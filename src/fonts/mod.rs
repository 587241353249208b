//! Font handling: builtin Type1 metrics, embedded TrueType faces,
//! used-glyph tracking and subsetting, and the per-writer registry.
//!
//! All metric queries are in glyph-space units (1/1000 em); callers
//! scale by `size / 1000` to get points.

pub mod registry;
pub mod standard14;
pub mod subset;
pub mod truetype;

pub use registry::{FontRef, FontRegistry};
pub use standard14::Standard14;
pub use truetype::TrueTypeFont;

use std::sync::Arc;

/// Scale between text space and glyph space (PDF32000-1:2008, 9.7.3).
pub const GLYPH_SPACE: f64 = 1000.0;

/// A concrete font: either one of the 14 builtin Type1 fonts, or an
/// embedded TrueType face.
#[derive(Clone)]
pub enum Font {
    /// Builtin font, available in every conforming reader.
    Standard(Standard14),
    /// Embedded TrueType face; parsed once and shared.
    Embedded(Arc<TrueTypeFont>),
}

impl Font {
    /// Advance width of a codepoint, in glyph-space units.
    ///
    /// Unmappable codepoints measure as the replacement character
    /// (`?` for builtin fonts, `.notdef` for embedded ones).
    pub fn advance(&self, c: char) -> f64 {
        match self {
            Font::Standard(s) => s.advance(c),
            Font::Embedded(t) => t.advance(c),
        }
    }

    /// Kerning adjustment between two codepoints, in glyph-space units.
    /// Negative values pull the pair closer together.
    pub fn kern(&self, left: char, right: char) -> f64 {
        match self {
            Font::Standard(s) => s.kern(left, right),
            Font::Embedded(t) => t.kern(left, right),
        }
    }

    /// Glyph id for a codepoint, if the font maps it.
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        match self {
            Font::Standard(s) => s.encode_char(c).map(u16::from),
            Font::Embedded(t) => t.glyph_id(c),
        }
    }

    /// Whether the font can represent the codepoint.
    pub fn maps(&self, c: char) -> bool {
        self.glyph_id(c).is_some()
    }

    /// Advance width of the space character, in glyph-space units.
    pub fn space_advance(&self) -> f64 {
        self.advance(' ')
    }

    /// Typographic ascent in glyph-space units.
    pub fn ascent(&self) -> f64 {
        match self {
            Font::Standard(s) => s.ascent(),
            Font::Embedded(t) => t.ascent(),
        }
    }

    /// Typographic descent in glyph-space units (negative).
    pub fn descent(&self) -> f64 {
        match self {
            Font::Standard(s) => s.descent(),
            Font::Embedded(t) => t.descent(),
        }
    }

    /// Capital letter height in glyph-space units.
    pub fn cap_height(&self) -> f64 {
        match self {
            Font::Standard(s) => s.cap_height(),
            Font::Embedded(t) => t.cap_height(),
        }
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Font::Standard(a), Font::Standard(b)) => a == b,
            (Font::Embedded(a), Font::Embedded(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Font::Standard(s) => write!(f, "Font::Standard({:?})", s),
            Font::Embedded(t) => write!(f, "Font::Embedded({})", t.postscript_name()),
        }
    }
}

/// A typeface: four style variants of the same design.
///
/// The resolved style's `bold`/`italic` flags select the variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Typeface {
    /// Regular (non-bold, non-italic) variant
    pub regular: Font,
    /// Bold variant
    pub bold: Font,
    /// Italic variant
    pub italic: Font,
    /// Bold italic variant
    pub bold_italic: Font,
}

impl Typeface {
    /// A typeface where every variant is the same font (used for
    /// Symbol and ZapfDingbats, which have no style variants).
    pub fn single(font: Font) -> Self {
        Self {
            regular: font.clone(),
            bold: font.clone(),
            italic: font.clone(),
            bold_italic: font,
        }
    }

    /// Select the variant for the given style flags.
    pub fn select(&self, bold: bool, italic: bool) -> &Font {
        match (bold, italic) {
            (false, false) => &self.regular,
            (true, false) => &self.bold,
            (false, true) => &self.italic,
            (true, true) => &self.bold_italic,
        }
    }
}

/// The builtin Helvetica typeface.
pub fn helvetica() -> Typeface {
    Typeface {
        regular: Font::Standard(Standard14::Helvetica),
        bold: Font::Standard(Standard14::HelveticaBold),
        italic: Font::Standard(Standard14::HelveticaOblique),
        bold_italic: Font::Standard(Standard14::HelveticaBoldOblique),
    }
}

/// The builtin Times typeface.
pub fn times_roman() -> Typeface {
    Typeface {
        regular: Font::Standard(Standard14::TimesRoman),
        bold: Font::Standard(Standard14::TimesBold),
        italic: Font::Standard(Standard14::TimesItalic),
        bold_italic: Font::Standard(Standard14::TimesBoldItalic),
    }
}

/// The builtin Courier typeface.
pub fn courier() -> Typeface {
    Typeface {
        regular: Font::Standard(Standard14::Courier),
        bold: Font::Standard(Standard14::CourierBold),
        italic: Font::Standard(Standard14::CourierOblique),
        bold_italic: Font::Standard(Standard14::CourierBoldOblique),
    }
}

/// The builtin Symbol typeface (single variant).
pub fn symbol() -> Typeface {
    Typeface::single(Font::Standard(Standard14::Symbol))
}

/// The builtin ZapfDingbats typeface (single variant).
pub fn zapf_dingbats() -> Typeface {
    Typeface::single(Font::Standard(Standard14::ZapfDingbats))
}
