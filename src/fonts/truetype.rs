//! Embedded TrueType font parsing.
//!
//! Wraps the `ttf-parser` crate to extract the data the typesetter and
//! subsetter need: codepoint→glyph mapping, advance widths, kerning
//! pairs, vertical metrics, and raw table ranges for the subset
//! builder. Parsing happens once per font file; the parsed handle is
//! shared read-only across documents.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Tables every embeddable TrueType font must carry.
const REQUIRED_TABLES: [&[u8; 4]; 8] = [
    b"head", b"hhea", b"maxp", b"cmap", b"hmtx", b"loca", b"glyf", b"name",
];

/// A parsed TrueType font ready for measurement and embedding.
///
/// All metric queries return glyph-space units (1/1000 em), already
/// scaled from the font's own units-per-em.
pub struct TrueTypeFont {
    data: Vec<u8>,
    postscript_name: String,
    units_per_em: u16,
    /// Font units → glyph-space units (1/1000 em)
    scale: f64,
    num_glyphs: u16,
    ascent: f64,
    descent: f64,
    cap_height: f64,
    italic_angle: f64,
    weight_class: u16,
    is_fixed_pitch: bool,
    bbox: [f64; 4],
    /// Codepoint → glyph id, built from cmap over the BMP
    cmap: HashMap<u32, u16>,
    /// Advance width per glyph id, in font units
    advances: Vec<u16>,
    /// Kerning pairs (left gid, right gid) → adjustment in font units
    kern: HashMap<(u16, u16), i16>,
    /// Table tag → (offset, length) into `data`
    tables: HashMap<[u8; 4], (usize, usize)>,
    /// Whether `loca` uses 32-bit offsets
    loca_long: bool,
}

impl TrueTypeFont {
    /// Read and parse a font file.
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::parse(data).map(Arc::new).map_err(|e| match e {
            Error::FontParse { reason, .. } => Error::FontParse {
                name: Some(path.display().to_string()),
                reason,
            },
            other => other,
        })
    }

    /// Parse a font from raw bytes.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::font_parse("font file is empty"));
        }

        let tables = parse_table_directory(&data)?;
        for tag in REQUIRED_TABLES {
            if !tables.contains_key(tag) {
                return Err(Error::font_parse(format!(
                    "missing required table: {}",
                    String::from_utf8_lossy(&tag[..])
                )));
            }
        }

        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| Error::font_parse(e.to_string()))?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(Error::font_parse("unitsPerEm is zero"));
        }
        let scale = 1000.0 / f64::from(units_per_em);

        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|n| n.to_string())
            .or_else(|| {
                face.names()
                    .into_iter()
                    .find(|n| n.name_id == ttf_parser::name_id::FULL_NAME)
                    .and_then(|n| n.to_string())
            })
            .unwrap_or_else(|| "Unknown".to_string());

        let num_glyphs = face.number_of_glyphs();

        // Codepoint→glyph over the Basic Multilingual Plane. Building
        // the whole map up front keeps later width queries allocation
        // free.
        let mut cmap = HashMap::new();
        for codepoint in 0..=0xFFFF_u32 {
            if let Some(c) = char::from_u32(codepoint) {
                if let Some(gid) = face.glyph_index(c) {
                    if gid.0 != 0 {
                        cmap.insert(codepoint, gid.0);
                    }
                }
            }
        }

        let mut advances = Vec::with_capacity(usize::from(num_glyphs));
        for gid in 0..num_glyphs {
            advances.push(face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0));
        }

        let cap_height = face
            .capital_height()
            .filter(|&h| h > 0)
            .unwrap_or_else(|| face.ascender());

        let ascent = f64::from(face.ascender()) * scale;
        let descent = f64::from(face.descender()) * scale;
        let italic_angle = f64::from(face.tables().post.map(|p| p.italic_angle).unwrap_or(0.0));
        let weight_class = face.weight().to_number();
        let is_fixed_pitch = face.is_monospaced();
        let bbox = face.global_bounding_box();
        drop(face);

        let loca_long = {
            let (head_off, head_len) = tables[b"head"];
            if head_len < 52 {
                return Err(Error::font_parse("head table too short"));
            }
            read_i16(&data, head_off + 50) == 1
        };

        let kern = parse_kern_pairs(&data, &tables);
        log::debug!(
            "parsed font '{}': {} glyphs, {} cmap entries, {} kern pairs",
            postscript_name,
            num_glyphs,
            cmap.len(),
            kern.len()
        );

        Ok(Self {
            postscript_name,
            units_per_em,
            scale,
            num_glyphs,
            ascent,
            descent,
            cap_height: f64::from(cap_height) * scale,
            italic_angle,
            weight_class,
            is_fixed_pitch,
            bbox: [
                f64::from(bbox.x_min) * scale,
                f64::from(bbox.y_min) * scale,
                f64::from(bbox.x_max) * scale,
                f64::from(bbox.y_max) * scale,
            ],
            cmap,
            advances,
            kern,
            tables,
            loca_long,
            data,
        })
    }

    /// Glyph id for a codepoint, if mapped.
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.cmap.get(&(c as u32)).copied()
    }

    /// Advance width of a codepoint in glyph-space units. Unmapped
    /// codepoints measure as `.notdef`.
    pub fn advance(&self, c: char) -> f64 {
        let gid = self.glyph_id(c).unwrap_or(0);
        self.advance_of_glyph(gid)
    }

    /// Advance width of a glyph id in glyph-space units.
    pub fn advance_of_glyph(&self, gid: u16) -> f64 {
        let units = self
            .advances
            .get(usize::from(gid))
            .copied()
            .unwrap_or(0);
        f64::from(units) * self.scale
    }

    /// Advance width of a glyph id in raw font units.
    pub fn advance_units(&self, gid: u16) -> u16 {
        self.advances.get(usize::from(gid)).copied().unwrap_or(0)
    }

    /// Kerning between two codepoints in glyph-space units.
    pub fn kern(&self, left: char, right: char) -> f64 {
        let (Some(l), Some(r)) = (self.glyph_id(left), self.glyph_id(right)) else {
            return 0.0;
        };
        match self.kern.get(&(l, r)) {
            Some(&value) => f64::from(value) * self.scale,
            None => 0.0,
        }
    }

    /// PostScript name of the face.
    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    /// Number of glyphs in the face.
    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    /// The font's design units per em.
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Font units → glyph-space scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Typographic ascent in glyph-space units.
    pub fn ascent(&self) -> f64 {
        self.ascent
    }

    /// Typographic descent in glyph-space units (negative).
    pub fn descent(&self) -> f64 {
        self.descent
    }

    /// Capital height in glyph-space units.
    pub fn cap_height(&self) -> f64 {
        self.cap_height
    }

    /// Italic angle in degrees.
    pub fn italic_angle(&self) -> f64 {
        self.italic_angle
    }

    /// OS/2 weight class (100-900).
    pub fn weight_class(&self) -> u16 {
        self.weight_class
    }

    /// Whether the face is monospaced.
    pub fn is_fixed_pitch(&self) -> bool {
        self.is_fixed_pitch
    }

    /// Font bounding box in glyph-space units.
    pub fn bbox(&self) -> [f64; 4] {
        self.bbox
    }

    /// Raw bytes of a table, if present.
    pub fn table(&self, tag: &[u8; 4]) -> Option<&[u8]> {
        let &(offset, len) = self.tables.get(tag)?;
        self.data.get(offset..offset + len)
    }

    /// Whether `loca` uses 32-bit offsets.
    pub fn loca_long(&self) -> bool {
        self.loca_long
    }

    /// Byte range of a glyph's outline within `glyf`.
    pub fn glyph_data(&self, gid: u16) -> Option<&[u8]> {
        let loca = self.table(b"loca")?;
        let glyf = self.table(b"glyf")?;
        let (start, end) = loca_entry(loca, self.loca_long, gid)?;
        glyf.get(start..end)
    }
}

/// Look up the glyf range of a glyph in a raw `loca` table.
pub(crate) fn loca_entry(loca: &[u8], long: bool, gid: u16) -> Option<(usize, usize)> {
    let i = usize::from(gid);
    if long {
        if loca.len() < (i + 2) * 4 {
            return None;
        }
        let start = read_u32(loca, i * 4) as usize;
        let end = read_u32(loca, (i + 1) * 4) as usize;
        Some((start, end))
    } else {
        if loca.len() < (i + 2) * 2 {
            return None;
        }
        let start = usize::from(read_u16(loca, i * 2)) * 2;
        let end = usize::from(read_u16(loca, (i + 1) * 2)) * 2;
        Some((start, end))
    }
}

/// Parse the sfnt table directory into tag → (offset, length).
fn parse_table_directory(data: &[u8]) -> Result<HashMap<[u8; 4], (usize, usize)>> {
    if data.len() < 12 {
        return Err(Error::font_parse("truncated table directory"));
    }
    let version = read_u32(data, 0);
    // 0x00010000 = TrueType outlines, 'true' = Apple TrueType. CFF
    // ('OTTO') fonts have no glyf/loca and are rejected by the caller.
    if version != 0x0001_0000 && &data[0..4] != b"true" {
        return Err(Error::font_parse(format!(
            "unsupported sfnt version 0x{version:08X}"
        )));
    }
    let num_tables = usize::from(read_u16(data, 4));
    let mut tables = HashMap::with_capacity(num_tables);
    for i in 0..num_tables {
        let record = 12 + i * 16;
        if data.len() < record + 16 {
            return Err(Error::font_parse("truncated table record"));
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&data[record..record + 4]);
        let offset = read_u32(data, record + 8) as usize;
        let len = read_u32(data, record + 12) as usize;
        if offset.checked_add(len).map_or(true, |end| end > data.len()) {
            return Err(Error::font_parse(format!(
                "table {} extends past end of file",
                String::from_utf8_lossy(&tag)
            )));
        }
        tables.insert(tag, (offset, len));
    }
    Ok(tables)
}

/// Extract horizontal kerning pairs from a version-0 `kern` table.
///
/// Only format-0 subtables are read; other formats (and the Apple
/// version-1 layout) carry state-machine kerning we don't use.
fn parse_kern_pairs(
    data: &[u8],
    tables: &HashMap<[u8; 4], (usize, usize)>,
) -> HashMap<(u16, u16), i16> {
    let mut pairs = HashMap::new();
    let Some(&(offset, len)) = tables.get(b"kern") else {
        return pairs;
    };
    let Some(table) = data.get(offset..offset + len) else {
        return pairs;
    };
    if table.len() < 4 || read_u16(table, 0) != 0 {
        return pairs;
    }
    let n_subtables = usize::from(read_u16(table, 2));
    let mut pos = 4;
    for _ in 0..n_subtables {
        if table.len() < pos + 6 {
            break;
        }
        let length = usize::from(read_u16(table, pos + 2));
        let coverage = read_u16(table, pos + 4);
        let horizontal = coverage & 0x0001 != 0;
        let format = coverage >> 8;
        if horizontal && format == 0 && table.len() >= pos + 14 {
            let n_pairs = usize::from(read_u16(table, pos + 6));
            let mut entry = pos + 14;
            for _ in 0..n_pairs {
                if table.len() < entry + 6 {
                    break;
                }
                let left = read_u16(table, entry);
                let right = read_u16(table, entry + 2);
                let value = read_i16(table, entry + 4);
                pairs.insert((left, right), value);
                entry += 6;
            }
        }
        if length == 0 {
            break;
        }
        pos += length;
    }
    pairs
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_font_rejected() {
        assert!(matches!(
            TrueTypeFont::parse(Vec::new()),
            Err(Error::FontParse { .. })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(TrueTypeFont::parse(vec![0u8; 64]).is_err());
    }

    #[test]
    fn test_loca_entry_short_format() {
        // Short loca stores offsets divided by two.
        let loca = [0u8, 0, 0, 5, 0, 8];
        assert_eq!(loca_entry(&loca, false, 0), Some((0, 10)));
        assert_eq!(loca_entry(&loca, false, 1), Some((10, 16)));
        assert_eq!(loca_entry(&loca, false, 2), None);
    }

    #[test]
    fn test_loca_entry_long_format() {
        let loca = [0u8, 0, 0, 0, 0, 0, 0, 12, 0, 0, 0, 40];
        assert_eq!(loca_entry(&loca, true, 0), Some((0, 12)));
        assert_eq!(loca_entry(&loca, true, 1), Some((12, 40)));
    }
}
