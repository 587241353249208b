//! Per-writer font registry.
//!
//! Assigns resource names (`F1`, `F2`, …) to the fonts a document
//! uses, accumulates used codepoints for embedded fonts during layout,
//! and emits the font object graph at serialization time. The registry
//! is frozen (CIDs assigned in ascending glyph-id order) before any
//! content stream is encoded, so text encoding and the emitted
//! CIDToGIDMap always agree.

use crate::error::{Error, Result};
use crate::fonts::subset::{build_subset, UsedGlyphs};
use crate::fonts::Font;
use crate::object::Object;
use crate::writer::pdf::compress_data;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Objects emitted per embedded font (PDF32000-1:2008, 9.7.4).
pub const OBJS_PER_EMBEDDED_FONT: u32 = 7;

/// FontDescriptor flag bits (PDF32000-1:2008, 9.8.2).
const FLAG_FIXED_PITCH: i64 = 1;
const FLAG_SYMBOLIC: i64 = 1 << 2;
const FLAG_ITALIC: i64 = 1 << 6;
const FLAG_FORCE_BOLD: i64 = 1 << 18;

/// Handle to a registered font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontRef(pub(crate) usize);

struct Entry {
    font: Font,
    used: UsedGlyphs,
    /// Glyph id → CID, assigned at freeze in ascending gid order
    cids: Option<BTreeMap<u16, u16>>,
}

/// Registry of the fonts used by one document write.
#[derive(Default)]
pub struct FontRegistry {
    entries: Vec<Entry>,
    frozen: bool,
}

impl FontRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font, returning its handle. Fonts are deduplicated
    /// by identity, so repeated registration is cheap.
    pub fn register(&mut self, font: &Font) -> FontRef {
        if let Some(i) = self.entries.iter().position(|e| e.font == *font) {
            return FontRef(i);
        }
        debug_assert!(!self.frozen, "registering a font after freeze");
        self.entries.push(Entry {
            font: font.clone(),
            used: UsedGlyphs::new(),
            cids: None,
        });
        FontRef(self.entries.len() - 1)
    }

    /// Resource name for a registered font (`F1`, `F2`, …).
    pub fn resource_name(&self, font: FontRef) -> String {
        format!("F{}", font.0 + 1)
    }

    /// Find the handle of an already-registered font.
    pub fn lookup(&self, font: &Font) -> Option<FontRef> {
        self.entries.iter().position(|e| e.font == *font).map(FontRef)
    }

    /// Record a rendered codepoint. Only embedded fonts accumulate a
    /// used-set; builtin fonts carry complete metrics already.
    pub fn record_use(&mut self, font: FontRef, codepoint: char, glyph_id: u16) {
        debug_assert!(!self.frozen, "recording glyph use after freeze");
        let entry = &mut self.entries[font.0];
        if matches!(entry.font, Font::Embedded(_)) {
            entry.used.record(codepoint, glyph_id);
        }
    }

    /// Freeze the registry: assign CIDs for every embedded font in
    /// ascending glyph-id order (a monotone CIDToGIDMap).
    pub fn freeze(&mut self) {
        for entry in &mut self.entries {
            if matches!(entry.font, Font::Embedded(_)) && entry.cids.is_none() {
                let cids = entry
                    .used
                    .glyphs()
                    .iter()
                    .enumerate()
                    .map(|(cid, &gid)| (gid, cid as u16))
                    .collect();
                entry.cids = Some(cids);
            }
        }
        self.frozen = true;
    }

    /// CID assigned to a glyph of an embedded font. Must be called
    /// after [`freeze`](Self::freeze); unknown glyphs map to CID 0.
    pub fn cid(&self, font: FontRef, glyph_id: u16) -> u16 {
        self.entries[font.0]
            .cids
            .as_ref()
            .and_then(|cids| cids.get(&glyph_id).copied())
            .unwrap_or(0)
    }

    /// Number of registered fonts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fonts are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of PDF objects the fonts will occupy.
    pub fn object_count(&self) -> u32 {
        self.entries
            .iter()
            .map(|e| match e.font {
                Font::Standard(_) => 1,
                Font::Embedded(_) => OBJS_PER_EMBEDDED_FONT,
            })
            .sum()
    }

    /// Build the `/Font` resource dictionary, given the id of the
    /// first font object.
    pub fn resource_dict(&self, first_id: u32) -> Object {
        let mut entries = Vec::new();
        let mut id = first_id;
        for (i, entry) in self.entries.iter().enumerate() {
            let mut name = String::new();
            let _ = write!(name, "F{}", i + 1);
            entries.push((name, Object::reference(id)));
            id += match entry.font {
                Font::Standard(_) => 1,
                Font::Embedded(_) => OBJS_PER_EMBEDDED_FONT,
            };
        }
        Object::Dictionary(entries.into_iter().collect())
    }

    /// Emit all font objects, starting at `first_id`.
    ///
    /// The registry must be frozen. Objects are returned in id order.
    pub fn to_objects(&self, first_id: u32, compress: bool) -> Result<Vec<(u32, Object)>> {
        if !self.frozen {
            return Err(Error::InternalState("font registry not frozen"));
        }
        let mut objects = Vec::new();
        let mut id = first_id;
        for entry in &self.entries {
            match &entry.font {
                Font::Standard(s) => {
                    objects.push((
                        id,
                        Object::dict(vec![
                            ("Type", Object::name("Font")),
                            ("Subtype", Object::name("Type1")),
                            ("BaseFont", Object::name(s.base_font_name())),
                            ("Encoding", Object::name("WinAnsiEncoding")),
                        ]),
                    ));
                    id += 1;
                },
                Font::Embedded(font) => {
                    let cids = entry
                        .cids
                        .as_ref()
                        .expect("frozen registry assigns cids to embedded fonts");
                    objects.extend(embedded_font_objects(
                        id,
                        font,
                        &entry.used,
                        cids,
                        compress,
                    )?);
                    id += OBJS_PER_EMBEDDED_FONT;
                },
            }
        }
        Ok(objects)
    }
}

/// The seven objects describing one embedded font.
///
/// Layout follows PDF32000-1:2008, page 293: a Type0 font with an
/// Identity-H encoding, a CIDFontType2 descendant, a ToUnicode CMap,
/// CIDSystemInfo, a FontDescriptor, the CIDToGIDMap stream, and the
/// subset font program.
fn embedded_font_objects(
    first_id: u32,
    font: &crate::fonts::TrueTypeFont,
    used: &UsedGlyphs,
    cids: &BTreeMap<u16, u16>,
    compress: bool,
) -> Result<Vec<(u32, Object)>> {
    let type0_id = first_id;
    let descendant_id = first_id + 1;
    let tounicode_id = first_id + 2;
    let cidsysinfo_id = first_id + 3;
    let descriptor_id = first_id + 4;
    let cid_gid_map_id = first_id + 5;
    let file_id = first_id + 6;

    let tag = used.subset_tag();
    let base_font = format!("{}+{}", tag, sanitize_ps_name(font.postscript_name()));

    // Widths, ordered by ascending CID.
    let widths: Vec<Object> = used
        .glyphs()
        .iter()
        .map(|&gid| Object::Integer(font.advance_of_glyph(gid).round() as i64))
        .collect();

    // CID → gid, two big-endian bytes each. CIDs were assigned in
    // ascending gid order, so the mapping is monotone.
    let mut gid_map = Vec::with_capacity(cids.len() * 2);
    for &gid in used.glyphs() {
        gid_map.extend_from_slice(&gid.to_be_bytes());
    }

    let subset = build_subset(font, used)?;
    let subset_len = subset.len();

    let flags = FLAG_SYMBOLIC
        | if font.is_fixed_pitch() { FLAG_FIXED_PITCH } else { 0 }
        | if font.italic_angle() != 0.0 { FLAG_ITALIC } else { 0 }
        | if font.weight_class() >= 600 { FLAG_FORCE_BOLD } else { 0 };

    // Map the 100-900 weight class onto reasonable StemV values
    // (50-241); TrueType fonts don't store StemV directly.
    let stem_v = (50.0 + (241.0 - 50.0) / 800.0 * (f64::from(font.weight_class()) - 100.0))
        .round() as i64;

    let bbox = font.bbox();
    let mut objects = vec![
        (
            type0_id,
            Object::dict(vec![
                ("Type", Object::name("Font")),
                ("Subtype", Object::name("Type0")),
                ("BaseFont", Object::name(base_font.as_str())),
                ("Encoding", Object::name("Identity-H")),
                ("DescendantFonts", Object::ref_array([descendant_id])),
                ("ToUnicode", Object::reference(tounicode_id)),
            ]),
        ),
        (
            descendant_id,
            Object::dict(vec![
                ("Type", Object::name("Font")),
                ("Subtype", Object::name("CIDFontType2")),
                ("BaseFont", Object::name(base_font.as_str())),
                ("CIDSystemInfo", Object::reference(cidsysinfo_id)),
                ("FontDescriptor", Object::reference(descriptor_id)),
                (
                    "DW",
                    Object::Integer(font.advance_of_glyph(0).round() as i64),
                ),
                (
                    "W",
                    Object::Array(vec![Object::Integer(0), Object::Array(widths)]),
                ),
                ("CIDToGIDMap", Object::reference(cid_gid_map_id)),
            ]),
        ),
        (
            tounicode_id,
            stream_object(vec![], to_unicode_cmap(used, cids), compress),
        ),
        (
            cidsysinfo_id,
            Object::dict(vec![
                ("Registry", Object::string("Adobe")),
                ("Ordering", Object::string("UCS")),
                ("Supplement", Object::Integer(0)),
            ]),
        ),
        (
            descriptor_id,
            Object::dict(vec![
                ("Type", Object::name("FontDescriptor")),
                ("FontName", Object::name(base_font.as_str())),
                ("Flags", Object::Integer(flags)),
                (
                    "FontBBox",
                    Object::rect(bbox[0], bbox[1], bbox[2], bbox[3]),
                ),
                ("ItalicAngle", Object::Integer(font.italic_angle().round() as i64)),
                ("Ascent", Object::Integer(font.ascent().round() as i64)),
                ("Descent", Object::Integer(font.descent().round() as i64)),
                ("CapHeight", Object::Integer(font.cap_height().round() as i64)),
                ("StemV", Object::Integer(stem_v)),
                ("FontFile2", Object::reference(file_id)),
            ]),
        ),
        (cid_gid_map_id, stream_object(vec![], gid_map, compress)),
    ];
    objects.push((
        file_id,
        stream_object(
            vec![("Length1", Object::Integer(subset_len as i64))],
            subset,
            compress,
        ),
    ));
    Ok(objects)
}

/// Build a stream object, compressing when asked.
fn stream_object(extra: Vec<(&str, Object)>, data: Vec<u8>, compress: bool) -> Object {
    let mut entries = extra;
    let data = if compress {
        match compress_data(&data) {
            Ok(compressed) => {
                entries.push(("Filter", Object::name("FlateDecode")));
                compressed
            },
            Err(_) => data,
        }
    } else {
        data
    };
    Object::stream(entries, data)
}

/// ToUnicode CMap: maps CIDs back to the codepoints they render, so
/// text selection copies the right characters.
fn to_unicode_cmap(used: &UsedGlyphs, cids: &BTreeMap<u16, u16>) -> Vec<u8> {
    // One codepoint per CID; when several codepoints share a glyph the
    // lowest wins.
    let mut by_cid: BTreeMap<u16, u32> = BTreeMap::new();
    for (&cp, &gid) in used.chars() {
        if let Some(&cid) = cids.get(&gid) {
            by_cid.entry(cid).or_insert(cp);
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(
        b"/CIDInit /ProcSet findresource begin\n\
          12 dict begin\n\
          begincmap\n\
          /CIDSystemInfo\n\
          << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
          /CMapName /Adobe-Identity-UCS def\n\
          /CMapType 2 def\n\
          1 begincodespacerange\n\
          <0000> <FFFF>\n\
          endcodespacerange\n",
    );
    out.extend_from_slice(format!("{} beginbfchar\n", by_cid.len()).as_bytes());
    for (cid, cp) in by_cid {
        out.extend_from_slice(format!("<{:04X}> <{}>\n", cid, utf16be_hex(cp)).as_bytes());
    }
    out.extend_from_slice(
        b"endbfchar\n\
          endcmap\n\
          CMapName currentdict /CMap defineresource pop\n\
          end\n\
          end",
    );
    out
}

/// Hex form of a codepoint in UTF-16BE, surrogate pair if needed.
fn utf16be_hex(cp: u32) -> String {
    if cp <= 0xFFFF {
        format!("{:04X}", cp)
    } else {
        let v = cp - 0x10000;
        format!("{:04X}{:04X}", 0xD800 | (v >> 10), 0xDC00 | (v & 0x3FF))
    }
}

/// Strip bytes PDF name syntax can't carry (spaces most commonly).
fn sanitize_ps_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && *c != '#' && *c != '/')
        .collect()
}
