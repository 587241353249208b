//! TrueType font subsetting.
//!
//! Tracks which glyphs a document actually uses and rebuilds the font
//! program with only those outlines. Glyph ids are not renumbered:
//! unused ids keep empty `loca` entries, so the composite-glyph
//! references inside kept outlines stay valid. Per PDF spec Section
//! 9.9, the subset font name carries a six-letter tag prefix derived
//! deterministically from the used-glyph set.

use crate::error::{Error, Result};
use crate::fonts::truetype::{read_i16, read_u16, read_u32, TrueTypeFont};
use std::collections::{BTreeMap, BTreeSet};

/// Composite glyph component flags (OpenType `glyf` table).
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// The magic constant `checkSumAdjustment` balances against.
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Tracks the characters and glyphs a document uses from one font.
#[derive(Debug, Default, Clone)]
pub struct UsedGlyphs {
    /// Used codepoints mapped to their glyph ids
    chars: BTreeMap<u32, u16>,
    /// Used glyph ids (`.notdef` always included)
    glyphs: BTreeSet<u16>,
}

impl UsedGlyphs {
    /// Create an empty set. Glyph 0 (`.notdef`) is always included.
    pub fn new() -> Self {
        let mut glyphs = BTreeSet::new();
        glyphs.insert(0);
        Self {
            chars: BTreeMap::new(),
            glyphs,
        }
    }

    /// Record a codepoint and its glyph as used.
    pub fn record(&mut self, codepoint: char, glyph_id: u16) {
        self.chars.insert(codepoint as u32, glyph_id);
        self.glyphs.insert(glyph_id);
    }

    /// Used codepoint → glyph id mapping.
    pub fn chars(&self) -> &BTreeMap<u32, u16> {
        &self.chars
    }

    /// Used glyph ids, ascending.
    pub fn glyphs(&self) -> &BTreeSet<u16> {
        &self.glyphs
    }

    /// Whether anything beyond `.notdef` was used.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Six-uppercase-letter subset tag.
    ///
    /// Derived from a stable (FNV-1a) hash of the sorted glyph set so
    /// the same subset always gets the same tag.
    pub fn subset_tag(&self) -> String {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for gid in &self.glyphs {
            for byte in gid.to_be_bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
        }
        let mut tag = String::with_capacity(6);
        for _ in 0..6 {
            tag.push(char::from(b'A' + (hash % 26) as u8));
            hash /= 26;
        }
        tag
    }
}

/// Build a subset TrueType program containing only the used glyphs.
///
/// The returned bytes are a complete sfnt file: `glyf` holds the used
/// outlines plus their composite closure, `loca` keeps one entry per
/// original glyph id (empty for unused), `cmap` is a minimal format-4
/// table over the used codepoints, and `hmtx` is shortened to
/// `numberOfHMetrics = max used gid + 1`.
pub fn build_subset(font: &TrueTypeFont, used: &UsedGlyphs) -> Result<Vec<u8>> {
    let glyphs = close_over_composites(font, used.glyphs())?;
    let max_gid = *glyphs.last().expect(".notdef is always present");
    let num_glyphs = font.num_glyphs();

    // glyf + loca (always long format in the subset)
    let mut glyf = Vec::new();
    let mut loca = Vec::with_capacity((usize::from(num_glyphs) + 1) * 4);
    for gid in 0..num_glyphs {
        loca.extend_from_slice(&(glyf.len() as u32).to_be_bytes());
        if glyphs.contains(&gid) {
            let outline = font
                .glyph_data(gid)
                .ok_or_else(|| Error::font_parse(format!("glyph {gid} missing from glyf")))?;
            glyf.extend_from_slice(outline);
            while glyf.len() % 4 != 0 {
                glyf.push(0);
            }
        }
    }
    loca.extend_from_slice(&(glyf.len() as u32).to_be_bytes());

    let cmap = build_cmap_format4(used.chars());
    let hmtx = build_hmtx(font, max_gid)?;

    let mut head = font
        .table(b"head")
        .ok_or_else(|| Error::font_parse("missing head table"))?
        .to_vec();
    if head.len() < 54 {
        return Err(Error::font_parse("head table too short"));
    }
    head[8..12].fill(0); // checkSumAdjustment, patched after assembly
    head[50..52].copy_from_slice(&1u16.to_be_bytes()); // long loca

    let mut hhea = font
        .table(b"hhea")
        .ok_or_else(|| Error::font_parse("missing hhea table"))?
        .to_vec();
    if hhea.len() < 36 {
        return Err(Error::font_parse("hhea table too short"));
    }
    hhea[34..36].copy_from_slice(&(max_gid + 1).to_be_bytes());

    let maxp = font
        .table(b"maxp")
        .ok_or_else(|| Error::font_parse("missing maxp table"))?
        .to_vec();
    let name = font
        .table(b"name")
        .ok_or_else(|| Error::font_parse("missing name table"))?
        .to_vec();

    let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
        (*b"cmap", cmap),
        (*b"glyf", glyf),
        (*b"head", head),
        (*b"hhea", hhea),
        (*b"hmtx", hmtx),
        (*b"loca", loca),
        (*b"maxp", maxp),
        (*b"name", name),
    ];
    if let Some(post) = font.table(b"post") {
        tables.push((*b"post", post.to_vec()));
    }
    tables.sort_by_key(|(tag, _)| *tag);

    log::debug!(
        "subsetting '{}': {} of {} glyphs kept",
        font.postscript_name(),
        glyphs.len(),
        num_glyphs
    );
    Ok(assemble_sfnt(tables))
}

/// Expand a glyph set with every glyph referenced by its composites.
fn close_over_composites(font: &TrueTypeFont, used: &BTreeSet<u16>) -> Result<BTreeSet<u16>> {
    let mut closed = used.clone();
    let mut queue: Vec<u16> = used.iter().copied().collect();
    while let Some(gid) = queue.pop() {
        let Some(data) = font.glyph_data(gid) else {
            continue;
        };
        if data.len() < 10 || read_i16(data, 0) >= 0 {
            continue; // empty or simple glyph
        }
        let mut pos = 10;
        loop {
            if data.len() < pos + 4 {
                return Err(Error::font_parse(format!("truncated composite glyph {gid}")));
            }
            let flags = read_u16(data, pos);
            let component = read_u16(data, pos + 2);
            if closed.insert(component) {
                queue.push(component);
            }
            pos += 4;
            pos += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
            if flags & WE_HAVE_A_SCALE != 0 {
                pos += 2;
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                pos += 4;
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                pos += 8;
            }
            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }
    }
    Ok(closed)
}

/// Build a minimal cmap: one format-4 subtable (platform 3, encoding
/// 1), one segment per used codepoint plus the required terminator.
fn build_cmap_format4(chars: &BTreeMap<u32, u16>) -> Vec<u8> {
    let entries: Vec<(u16, u16)> = chars
        .iter()
        .filter(|&(&cp, _)| cp <= 0xFFFF)
        .map(|(&cp, &gid)| (cp as u16, gid))
        .collect();
    let seg_count = (entries.len() + 1) as u16;

    let mut end_codes = Vec::new();
    let mut start_codes = Vec::new();
    let mut deltas = Vec::new();
    for &(cp, gid) in &entries {
        end_codes.push(cp);
        start_codes.push(cp);
        deltas.push(gid.wrapping_sub(cp));
    }
    // Terminal segment mapping 0xFFFF to .notdef.
    end_codes.push(0xFFFF);
    start_codes.push(0xFFFF);
    deltas.push(1);

    let length = 16 + 8 * usize::from(seg_count);
    let mut sub = Vec::with_capacity(length);
    sub.extend_from_slice(&4u16.to_be_bytes()); // format
    sub.extend_from_slice(&(length as u16).to_be_bytes());
    sub.extend_from_slice(&0u16.to_be_bytes()); // language
    sub.extend_from_slice(&(seg_count * 2).to_be_bytes());
    let search_range = 2 * (1u16 << (15 - seg_count.leading_zeros()));
    sub.extend_from_slice(&search_range.to_be_bytes());
    sub.extend_from_slice(&(15 - seg_count.leading_zeros() as u16).to_be_bytes());
    sub.extend_from_slice(&(seg_count * 2 - search_range).to_be_bytes());
    for code in &end_codes {
        sub.extend_from_slice(&code.to_be_bytes());
    }
    sub.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for code in &start_codes {
        sub.extend_from_slice(&code.to_be_bytes());
    }
    for delta in &deltas {
        sub.extend_from_slice(&delta.to_be_bytes());
    }
    for _ in 0..seg_count {
        sub.extend_from_slice(&0u16.to_be_bytes()); // idRangeOffset
    }

    let mut cmap = Vec::with_capacity(12 + sub.len());
    cmap.extend_from_slice(&0u16.to_be_bytes()); // version
    cmap.extend_from_slice(&1u16.to_be_bytes()); // one subtable
    cmap.extend_from_slice(&3u16.to_be_bytes()); // platform: Windows
    cmap.extend_from_slice(&1u16.to_be_bytes()); // encoding: Unicode BMP
    cmap.extend_from_slice(&12u32.to_be_bytes()); // subtable offset
    cmap.extend(sub);
    cmap
}

/// Rebuild hmtx with full metrics for glyphs 0..=max_gid.
fn build_hmtx(font: &TrueTypeFont, max_gid: u16) -> Result<Vec<u8>> {
    let hhea = font
        .table(b"hhea")
        .ok_or_else(|| Error::font_parse("missing hhea table"))?;
    let hmtx = font
        .table(b"hmtx")
        .ok_or_else(|| Error::font_parse("missing hmtx table"))?;
    let num_h_metrics = usize::from(read_u16(hhea, 34));
    if num_h_metrics == 0 {
        return Err(Error::font_parse("numberOfHMetrics is zero"));
    }

    let lsb_of = |gid: usize| -> i16 {
        if gid < num_h_metrics {
            if hmtx.len() >= gid * 4 + 4 {
                read_i16(hmtx, gid * 4 + 2)
            } else {
                0
            }
        } else {
            let off = num_h_metrics * 4 + (gid - num_h_metrics) * 2;
            if hmtx.len() >= off + 2 {
                read_i16(hmtx, off)
            } else {
                0
            }
        }
    };

    let mut out = Vec::with_capacity((usize::from(max_gid) + 1) * 4);
    for gid in 0..=usize::from(max_gid) {
        out.extend_from_slice(&font.advance_units(gid as u16).to_be_bytes());
        out.extend_from_slice(&lsb_of(gid).to_be_bytes());
    }
    Ok(out)
}

/// Assemble tables into an sfnt file with a correct directory,
/// per-table checksums, and a balanced `head.checkSumAdjustment`.
fn assemble_sfnt(tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = 16 * (1u16 << entry_selector);

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&(num_tables * 16 - search_range).to_be_bytes());

    let mut offset = 12 + usize::from(num_tables) * 16;
    let mut head_offset = None;
    let mut directory = Vec::new();
    for (tag, data) in &tables {
        if tag == b"head" {
            head_offset = Some(offset);
        }
        directory.push((*tag, table_checksum(data), offset as u32, data.len() as u32));
        offset += (data.len() + 3) & !3;
    }
    for (tag, checksum, offset, len) in &directory {
        out.extend_from_slice(tag);
        out.extend_from_slice(&checksum.to_be_bytes());
        out.extend_from_slice(&offset.to_be_bytes());
        out.extend_from_slice(&len.to_be_bytes());
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }

    let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(&out));
    if let Some(head) = head_offset {
        out[head + 8..head + 12].copy_from_slice(&adjustment.to_be_bytes());
    }
    out
}

/// Standard sfnt checksum: big-endian u32 sum, zero-padded.
fn table_checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(read_u32(chunk, 0));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut word = [0u8; 4];
        word[..rest.len()].copy_from_slice(rest);
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}
