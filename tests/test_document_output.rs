//! End-to-end tests over the emitted PDF bytes.

use folio::layout::{AutoPage, Block, Page, Paragraph};
use folio::{DocPage, Document, WriterConfig};
use std::io::Write as _;

fn uncompressed(doc: &Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.write_with(&mut out, &WriterConfig::default().with_compress(false))
        .unwrap();
    out
}

fn as_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

#[test]
fn test_empty_document_minimal_pdf() {
    let doc = Document::new(vec![]);
    let bytes = doc.to_bytes().unwrap();
    let s = as_text(&bytes);

    assert!(s.starts_with("%PDF-1.7\n"));
    assert!(s.ends_with("%%EOF\n"));
    assert!(s.contains("/Type /Pages"));
    assert!(s.contains("/Count 1"));
    assert!(bytes.len() <= 1024, "empty document is {} bytes", bytes.len());
}

#[test]
fn test_xref_offsets_point_at_objects() {
    let doc = Document::from_text("offsets must match");
    let bytes = uncompressed(&doc);
    let s = as_text(&bytes);

    let xref_at = s.rfind("xref\n").unwrap();
    let startxref = s.rfind("startxref\n").unwrap();
    let recorded: usize = s[startxref + 10..]
        .lines()
        .next()
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert_eq!(recorded, xref_at);

    // Every in-use entry points at "N 0 obj".
    let table = &s[xref_at..startxref];
    let mut id = 0usize;
    for line in table.lines().skip(2) {
        if line.len() < 18 || !line.ends_with("n ") && !line.ends_with('n') {
            id += 1;
            continue;
        }
        if line.ends_with("f ") || line.ends_with('f') {
            id += 1;
            continue;
        }
        let offset: usize = line[..10].parse().unwrap();
        let expect = format!("{} 0 obj", id);
        assert!(
            s[offset..].starts_with(&expect),
            "object {id} offset {offset} points at {:?}",
            &s[offset..offset + 12.min(s.len() - offset)]
        );
        id += 1;
    }
    assert!(id > 4, "xref parsed too few entries");
}

#[test]
fn test_hello_winansi_and_position() {
    // One A4 page, Helvetica 12pt: text starts at the left margin,
    // one lead below the top margin, and 'á' encodes as 0xE1.
    let doc = Document::from_text("Olá Mundo!");
    let bytes = uncompressed(&doc);
    let s = as_text(&bytes);

    assert!(s.contains("/BaseFont /Helvetica"));
    assert!(s.contains("/Encoding /WinAnsiEncoding"));
    assert!(s.contains("/MediaBox [0 0 595 842]"));
    // Margin 72; column top at 842-72=770; first baseline 770-15.
    assert!(s.contains("72 755 Td"), "missing first-line position");
    assert!(s.contains("/F1 12 Tf"));

    let needle = [b'(', b'O', b'l', 0xE1, b')'];
    assert!(
        bytes.windows(needle.len()).any(|w| w == needle),
        "'á' not encoded as WinAnsi 0xE1"
    );
}

#[test]
fn test_forced_line_break_positions() {
    let doc = Document::from_text("A\nB");
    let bytes = uncompressed(&doc);
    let s = as_text(&bytes);

    // First line at the margin, second one lead below at the same x.
    assert!(s.contains("72 755 Td"));
    assert!(s.contains("0 -15 Td"));
    assert!(s.contains("(A)"));
    assert!(s.contains("(B)"));
}

#[test]
fn test_determinism_byte_for_byte() {
    let para = Paragraph::new(
        "Determinism means identical inputs produce identical bytes, \
         every dictionary key sorted and every real number formatted \
         the same way, walking through justification and hyphenation.",
    )
    .with_align(folio::Align::Justify);
    let doc = Document::new(vec![DocPage::Auto(AutoPage::new(vec![
        Block::Paragraph(para),
        Block::Rule(folio::Rule::new()),
    ]))]);

    let a = doc.to_bytes().unwrap();
    let b = doc.to_bytes().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_pages_emitted_in_order_with_ascending_ids() {
    // Enough text to flow over several pages through a small column.
    let text = "flow ".repeat(2000);
    let template = Page::new().with_margin(folio::units::inch(3.5));
    let doc = Document::new(vec![DocPage::Auto(
        AutoPage::text(text.as_str()).with_template(template),
    )]);
    let bytes = doc.to_bytes().unwrap();
    let s = as_text(&bytes);
    let report = doc.write_into(&mut Vec::new()).unwrap();
    assert!(report.pages > 1);

    // The Kids array lists page object ids in ascending order.
    let kids_at = s.find("/Kids [").unwrap();
    let kids_end = s[kids_at..].find(']').unwrap() + kids_at;
    let ids: Vec<u32> = s[kids_at + 7..kids_end]
        .split_whitespace()
        .filter_map(|t| t.parse().ok())
        .collect();
    assert_eq!(ids.len(), report.pages * 2, "ids plus generation zeros");
    let page_ids: Vec<u32> = ids.iter().copied().step_by(2).collect();
    for pair in page_ids.windows(2) {
        assert!(pair[0] < pair[1], "page ids not ascending: {page_ids:?}");
    }
}

#[test]
fn test_compressed_stream_declared() {
    let doc = Document::from_text("compressed content");
    let bytes = doc.to_bytes().unwrap();
    let s = as_text(&bytes);
    assert!(s.contains("/Filter /FlateDecode"));
}

#[test]
fn test_write_to_file() {
    let doc = Document::from_text("to disk");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    doc.write_into(file.as_file_mut()).unwrap();
    file.as_file_mut().flush().unwrap();
    let bytes = std::fs::read(file.path()).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert!(bytes.ends_with(b"%%EOF\n"));
}

#[test]
fn test_negative_font_size_rejected() {
    let doc = Document::from_text("x")
        .with_style(folio::Style::new().with_size(-1.0));
    assert!(doc.to_bytes().is_err());
}

#[test]
fn test_rotation_attribute() {
    let page = Page::new().with_rotation(folio::layout::pages::Rotation::Deg90);
    let doc = Document::new(vec![DocPage::Page(page)]);
    let s = as_text(&doc.to_bytes().unwrap());
    assert!(s.contains("/Rotate 90"));
}
