//! The document: the top of the declarative tree, and the write
//! orchestration.
//!
//! Writing happens in two phases. First the whole document is laid
//! out: pages are produced, text is shaped and broken, and every
//! rendered glyph is registered with the font registry. Then the
//! registry is frozen and the object graph streams out in a single
//! pass: catalog, page tree, resources, page + content objects in
//! insertion order, font objects, and the cross-reference table.

use crate::error::Result;
use crate::fonts::FontRegistry;
use crate::layout::frame::{fill_blocks, LaidPage};
use crate::layout::pages::{AutoPage, Page};
use crate::object::Object;
use crate::style::{Span, Style, StyleResolved};
use crate::text::shape::ShapeReport;
use crate::writer::content::{register_fonts, render_page, PageItem};
use crate::writer::pdf::{compress_data, PdfWriter};
use std::io::Write;

/// Fixed object ids of the document skeleton.
const OBJ_CATALOG: u32 = 1;
const OBJ_PAGE_TREE: u32 = 2;
const OBJ_RESOURCES: u32 = 3;
const OBJ_FIRST_PAGE: u32 = 4;
const OBJS_PER_PAGE: u32 = 2;

/// One entry of a document's content: an explicit page, or content
/// that flows across as many pages as it needs.
#[derive(Debug, Clone)]
pub enum DocPage {
    /// A fully specified page
    Page(Page),
    /// Auto-paginated blocks
    Auto(AutoPage),
}

impl From<Page> for DocPage {
    fn from(p: Page) -> Self {
        DocPage::Page(p)
    }
}

impl From<AutoPage> for DocPage {
    fn from(a: AutoPage) -> Self {
        DocPage::Auto(a)
    }
}

/// Options for the PDF writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Compress content and font streams with FlateDecode
    pub compress: bool,
    /// Document title, emitted in an info dictionary when set
    pub title: Option<String>,
    /// Document author, emitted in an info dictionary when set
    pub author: Option<String>,
}

impl Default for WriterConfig {
    /// Compression on; no info dictionary, so output is a pure
    /// function of the document.
    fn default() -> Self {
        Self {
            compress: true,
            title: None,
            author: None,
        }
    }
}

impl WriterConfig {
    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn info_dict(&self) -> Option<Object> {
        if self.title.is_none() && self.author.is_none() {
            return None;
        }
        let mut entries = Vec::new();
        if let Some(title) = &self.title {
            entries.push(("Title", Object::string(title)));
        }
        if let Some(author) = &self.author {
            entries.push(("Author", Object::string(author)));
        }
        Some(Object::dict(entries))
    }
}

/// Soft-error record of one write: nothing here aborts emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Codepoints substituted because a font could not map them
    pub substitutions: usize,
    /// Lines emitted at natural width because no feasible breaking
    /// existed
    pub overfull_lines: usize,
    /// Number of pages written
    pub pages: usize,
}

/// A PDF document: content plus a base style.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Pages and auto-paginated content, in order
    pub content: Vec<DocPage>,
    /// Style every other style resolves against
    pub style: Style,
}

impl Document {
    /// A document from explicit content. An empty list produces a
    /// single blank A4 page.
    pub fn new(content: Vec<DocPage>) -> Self {
        Self {
            content,
            style: Style::new(),
        }
    }

    /// A document with one auto-paginated paragraph of text.
    pub fn from_text(content: impl Into<Span>) -> Self {
        Self::new(vec![DocPage::Auto(AutoPage::text(content))])
    }

    /// Set the document-wide base style.
    pub fn with_style(mut self, style: impl Into<Style>) -> Self {
        self.style = style.into();
        self
    }

    /// Render to bytes with the default configuration.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_into(&mut out)?;
        Ok(out)
    }

    /// Write the document to a sink with the default configuration.
    pub fn write_into(&self, sink: impl Write) -> Result<WriteReport> {
        self.write_with(sink, &WriterConfig::default())
    }

    /// Write the document to a sink.
    pub fn write_with(&self, sink: impl Write, config: &WriterConfig) -> Result<WriteReport> {
        let base = self.style.resolve(&StyleResolved::default())?;
        let mut report = ShapeReport::default();

        // Phase 1: lay out every page and collect its display list.
        let mut laid: Vec<LaidPage> = Vec::new();
        let content_or_default;
        let content = if self.content.is_empty() {
            content_or_default = [DocPage::Page(Page::default())];
            &content_or_default[..]
        } else {
            &self.content[..]
        };
        for entry in content {
            match entry {
                DocPage::Page(page) => laid.push(LaidPage {
                    page: page.clone(),
                    items: Vec::new(),
                }),
                DocPage::Auto(auto) => {
                    let (pages, shape_report) = fill_blocks(&auto.blocks, &base, &auto.template)?;
                    report.merge(shape_report);
                    laid.extend(pages);
                },
            }
        }

        // Absolutely positioned drawables render ahead of flowed
        // content on each page.
        for page in &mut laid {
            let mut items: Vec<PageItem> = Vec::new();
            for drawable in &page.page.drawables {
                items.extend(drawable.render(&base, &mut report)?);
            }
            items.append(&mut page.items);
            page.items = items;
        }

        // Phase 2: register fonts and glyphs, then freeze CID
        // assignment before anything is encoded.
        let mut registry = FontRegistry::new();
        for page in &laid {
            register_fonts(&page.items, &mut registry);
        }
        registry.freeze();

        // Object ids are assigned up front; emission happens in id
        // order so the xref builds incrementally.
        let page_count = laid.len() as u32;
        let first_font_id = OBJ_FIRST_PAGE + OBJS_PER_PAGE * page_count;

        let mut writer = PdfWriter::new(sink);
        writer.begin()?;
        writer.write_object(
            OBJ_CATALOG,
            &Object::dict(vec![
                ("Type", Object::name("Catalog")),
                ("Pages", Object::reference(OBJ_PAGE_TREE)),
            ]),
        )?;
        writer.write_object(
            OBJ_PAGE_TREE,
            &Object::dict(vec![
                ("Type", Object::name("Pages")),
                (
                    "Kids",
                    Object::ref_array((0..page_count).map(|i| OBJ_FIRST_PAGE + OBJS_PER_PAGE * i)),
                ),
                ("Count", Object::Integer(page_count as i64)),
            ]),
        )?;
        writer.write_object(
            OBJ_RESOURCES,
            &Object::dict(vec![("Font", registry.resource_dict(first_font_id))]),
        )?;

        for (i, page) in laid.iter().enumerate() {
            let page_id = OBJ_FIRST_PAGE + OBJS_PER_PAGE * i as u32;
            let (w, h) = page.page.size;
            writer.write_object(
                page_id,
                &Object::dict(vec![
                    ("Type", Object::name("Page")),
                    ("Parent", Object::reference(OBJ_PAGE_TREE)),
                    ("MediaBox", Object::rect(0.0, 0.0, w, h)),
                    ("Rotate", Object::Integer(page.page.rotation.degrees())),
                    ("Contents", Object::reference(page_id + 1)),
                    ("Resources", Object::reference(OBJ_RESOURCES)),
                ]),
            )?;

            let content = render_page(&page.items, &registry)?;
            let stream = if config.compress {
                Object::stream(
                    vec![("Filter", Object::name("FlateDecode"))],
                    compress_data(&content)?,
                )
            } else {
                Object::stream(vec![], content)
            };
            writer.write_object(page_id + 1, &stream)?;
        }

        let mut next_id = first_font_id;
        for (id, object) in registry.to_objects(first_font_id, config.compress)? {
            writer.write_object(id, &object)?;
            next_id = id + 1;
        }

        let info_id = match config.info_dict() {
            Some(dict) => {
                writer.write_object(next_id, &dict)?;
                Some(next_id)
            },
            None => None,
        };

        writer.finish_with_info(OBJ_CATALOG, info_id)?;

        if report.substitutions > 0 {
            log::warn!(
                "{} codepoint(s) substituted during shaping",
                report.substitutions
            );
        }
        Ok(WriteReport {
            substitutions: report.substitutions,
            overfull_lines: report.overfull_lines,
            pages: laid.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_one_page() {
        let doc = Document::new(vec![]);
        let report = doc.write_into(&mut Vec::new()).unwrap();
        assert_eq!(report.pages, 1);
    }

    #[test]
    fn test_text_document_writes() {
        let doc = Document::from_text("Hello world");
        let bytes = doc.to_bytes().unwrap();
        let s = String::from_utf8_lossy(&bytes);
        assert!(s.starts_with("%PDF-1.7\n"));
        assert!(s.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_no_info_dictionary_by_default() {
        let doc = Document::from_text("x");
        let bytes = doc.to_bytes().unwrap();
        let s = String::from_utf8_lossy(&bytes);
        assert!(!s.contains("/CreationDate"));
        assert!(!s.contains("/Producer"));
        assert!(!s.contains("/Info"));
    }

    #[test]
    fn test_info_dictionary_opt_in() {
        let doc = Document::from_text("x");
        let mut out = Vec::new();
        doc.write_with(&mut out, &WriterConfig::default().with_title("My Doc"))
            .unwrap();
        let s = String::from_utf8_lossy(&out);
        assert!(s.contains("/Title (My Doc)"));
        assert!(s.contains("/Info"));
    }

    #[test]
    fn test_substitutions_reported() {
        let doc = Document::from_text("漢");
        let report = doc.write_into(&mut Vec::new()).unwrap();
        assert_eq!(report.substitutions, 1);
    }
}
