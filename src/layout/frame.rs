//! The frame filler: distributing lines over columns and pages.
//!
//! Blocks flow through the columns of template-produced pages. A
//! paragraph is broken at the width of the column it lands in and
//! re-broken when it crosses into a column of a different width.
//! Orphan and widow lines at frame boundaries are avoided by pushing
//! paragraph starts forward and pulling lines across the boundary,
//! best-effort.

use crate::error::{Error, Result};
use crate::geom::{Point, Pt};
use crate::layout::pages::{Page, PageTemplate};
use crate::layout::{Align, Block, Paragraph, Rule};
use crate::style::{flatten, StyleResolved};
use crate::text::atoms::Atom;
use crate::text::linebreak::{break_lines, BreakParams, Line};
use crate::text::shape::{shape_paragraph, ShapeReport};
use crate::writer::content::{PageItem, PlacedLine, Segment, Shape, TextBlock};

/// Height comparisons tolerate this much accumulated rounding.
const EPS: Pt = 1e-6;

/// A rectangular region lines are packed into. The origin is the
/// bottom-left corner, in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Left edge
    pub x: Pt,
    /// Bottom edge
    pub y: Pt,
    /// Width in points
    pub width: Pt,
    /// Height in points
    pub height: Pt,
}

impl Column {
    /// Create a column from its bottom-left corner and dimensions.
    pub fn new(x: Pt, y: Pt, width: Pt, height: Pt) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Y coordinate of the top edge.
    pub fn top(&self) -> Pt {
        self.y + self.height
    }
}

/// A page with its laid-out flowing content.
#[derive(Debug, Clone)]
pub struct LaidPage {
    /// The page descriptor (size, rotation, drawables)
    pub page: Page,
    /// Flowed content in drawing order
    pub items: Vec<PageItem>,
}

/// One column being filled.
struct Fill {
    page_idx: usize,
    column: Column,
    used: Pt,
    items: Vec<PageItem>,
}

impl Fill {
    fn has_content(&self) -> bool {
        self.used > 0.0 || !self.items.is_empty()
    }

    fn remaining(&self) -> Pt {
        self.column.height - self.used
    }
}

/// Lay out blocks through the pages of a template.
pub fn fill_blocks(
    blocks: &[Block],
    base: &StyleResolved,
    template: &PageTemplate,
) -> Result<(Vec<LaidPage>, ShapeReport)> {
    let mut filler = Filler {
        template,
        pages: Vec::new(),
        fills: Vec::new(),
        next_column: 0,
        report: ShapeReport::default(),
    };
    filler.ensure_fill()?;

    for block in blocks {
        match block {
            Block::Paragraph(p) => filler.paragraph(p, base)?,
            Block::Rule(r) => filler.rule(r)?,
        }
    }

    Ok(filler.finish())
}

struct Filler<'a> {
    template: &'a PageTemplate,
    pages: Vec<LaidPage>,
    fills: Vec<Fill>,
    /// Index of the next unopened column on the current page
    next_column: usize,
    report: ShapeReport,
}

impl Filler<'_> {
    /// Open the first column if nothing is open yet.
    fn ensure_fill(&mut self) -> Result<()> {
        if self.fills.is_empty() {
            self.advance_fill()?;
        }
        Ok(())
    }

    /// Move to the next column, opening a new page when the current
    /// one is exhausted.
    fn advance_fill(&mut self) -> Result<()> {
        loop {
            if let Some(page) = self.pages.last() {
                let columns = page.page.effective_columns();
                if self.next_column < columns.len() {
                    let column = columns[self.next_column];
                    validate_column(&column)?;
                    self.next_column += 1;
                    self.fills.push(Fill {
                        page_idx: self.pages.len() - 1,
                        column,
                        used: 0.0,
                        items: Vec::new(),
                    });
                    return Ok(());
                }
            }
            let page = self.template.page(self.pages.len());
            if page.effective_columns().is_empty() {
                return Err(Error::InvalidInput("page template has no columns".into()));
            }
            self.pages.push(LaidPage {
                page,
                items: Vec::new(),
            });
            self.next_column = 0;
        }
    }

    fn current(&self) -> &Fill {
        self.fills.last().expect("ensure_fill() opens a column")
    }

    fn current_mut(&mut self) -> &mut Fill {
        self.fills.last_mut().expect("ensure_fill() opens a column")
    }

    /// Lay out one paragraph, possibly across several columns.
    fn paragraph(&mut self, p: &Paragraph, base: &StyleResolved) -> Result<()> {
        let para_style = p.style.resolve(base)?;
        let runs = flatten(&p.spans, &para_style)?;
        let justify = p.align == Align::Justify;
        let (atoms, report) = shape_paragraph(&runs, justify);
        self.report.merge(report);
        let fallback_lead = para_style.lead();
        let params = BreakParams::default();

        self.ensure_fill()?;

        // Current breaking of the remaining atoms. `offset` is the
        // global index the relative line ranges are based on.
        let mut offset = 0usize;
        let mut broken_at = self.current().column.width;
        let mut lines = break_suffix(&atoms, offset, broken_at, p, &params);
        let mut li = 0usize;

        // Chunks are committed to their fills only when the whole
        // paragraph is placed, so widow fixes can still pull lines
        // back across the last boundary.
        let mut chunks: Vec<ParaChunk> = Vec::new();
        let mut rebroke_since_chunk = false;

        loop {
            let fill_idx = self.fills.len() - 1;
            let column = self.current().column;

            if column.width != broken_at {
                offset = lines[li].start;
                lines = break_suffix(&atoms, offset, column.width, p, &params);
                li = 0;
                broken_at = column.width;
                rebroke_since_chunk = true;
            }

            // Orphan avoidance: don't leave just the first line of a
            // paragraph at the bottom of a column that has content.
            if chunks.is_empty() && p.avoid_orphans && self.current().has_content() {
                let room = count_fitting(&atoms, &lines[li..], self.current().remaining(), fallback_lead);
                if room == 1 && lines.len() - li >= 2 {
                    log::debug!("pushing paragraph start to the next column to avoid an orphan");
                    self.advance_fill()?;
                    rebroke_since_chunk = false;
                    continue;
                }
            }

            let mut chunk = ParaChunk {
                fill_idx,
                start_used: self.current().used,
                lines: Vec::new(),
            };

            while li < lines.len() {
                let lead = line_lead(&atoms, &lines[li], fallback_lead);
                let fresh = !self.current().has_content() && chunk.lines.is_empty();
                let fits = self.current().used + lead <= self.current().column.height + EPS;
                if !fits && !fresh {
                    break;
                }

                // Widow avoidance: the paragraph's last line is about
                // to sit alone at the top of this column. Pull the
                // previous column's last paragraph line forward when
                // it has enough to spare.
                if p.avoid_orphans
                    && chunk.lines.is_empty()
                    && li == lines.len() - 1
                    && lines.len() >= 3
                    && !rebroke_since_chunk
                {
                    if let Some(prev) = chunks.last_mut() {
                        let prev_lead = prev.lines.last().map(|l| l.lead).unwrap_or(0.0);
                        let both_fit = self.current().used + prev_lead + lead
                            <= self.current().column.height + EPS;
                        if prev.lines.len() >= 3 && both_fit && li > 0 {
                            let moved = prev.lines.pop().expect("len checked");
                            self.fills[prev.fill_idx].used -= moved.lead;
                            li -= 1;
                            log::debug!("moved a line forward to avoid a widow");
                            continue;
                        }
                    }
                }

                if lines[li].overfull {
                    self.report.overfull_lines += 1;
                    log::warn!("overfull line emitted at natural width");
                }
                let first_of_para = offset == 0 && lines[li].start == first_content(&atoms);
                chunk.lines.push(PlacedRecord {
                    line: lines[li].clone(),
                    lead,
                    indent: if first_of_para { p.indent } else { 0.0 },
                });
                self.current_mut().used += lead;
                li += 1;
            }

            if !chunk.lines.is_empty() {
                chunks.push(chunk);
                rebroke_since_chunk = false;
            }
            if li >= lines.len() {
                break;
            }
            self.advance_fill()?;
        }

        // Commit the chunks into their fills.
        for chunk in chunks {
            let column = self.fills[chunk.fill_idx].column;
            let mut y_used = chunk.start_used;
            let mut placed = Vec::with_capacity(chunk.lines.len());
            for record in &chunk.lines {
                y_used += record.lead;
                placed.push(place_line(
                    &atoms,
                    record,
                    &column,
                    column.top() - y_used,
                    p.align,
                ));
            }
            self.fills[chunk.fill_idx]
                .items
                .push(PageItem::Text(TextBlock { lines: placed }));
        }
        Ok(())
    }

    /// Lay out a horizontal rule.
    fn rule(&mut self, r: &Rule) -> Result<()> {
        self.ensure_fill()?;
        let height = r.height();
        if self.current().remaining() + EPS < height && self.current().has_content() {
            self.advance_fill()?;
        }
        let fill = self.current_mut();
        let column = fill.column;
        let y = column.top() - fill.used - r.margin.top - r.stroke_width / 2.0;
        fill.items.push(PageItem::Shape(Shape::Line {
            from: Point::new(column.x + r.margin.left, y),
            to: Point::new(column.x + column.width - r.margin.right, y),
            color: r.stroke_color,
            width: r.stroke_width,
        }));
        fill.used += height;
        Ok(())
    }

    /// Merge fills into their pages, in fill order.
    fn finish(mut self) -> (Vec<LaidPage>, ShapeReport) {
        for fill in self.fills.drain(..) {
            self.pages[fill.page_idx].items.extend(fill.items);
        }
        (self.pages, self.report)
    }
}

/// A paragraph's lines destined for one column.
struct ParaChunk {
    fill_idx: usize,
    /// Column height already consumed when the chunk starts
    start_used: Pt,
    lines: Vec<PlacedRecord>,
}

struct PlacedRecord {
    /// Line with absolute atom indices (`break_suffix` shifts them)
    line: Line,
    lead: Pt,
    indent: Pt,
}

fn validate_column(column: &Column) -> Result<()> {
    if !(column.width > 0.0) || !(column.height > 0.0) {
        return Err(Error::InvalidInput(format!(
            "column must have positive dimensions, got {}x{}",
            column.width, column.height
        )));
    }
    Ok(())
}

/// Break the atom suffix starting at `offset` for a column width,
/// returning lines with absolute atom indices.
fn break_suffix(
    atoms: &[Atom],
    offset: usize,
    width: Pt,
    p: &Paragraph,
    params: &BreakParams,
) -> Vec<Line> {
    let indent = if offset == 0 { p.indent } else { 0.0 };
    let width_of = move |line: usize| {
        if line == 0 && indent > 0.0 {
            width - indent
        } else {
            width
        }
    };
    let mut lines = break_lines(&atoms[offset..], &width_of, p.optimal, params);
    for line in &mut lines {
        line.start += offset;
        line.end += offset;
    }
    lines
}

/// Index of the first content atom of the paragraph.
fn first_content(atoms: &[Atom]) -> usize {
    let mut i = 0;
    while i < atoms.len() {
        match &atoms[i] {
            Atom::Glue { .. } => i += 1,
            Atom::Penalty { cost, .. } if *cost != f64::NEG_INFINITY => i += 1,
            _ => break,
        }
    }
    i
}

/// How many of the given lines fit into the remaining height.
fn count_fitting(atoms: &[Atom], lines: &[Line], remaining: Pt, fallback_lead: Pt) -> usize {
    let mut used = 0.0;
    let mut count = 0;
    for line in lines {
        used += line_lead(atoms, line, fallback_lead);
        if used > remaining + EPS {
            break;
        }
        count += 1;
    }
    count
}

/// The line's height: the maximum lead of the runs on it.
fn line_lead(atoms: &[Atom], line: &Line, fallback: Pt) -> Pt {
    let mut lead: Pt = 0.0;
    for atom in &atoms[line.start..line.end.min(atoms.len())] {
        match atom {
            Atom::Box { runs, .. } => {
                for run in runs {
                    lead = lead.max(run.lead());
                }
            },
            Atom::Glue { run: Some(run), .. } => lead = lead.max(run.lead()),
            _ => {},
        }
    }
    if lead == 0.0 {
        fallback
    } else {
        lead
    }
}

/// Build the positioned line for rendering.
fn place_line(
    atoms: &[Atom],
    record: &PlacedRecord,
    column: &Column,
    baseline: Pt,
    align: Align,
) -> PlacedLine {
    let (segments, visual_width) = line_segments(atoms, &record.line, align);
    let available = column.width - record.indent;
    let x = column.x
        + record.indent
        + match align {
            Align::Left | Align::Justify => 0.0,
            Align::Center => ((available - visual_width) / 2.0).max(0.0),
            Align::Right => (available - visual_width).max(0.0),
        };
    PlacedLine {
        x,
        y: baseline,
        segments,
    }
}

/// Materialize a broken line into renderable segments, applying the
/// justification ratio to the glue and taking the hyphen when the
/// break is flagged. Trailing spaces are pruned; the returned width is
/// the visible extent.
pub fn line_segments(atoms: &[Atom], line: &Line, align: Align) -> (Vec<Segment>, Pt) {
    let render_ratio = if align == Align::Justify {
        line.ratio
    } else {
        0.0
    };

    let mut segments = Vec::new();
    let mut visual_width = 0.0;
    for atom in &atoms[line.start..line.end.min(atoms.len())] {
        match atom {
            Atom::Box { width, runs } => {
                for run in runs {
                    segments.push(Segment::Run(run.clone()));
                }
                visual_width += width;
            },
            Atom::Glue {
                width,
                stretch,
                shrink,
                run,
            } => {
                let adjusted = if render_ratio >= 0.0 {
                    width + render_ratio * stretch
                } else {
                    width + render_ratio * shrink
                };
                segments.push(Segment::Space {
                    run: run.clone(),
                    width: adjusted,
                });
                visual_width += adjusted;
            },
            Atom::Penalty { .. } => {},
        }
    }
    if line.hyphenated {
        if let Some(Atom::Penalty { run: Some(run), .. }) = atoms.get(line.end) {
            segments.push(Segment::Run(run.clone()));
            visual_width += run.width;
        }
    }
    // A line never renders a trailing space.
    while let Some(Segment::Space { width, .. }) = segments.last() {
        visual_width -= width;
        segments.pop();
    }
    (segments, visual_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::pages::Page;
    use crate::units::inch;

    fn base() -> StyleResolved {
        StyleResolved::default()
    }

    fn single_column_template(width: Pt, height: Pt) -> PageTemplate {
        PageTemplate::Fixed(Page::new().with_columns(vec![Column::new(
            inch(1.0),
            inch(1.0),
            width,
            height,
        )]))
    }

    fn count_lines(pages: &[LaidPage]) -> usize {
        pages
            .iter()
            .flat_map(|p| &p.items)
            .filter_map(|i| match i {
                PageItem::Text(b) => Some(b.lines.len()),
                _ => None,
            })
            .sum()
    }

    #[test]
    fn test_single_paragraph_single_page() {
        let blocks = vec![Block::Paragraph(Paragraph::new("hello world"))];
        let (pages, report) =
            fill_blocks(&blocks, &base(), &single_column_template(400.0, 600.0)).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(count_lines(&pages), 1);
        assert_eq!(report.substitutions, 0);
    }

    #[test]
    fn test_first_baseline_is_top_minus_lead() {
        let blocks = vec![Block::Paragraph(Paragraph::new("hello"))];
        let template = single_column_template(400.0, 600.0);
        let (pages, _) = fill_blocks(&blocks, &base(), &template).unwrap();
        let PageItem::Text(block) = &pages[0].items[0] else {
            panic!("expected text");
        };
        // Column top is at 72 + 600; default lead is 15.
        assert!((block.lines[0].y - (672.0 - 15.0)).abs() < 1e-9);
        assert_eq!(block.lines[0].x, 72.0);
    }

    #[test]
    fn test_content_overflows_to_second_page() {
        let text = "word ".repeat(300);
        let blocks = vec![Block::Paragraph(Paragraph::new(text.as_str()))];
        // Room for only 4 lines per page.
        let (pages, _) =
            fill_blocks(&blocks, &base(), &single_column_template(200.0, 61.0)).unwrap();
        assert!(pages.len() > 1);
        assert!(count_lines(&pages) > 4);
    }

    #[test]
    fn test_indent_shifts_first_line_only() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let blocks = vec![Block::Paragraph(
            Paragraph::new(text).with_indent(20.0),
        )];
        let (pages, _) =
            fill_blocks(&blocks, &base(), &single_column_template(150.0, 600.0)).unwrap();
        let PageItem::Text(block) = &pages[0].items[0] else {
            panic!("expected text");
        };
        assert!(block.lines.len() >= 2);
        assert_eq!(block.lines[0].x, 72.0 + 20.0);
        assert_eq!(block.lines[1].x, 72.0);
    }

    #[test]
    fn test_rule_consumes_height_and_draws_line() {
        let blocks = vec![
            Block::Rule(Rule::new()),
            Block::Paragraph(Paragraph::new("after")),
        ];
        let (pages, _) =
            fill_blocks(&blocks, &base(), &single_column_template(300.0, 600.0)).unwrap();
        let items = &pages[0].items;
        let PageItem::Shape(Shape::Line { from, to, .. }) = &items[0] else {
            panic!("expected rule line first");
        };
        assert_eq!(from.x, 72.0);
        assert_eq!(to.x, 372.0);
        // Rule sits margin.top below the column top, at the stroke center.
        assert!((from.y - (672.0 - 6.5)).abs() < 1e-9);
        let PageItem::Text(block) = &items[1] else {
            panic!("expected text after rule");
        };
        // Paragraph starts below the rule's consumed height (13pt).
        assert!((block.lines[0].y - (672.0 - 13.0 - 15.0)).abs() < 1e-9);
    }

    /// Courier layout arithmetic: every character is 7.2pt at size 12,
    /// so a 120pt column fits exactly 4 three-letter words per line
    /// (4×21.6 + 3×7.2 = 115.2) and the lead is 15pt.
    fn courier_para(text: &str) -> Paragraph {
        Paragraph::new(text)
            .with_style(crate::style::Style::new().with_font(crate::fonts::courier()))
            .with_optimal(false)
    }

    #[test]
    fn test_widow_avoidance_moves_line_forward() {
        // 16 words → 4 lines of 4; the column holds 3 lines, so the
        // last line would sit alone in the second column.
        let text = ["aaa"; 16].join(" ");
        let para = courier_para(&text);
        let template = single_column_template(120.0, 15.0 * 3.0 + 1.0);
        let (pages, _) =
            fill_blocks(&[Block::Paragraph(para.clone())], &base(), &template).unwrap();
        let blocks: Vec<usize> = pages
            .iter()
            .flat_map(|p| &p.items)
            .filter_map(|i| match i {
                PageItem::Text(b) => Some(b.lines.len()),
                _ => None,
            })
            .collect();
        assert_eq!(blocks.iter().sum::<usize>(), 4);
        // 3+1 reflows to 2+2: no frame holds exactly one line.
        assert_eq!(blocks, vec![2, 2], "widow not fixed: {blocks:?}");

        // With avoidance off, the widow stays.
        let (pages_off, _) = fill_blocks(
            &[Block::Paragraph(para.with_avoid_orphans(false))],
            &base(),
            &template,
        )
        .unwrap();
        let blocks_off: Vec<usize> = pages_off
            .iter()
            .flat_map(|p| &p.items)
            .filter_map(|i| match i {
                PageItem::Text(b) => Some(b.lines.len()),
                _ => None,
            })
            .collect();
        assert_eq!(blocks_off, vec![3, 1]);
    }

    #[test]
    fn test_orphan_avoidance_pushes_paragraph() {
        // The first paragraph takes 3 of the column's 4 lines; the
        // second (2 lines) would leave an orphan at the bottom and is
        // pushed to the next page instead.
        let first = ["xxx"; 12].join(" ");
        let second = ["yyy"; 8].join(" ");
        let blocks = vec![
            Block::Paragraph(courier_para(&first)),
            Block::Paragraph(courier_para(&second)),
        ];
        let (pages, _) = fill_blocks(
            &blocks,
            &base(),
            &single_column_template(120.0, 15.0 * 4.0 + 1.0),
        )
        .unwrap();
        assert_eq!(pages.len(), 2);
        let first_page_blocks: Vec<usize> = pages[0]
            .items
            .iter()
            .filter_map(|i| match i {
                PageItem::Text(b) => Some(b.lines.len()),
                _ => None,
            })
            .collect();
        assert_eq!(first_page_blocks, vec![3], "orphan left on page 1");
    }

    #[test]
    fn test_rejects_zero_width_column() {
        let template = PageTemplate::Fixed(
            Page::new().with_columns(vec![Column::new(0.0, 0.0, 0.0, 100.0)]),
        );
        let blocks = vec![Block::Paragraph(Paragraph::new("x"))];
        assert!(fill_blocks(&blocks, &base(), &template).is_err());
    }

    #[test]
    fn test_two_columns_fill_in_order() {
        let cols = vec![
            Column::new(72.0, 72.0, 120.0, 30.5),
            Column::new(220.0, 72.0, 120.0, 30.5),
        ];
        let template = PageTemplate::Fixed(Page::new().with_columns(cols));
        // 16 Courier words → 4 lines of 4; two lines per column.
        let text = ["abc"; 16].join(" ");
        let para = courier_para(&text).with_avoid_orphans(false);
        let (pages, _) = fill_blocks(&[Block::Paragraph(para)], &base(), &template).unwrap();
        assert_eq!(pages.len(), 1);
        // Both columns should have received text.
        let blocks: Vec<&TextBlock> = pages[0]
            .items
            .iter()
            .filter_map(|i| match i {
                PageItem::Text(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(blocks.len(), 2);
        // Second column lines start at its own x.
        assert!(blocks[1].lines.iter().all(|l| l.x >= 220.0));
    }
}
