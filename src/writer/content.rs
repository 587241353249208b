//! Content stream generation.
//!
//! Pages are laid out into a small display list ([`PageItem`]s); this
//! module renders that list into PDF content stream operators: text
//! objects with `TJ` arrays carrying kerning offsets, and path
//! operators for the drawing primitives.

use crate::error::{Error, Result};
use crate::fonts::{Font, FontRegistry, GLYPH_SPACE};
use crate::geom::{Point, Pt};
use crate::style::Rgb;
use crate::text::shape::ShapedRun;
use crate::writer::serializer::format_real;

/// Bézier circle constant: control-point distance for a quarter arc.
const KAPPA: f64 = 0.552_284_749_831;

/// One element of a page's display list.
#[derive(Debug, Clone)]
pub enum PageItem {
    /// A block of typeset text lines sharing one text object
    Text(TextBlock),
    /// A vector drawing
    Shape(Shape),
}

/// A block of positioned lines, rendered as one `BT..ET` object.
#[derive(Debug, Clone, Default)]
pub struct TextBlock {
    /// Lines in top-to-bottom order
    pub lines: Vec<PlacedLine>,
}

/// One laid-out line with an absolute baseline origin.
#[derive(Debug, Clone)]
pub struct PlacedLine {
    /// X of the line start, in page space
    pub x: Pt,
    /// Baseline Y, in page space
    pub y: Pt,
    /// The line's content in order
    pub segments: Vec<Segment>,
}

/// A run of glyphs or an (adjusted) inter-word space.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Shaped glyphs
    Run(ShapedRun),
    /// An inter-word space set to `width` points; the glyph itself is
    /// rendered when present, with the elastic difference applied as a
    /// positioning offset
    Space {
        /// The space glyph, if any
        run: Option<ShapedRun>,
        /// Width to occupy after justification
        width: Pt,
    },
}

/// Vector drawing primitives.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A straight stroked line
    Line {
        /// Start point
        from: Point,
        /// End point
        to: Point,
        /// Stroke color
        color: Rgb,
        /// Stroke width in points
        width: Pt,
    },
    /// An axis-aligned rectangle
    Rect {
        /// Bottom-left corner
        origin: Point,
        /// Width in points
        width: Pt,
        /// Height in points
        height: Pt,
        /// Fill color, if filled
        fill: Option<Rgb>,
        /// Stroke color and width, if stroked
        stroke: Option<(Rgb, Pt)>,
    },
    /// An axis-aligned ellipse, approximated by four cubic Béziers
    Ellipse {
        /// Center point
        center: Point,
        /// Horizontal radius
        rx: Pt,
        /// Vertical radius
        ry: Pt,
        /// Fill color, if filled
        fill: Option<Rgb>,
        /// Stroke color and width, if stroked
        stroke: Option<(Rgb, Pt)>,
    },
}

/// Register every font and glyph a display list will render.
///
/// Called for all pages before the registry freezes, so the used-set
/// is exactly the set of glyphs that later emission encodes.
pub fn register_fonts(items: &[PageItem], registry: &mut FontRegistry) {
    for item in items {
        let PageItem::Text(block) = item else {
            continue;
        };
        for line in &block.lines {
            for segment in &line.segments {
                let run = match segment {
                    Segment::Run(run) => run,
                    Segment::Space { run: Some(run), .. } => run,
                    Segment::Space { run: None, .. } => continue,
                };
                let font_ref = registry.register(run.font());
                for glyph in &run.glyphs {
                    registry.record_use(font_ref, glyph.codepoint, glyph.glyph_id);
                }
            }
        }
    }
}

/// Render a display list into content stream bytes.
///
/// The registry must be frozen: glyphs of embedded fonts are encoded
/// through their assigned CIDs.
pub fn render_page(items: &[PageItem], registry: &FontRegistry) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for item in items {
        match item {
            PageItem::Text(block) => render_text_block(&mut out, block, registry)?,
            PageItem::Shape(shape) => render_shape(&mut out, shape),
        }
    }
    Ok(out)
}

/// Elements of a `TJ` array: encoded glyph bytes or a positioning
/// offset in thousandths of the font size.
enum TjItem {
    Text(Vec<u8>),
    Offset(f64),
}

struct TextState {
    font_name: Option<String>,
    size: Pt,
    color: Option<Rgb>,
    position: Option<(Pt, Pt)>,
    pending: Vec<TjItem>,
}

fn render_text_block(
    out: &mut Vec<u8>,
    block: &TextBlock,
    registry: &FontRegistry,
) -> Result<()> {
    if block.lines.is_empty() {
        return Ok(());
    }
    out.extend_from_slice(b"BT\n");
    let mut state = TextState {
        font_name: None,
        size: 0.0,
        color: None,
        position: None,
        pending: Vec::new(),
    };

    for line in &block.lines {
        // Position the line start relative to the previous one.
        let (dx, dy) = match state.position {
            Some((px, py)) => (line.x - px, line.y - py),
            None => (line.x, line.y),
        };
        flush_tj(out, &mut state);
        out.extend_from_slice(
            format!("{} {} Td\n", format_real(dx), format_real(dy)).as_bytes(),
        );
        state.position = Some((line.x, line.y));

        for segment in &line.segments {
            match segment {
                Segment::Run(run) => {
                    ensure_style(out, &mut state, run, registry)?;
                    encode_run(&mut state, run, registry)?;
                },
                Segment::Space { run, width } => match run {
                    Some(run) => {
                        ensure_style(out, &mut state, run, registry)?;
                        encode_run(&mut state, run, registry)?;
                        let extra = width - run.width;
                        if extra.abs() > 1e-9 {
                            state
                                .pending
                                .push(TjItem::Offset(-extra * GLYPH_SPACE / state.size));
                        }
                    },
                    None => {
                        if width.abs() > 1e-9 && state.size > 0.0 {
                            state
                                .pending
                                .push(TjItem::Offset(-width * GLYPH_SPACE / state.size));
                        }
                    },
                },
            }
        }
        flush_tj(out, &mut state);
    }
    out.extend_from_slice(b"ET\n");
    Ok(())
}

/// Emit `Tf`/`rg` as needed before glyphs of `run` are appended.
fn ensure_style(
    out: &mut Vec<u8>,
    state: &mut TextState,
    run: &ShapedRun,
    registry: &FontRegistry,
) -> Result<()> {
    let font_ref = registry
        .lookup(run.font())
        .ok_or(Error::InternalState("font rendered but never registered"))?;
    let name = registry.resource_name(font_ref);
    if state.font_name.as_deref() != Some(&name) || state.size != run.size() {
        flush_tj(out, state);
        out.extend_from_slice(
            format!("/{} {} Tf\n", name, format_real(run.size())).as_bytes(),
        );
        state.font_name = Some(name);
        state.size = run.size();
    }
    let color = run.color();
    if state.color != Some(color) {
        flush_tj(out, state);
        out.extend_from_slice(
            format!(
                "{} {} {} rg\n",
                format_real(color.r),
                format_real(color.g),
                format_real(color.b)
            )
            .as_bytes(),
        );
        state.color = Some(color);
    }
    Ok(())
}

/// Append a run's glyphs to the pending `TJ` array, splitting the
/// literal at kern positions.
fn encode_run(state: &mut TextState, run: &ShapedRun, registry: &FontRegistry) -> Result<()> {
    let font_ref = registry
        .lookup(run.font())
        .ok_or(Error::InternalState("font rendered but never registered"))?;
    let mut literal = Vec::new();
    for glyph in &run.glyphs {
        if glyph.kern != 0.0 {
            if !literal.is_empty() {
                state.pending.push(TjItem::Text(std::mem::take(&mut literal)));
            }
            state.pending.push(TjItem::Offset(-glyph.kern));
        }
        match run.font() {
            Font::Standard(_) => {
                // Shaping already substituted unmappable codepoints,
                // so the glyph id is the WinAnsi byte.
                literal.push(glyph.glyph_id as u8);
            },
            Font::Embedded(_) => {
                let cid = registry.cid(font_ref, glyph.glyph_id);
                literal.extend_from_slice(&cid.to_be_bytes());
            },
        }
    }
    if !literal.is_empty() {
        state.pending.push(TjItem::Text(literal));
    }
    Ok(())
}

/// Write the pending `TJ` array, if any.
fn flush_tj(out: &mut Vec<u8>, state: &mut TextState) {
    if state.pending.is_empty() {
        return;
    }
    out.push(b'[');
    for item in state.pending.drain(..) {
        match item {
            TjItem::Text(bytes) => {
                out.push(b'(');
                for b in bytes {
                    match b {
                        b'(' => out.extend_from_slice(b"\\("),
                        b')' => out.extend_from_slice(b"\\)"),
                        b'\\' => out.extend_from_slice(b"\\\\"),
                        b'\r' => out.extend_from_slice(b"\\r"),
                        _ => out.push(b),
                    }
                }
                out.push(b')');
            },
            TjItem::Offset(v) => {
                out.push(b' ');
                out.extend_from_slice(format_real(v).as_bytes());
                out.push(b' ');
            },
        }
    }
    out.extend_from_slice(b"] TJ\n");
}

fn render_shape(out: &mut Vec<u8>, shape: &Shape) {
    out.extend_from_slice(b"q\n");
    match shape {
        Shape::Line {
            from,
            to,
            color,
            width,
        } => {
            write_stroke_state(out, *color, *width);
            out.extend_from_slice(
                format!(
                    "{} {} m {} {} l S\n",
                    format_real(from.x),
                    format_real(from.y),
                    format_real(to.x),
                    format_real(to.y)
                )
                .as_bytes(),
            );
        },
        Shape::Rect {
            origin,
            width,
            height,
            fill,
            stroke,
        } => {
            let op = paint_op(out, *fill, *stroke);
            out.extend_from_slice(
                format!(
                    "{} {} {} {} re {}\n",
                    format_real(origin.x),
                    format_real(origin.y),
                    format_real(*width),
                    format_real(*height),
                    op
                )
                .as_bytes(),
            );
        },
        Shape::Ellipse {
            center,
            rx,
            ry,
            fill,
            stroke,
        } => {
            let op = paint_op(out, *fill, *stroke);
            let (cx, cy) = (center.x, center.y);
            let (kx, ky) = (rx * KAPPA, ry * KAPPA);
            let m = |x: f64, y: f64| format!("{} {}", format_real(x), format_real(y));
            out.extend_from_slice(format!("{} m\n", m(cx + rx, cy)).as_bytes());
            out.extend_from_slice(
                format!(
                    "{} {} {} c\n",
                    m(cx + rx, cy + ky),
                    m(cx + kx, cy + ry),
                    m(cx, cy + ry)
                )
                .as_bytes(),
            );
            out.extend_from_slice(
                format!(
                    "{} {} {} c\n",
                    m(cx - kx, cy + ry),
                    m(cx - rx, cy + ky),
                    m(cx - rx, cy)
                )
                .as_bytes(),
            );
            out.extend_from_slice(
                format!(
                    "{} {} {} c\n",
                    m(cx - rx, cy - ky),
                    m(cx - kx, cy - ry),
                    m(cx, cy - ry)
                )
                .as_bytes(),
            );
            out.extend_from_slice(
                format!(
                    "{} {} {} c\n",
                    m(cx + kx, cy - ry),
                    m(cx + rx, cy - ky),
                    m(cx + rx, cy)
                )
                .as_bytes(),
            );
            out.extend_from_slice(format!("{}\n", op).as_bytes());
        },
    }
    out.extend_from_slice(b"Q\n");
}

fn write_stroke_state(out: &mut Vec<u8>, color: Rgb, width: Pt) {
    out.extend_from_slice(
        format!(
            "{} {} {} RG {} w\n",
            format_real(color.r),
            format_real(color.g),
            format_real(color.b),
            format_real(width)
        )
        .as_bytes(),
    );
}

/// Write fill/stroke state and return the matching paint operator.
fn paint_op(out: &mut Vec<u8>, fill: Option<Rgb>, stroke: Option<(Rgb, Pt)>) -> &'static str {
    if let Some(c) = fill {
        out.extend_from_slice(
            format!(
                "{} {} {} rg\n",
                format_real(c.r),
                format_real(c.g),
                format_real(c.b)
            )
            .as_bytes(),
        );
    }
    if let Some((c, w)) = stroke {
        write_stroke_state(out, c, w);
    }
    match (fill.is_some(), stroke.is_some()) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::Standard14;
    use crate::style::StyleResolved;
    use crate::text::shape::shape_paragraph;
    use crate::text::atoms::Atom;

    fn run_for(text: &str) -> ShapedRun {
        let (atoms, _) = shape_paragraph(&[(text.to_string(), StyleResolved::default())], true);
        match atoms.into_iter().next().unwrap() {
            Atom::Box { mut runs, .. } => runs.remove(0),
            _ => panic!("expected a box"),
        }
    }

    fn registry_with_helvetica() -> FontRegistry {
        let mut reg = FontRegistry::new();
        reg.register(&Font::Standard(Standard14::Helvetica));
        reg.freeze();
        reg
    }

    #[test]
    fn test_text_block_basic_operators() {
        let mut reg = FontRegistry::new();
        let items = vec![PageItem::Text(TextBlock {
            lines: vec![PlacedLine {
                x: 72.0,
                y: 700.0,
                segments: vec![Segment::Run(run_for("Hello"))],
            }],
        })];
        register_fonts(&items, &mut reg);
        reg.freeze();
        let bytes = render_page(&items, &reg).unwrap();
        let s = String::from_utf8_lossy(&bytes);
        assert!(s.starts_with("BT\n"));
        assert!(s.contains("72 700 Td"));
        assert!(s.contains("/F1 12 Tf"));
        assert!(s.contains("0 0 0 rg"));
        assert!(s.contains("(Hello)] TJ"));
        assert!(s.trim_end().ends_with("ET"));
    }

    #[test]
    fn test_kerning_emits_offset() {
        let mut reg = FontRegistry::new();
        let items = vec![PageItem::Text(TextBlock {
            lines: vec![PlacedLine {
                x: 0.0,
                y: 0.0,
                segments: vec![Segment::Run(run_for("AV"))],
            }],
        })];
        register_fonts(&items, &mut reg);
        reg.freeze();
        let bytes = render_page(&items, &reg).unwrap();
        let s = String::from_utf8_lossy(&bytes);
        // Helvetica kerns A/V by -70: TJ offset of 70 moves right-to-left.
        assert!(s.contains("(A) 70 (V)"), "got: {s}");
    }

    #[test]
    fn test_winansi_byte_encoding() {
        let mut reg = FontRegistry::new();
        let items = vec![PageItem::Text(TextBlock {
            lines: vec![PlacedLine {
                x: 0.0,
                y: 0.0,
                segments: vec![Segment::Run(run_for("á"))],
            }],
        })];
        register_fonts(&items, &mut reg);
        reg.freeze();
        let bytes = render_page(&items, &reg).unwrap();
        // 'á' is WinAnsi 0xE1, inside a literal string.
        let pos = bytes.windows(3).position(|w| w == [b'(', 0xE1, b')']);
        assert!(pos.is_some());
    }

    #[test]
    fn test_unregistered_font_is_error() {
        let reg = registry_with_helvetica();
        let bold = crate::style::Style::new()
            .with_bold(true)
            .resolve(&StyleResolved::default())
            .unwrap();
        let (atoms, _) = shape_paragraph(&[("x".to_string(), bold)], true);
        let run = match atoms.into_iter().next().unwrap() {
            Atom::Box { mut runs, .. } => runs.remove(0),
            _ => panic!(),
        };
        let items = vec![PageItem::Text(TextBlock {
            lines: vec![PlacedLine {
                x: 0.0,
                y: 0.0,
                segments: vec![Segment::Run(run)],
            }],
        })];
        assert!(matches!(
            render_page(&items, &reg),
            Err(Error::InternalState(_))
        ));
    }

    #[test]
    fn test_rect_fill_and_stroke() {
        let reg = registry_with_helvetica();
        let items = vec![PageItem::Shape(Shape::Rect {
            origin: Point::new(10.0, 20.0),
            width: 100.0,
            height: 50.0,
            fill: Some(Rgb::new(1.0, 0.0, 0.0)),
            stroke: Some((Rgb::BLACK, 2.0)),
        })];
        let bytes = render_page(&items, &reg).unwrap();
        let s = String::from_utf8_lossy(&bytes);
        assert!(s.contains("1 0 0 rg"));
        assert!(s.contains("2 w"));
        assert!(s.contains("10 20 100 50 re B"));
        assert!(s.starts_with("q\n"));
        assert!(s.trim_end().ends_with('Q'));
    }

    #[test]
    fn test_ellipse_has_four_curves() {
        let reg = registry_with_helvetica();
        let items = vec![PageItem::Shape(Shape::Ellipse {
            center: Point::new(100.0, 100.0),
            rx: 50.0,
            ry: 30.0,
            fill: None,
            stroke: Some((Rgb::BLACK, 1.0)),
        })];
        let bytes = render_page(&items, &reg).unwrap();
        let s = String::from_utf8_lossy(&bytes);
        assert_eq!(s.matches(" c\n").count(), 4);
        assert!(s.contains("150 100 m"));
    }

    #[test]
    fn test_space_offset_adjusts_width() {
        let mut reg = FontRegistry::new();
        let space = run_for_space();
        let natural = space.width;
        let items = vec![PageItem::Text(TextBlock {
            lines: vec![PlacedLine {
                x: 0.0,
                y: 0.0,
                segments: vec![
                    Segment::Run(run_for("a")),
                    Segment::Space {
                        run: Some(space),
                        width: natural + 6.0,
                    },
                    Segment::Run(run_for("b")),
                ],
            }],
        })];
        register_fonts(&items, &mut reg);
        reg.freeze();
        let bytes = render_page(&items, &reg).unwrap();
        let s = String::from_utf8_lossy(&bytes);
        // 6pt extra at 12pt size = 500 glyph units, negative offset.
        assert!(s.contains("-500"), "got: {s}");
    }

    fn run_for_space() -> ShapedRun {
        let (atoms, _) =
            shape_paragraph(&[("a b".to_string(), StyleResolved::default())], true);
        match atoms.into_iter().nth(1).unwrap() {
            Atom::Glue { run, .. } => run.unwrap(),
            _ => panic!("expected glue"),
        }
    }
}
