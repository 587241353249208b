//! The shaper: styled text runs in, glyph runs and a box/glue/penalty
//! stream out.
//!
//! Words become boxes (split into syllable boxes around hyphenation
//! penalties), spaces become elastic glue, and hard newlines become
//! forced breaks. Kerning is applied pairwise within a shaped
//! fragment; style boundaries never kern.

use crate::fonts::{Font, GLYPH_SPACE};
use crate::geom::Pt;
use crate::style::{Rgb, StyleResolved};
use crate::text::atoms::{push_terminator, Atom};
use crate::text::hyphenate::syllables;

/// Stretch per space, as a fraction of the space width (justified).
const STRETCH_RATIO: f64 = 0.5;
/// Shrink per space, as a fraction of the space width.
const SHRINK_RATIO: f64 = 1.0 / 3.0;
/// In ragged modes, every glue stretches by this many space widths.
const RAGGED_STRETCH_SPACES: f64 = 3.0;
/// Cost of breaking at a discretionary hyphen.
const HYPHEN_COST: f64 = 50.0;

/// One positioned glyph in a shaped run.
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    /// The codepoint this glyph renders (after substitution)
    pub codepoint: char,
    /// Glyph id in the font (the WinAnsi code for builtin fonts)
    pub glyph_id: u16,
    /// Advance width in glyph-space units
    pub advance: f64,
    /// Kerning against the previous glyph, in glyph-space units
    /// (negative pulls the pair together)
    pub kern: f64,
}

/// A maximal fragment of text sharing one resolved style.
#[derive(Debug, Clone)]
pub struct ShapedRun {
    /// The style the fragment renders with
    pub style: StyleResolved,
    /// Shaped glyphs in order
    pub glyphs: Vec<Glyph>,
    /// Total advance including kerning, in points
    pub width: Pt,
}

impl ShapedRun {
    /// The concrete font of this run.
    pub fn font(&self) -> &Font {
        self.style.font()
    }

    /// Font size in points.
    pub fn size(&self) -> Pt {
        self.style.size
    }

    /// Text color.
    pub fn color(&self) -> Rgb {
        self.style.color
    }

    /// Baseline-to-baseline lead of this run in points.
    pub fn lead(&self) -> Pt {
        self.style.lead()
    }

    /// Scaled ascent in points.
    pub fn ascent(&self) -> Pt {
        self.font().ascent() / GLYPH_SPACE * self.style.size
    }
}

/// Soft-error record produced while shaping and laying out text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeReport {
    /// Codepoints replaced because the font cannot map them
    pub substitutions: usize,
    /// Lines emitted at natural width because no feasible breaking
    /// existed
    pub overfull_lines: usize,
}

impl ShapeReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: ShapeReport) {
        self.substitutions += other.substitutions;
        self.overfull_lines += other.overfull_lines;
    }
}

/// Shape one paragraph of styled runs into an atom stream.
///
/// `justify` selects the elasticity model: justified glue stretches by
/// half and shrinks by a third of the space width; ragged glue gets a
/// large constant stretch and no shrink, so the breaker penalizes
/// leftover space uniformly.
pub fn shape_paragraph(
    runs: &[(String, StyleResolved)],
    justify: bool,
) -> (Vec<Atom>, ShapeReport) {
    let mut shaper = Shaper {
        atoms: Vec::new(),
        open_parts: Vec::new(),
        report: ShapeReport::default(),
        justify,
    };

    for (text, style) in runs {
        let mut last_char: Option<char> = None;
        let mut word = String::new();
        for c in text.chars() {
            match c {
                '\r' => {},
                '\n' => {
                    shaper.flush_word(&mut word, style);
                    shaper.close_box();
                    shaper.forced_break();
                    last_char = None;
                },
                ' ' | '\t' => {
                    shaper.flush_word(&mut word, style);
                    shaper.close_box();
                    shaper.glue(style, last_char);
                    last_char = Some(' ');
                },
                _ => {
                    word.push(c);
                    last_char = Some(c);
                },
            }
        }
        shaper.flush_word(&mut word, style);
        // The box stays open: a word may continue in the next run.
    }
    shaper.close_box();

    let Shaper {
        mut atoms, report, ..
    } = shaper;
    push_terminator(&mut atoms);
    (atoms, report)
}

struct Shaper {
    atoms: Vec<Atom>,
    /// Fragments of the word currently being assembled, one per style
    open_parts: Vec<(String, StyleResolved)>,
    report: ShapeReport,
    justify: bool,
}

impl Shaper {
    fn flush_word(&mut self, word: &mut String, style: &StyleResolved) {
        if !word.is_empty() {
            self.open_parts.push((std::mem::take(word), style.clone()));
        }
    }

    /// Finalize the open word into atoms.
    ///
    /// Single-style words hyphenate into syllable boxes separated by
    /// flagged penalties; words crossing a style boundary become one
    /// unbreakable box holding a run per style.
    fn close_box(&mut self) {
        match self.open_parts.len() {
            0 => {},
            1 => {
                let (word, style) = self.open_parts.pop().expect("len checked");
                let parts = syllables(&word, &style.hyphens);
                let last = parts.len() - 1;
                for (i, part) in parts.iter().enumerate() {
                    let run = self.shape_fragment(part, &style, None);
                    self.atoms.push(Atom::Box {
                        width: run.width,
                        runs: vec![run],
                    });
                    if i < last {
                        let prev = part.chars().last();
                        let hyphen = self.shape_fragment("-", &style, prev);
                        self.atoms.push(Atom::Penalty {
                            width: hyphen.width,
                            cost: HYPHEN_COST,
                            flagged: true,
                            run: Some(hyphen),
                        });
                    }
                }
            },
            _ => {
                let parts = std::mem::take(&mut self.open_parts);
                let mut runs = Vec::with_capacity(parts.len());
                let mut width = 0.0;
                for (text, style) in &parts {
                    let run = self.shape_fragment(text, style, None);
                    width += run.width;
                    runs.push(run);
                }
                self.atoms.push(Atom::Box { width, runs });
            },
        }
    }

    fn glue(&mut self, style: &StyleResolved, prev: Option<char>) {
        let run = self.shape_fragment(" ", style, prev);
        let space = style.font().space_advance() / GLYPH_SPACE * style.size;
        let (stretch, shrink) = if self.justify {
            (space * STRETCH_RATIO, space * SHRINK_RATIO)
        } else {
            (space * RAGGED_STRETCH_SPACES, 0.0)
        };
        self.atoms.push(Atom::Glue {
            width: run.width,
            stretch,
            shrink,
            run: Some(run),
        });
    }

    fn forced_break(&mut self) {
        self.atoms.push(Atom::Penalty {
            width: 0.0,
            cost: f64::NEG_INFINITY,
            flagged: false,
            run: None,
        });
        self.atoms.push(Atom::Glue {
            width: 0.0,
            stretch: 0.0,
            shrink: 0.0,
            run: None,
        });
    }

    /// Shape a fragment, optionally seeding kerning with the character
    /// that precedes it in the source text (used for hyphens and the
    /// word→space pair).
    fn shape_fragment(
        &mut self,
        text: &str,
        style: &StyleResolved,
        seed: Option<char>,
    ) -> ShapedRun {
        let font = style.font();
        let mut glyphs = Vec::with_capacity(text.chars().count());
        let mut prev = seed;
        let mut total_units = 0.0;
        for c in text.chars() {
            let (codepoint, glyph_id) = match font.glyph_id(c) {
                Some(gid) => (c, gid),
                None => {
                    self.report.substitutions += 1;
                    match font {
                        Font::Standard(_) => {
                            log::warn!("codepoint U+{:04X} not in WinAnsi, substituting '?'", c as u32);
                            ('?', font.glyph_id('?').unwrap_or(0x3F))
                        },
                        Font::Embedded(_) => {
                            log::warn!("codepoint U+{:04X} not in font, using .notdef", c as u32);
                            (c, 0)
                        },
                    }
                },
            };
            let advance = font.advance(codepoint);
            let kern = match prev {
                Some(p) => font.kern(p, codepoint),
                None => 0.0,
            };
            total_units += advance + kern;
            glyphs.push(Glyph {
                codepoint,
                glyph_id,
                advance,
                kern,
            });
            prev = Some(codepoint);
        }
        ShapedRun {
            style: style.clone(),
            glyphs,
            width: total_units / GLYPH_SPACE * style.size,
        }
    }
}
