//! The line breaker's input alphabet: boxes, glue and penalties.
//!
//! Boxes are unbreakable shaped fragments, glue is elastic space, and
//! penalties are discretionary break opportunities. A cost of negative
//! infinity forces a break; positive infinity forbids one.

use crate::geom::Pt;
use crate::text::shape::ShapedRun;

/// One element of the breaker's input stream.
#[derive(Debug, Clone)]
pub enum Atom {
    /// Non-breakable shaped content. A box usually holds one run;
    /// words crossing a style boundary hold one run per style.
    Box {
        /// Natural width in points
        width: Pt,
        /// The shaped fragments rendered for this box
        runs: Vec<ShapedRun>,
    },
    /// Elastic space.
    Glue {
        /// Natural width in points
        width: Pt,
        /// How far the space may stretch
        stretch: Pt,
        /// How far the space may shrink
        shrink: Pt,
        /// The space glyph rendered when the glue is not at a line
        /// edge; `None` for synthetic glue like the terminator
        run: Option<ShapedRun>,
    },
    /// A discretionary break.
    Penalty {
        /// Width added to the line if the break is taken (the hyphen)
        width: Pt,
        /// Break cost: `NEG_INFINITY` forces, `INFINITY` forbids
        cost: f64,
        /// Whether taking this break leaves a visible hyphen
        flagged: bool,
        /// The hyphen glyph rendered when the break is taken
        run: Option<ShapedRun>,
    },
}

impl Atom {
    /// Natural width contribution when the atom sits inside a line.
    /// Penalties are zero-width unless their break is taken.
    pub fn width_in_line(&self) -> Pt {
        match self {
            Atom::Box { width, .. } | Atom::Glue { width, .. } => *width,
            Atom::Penalty { .. } => 0.0,
        }
    }

    /// Whether this is a box.
    pub fn is_box(&self) -> bool {
        matches!(self, Atom::Box { .. })
    }

    /// Whether this is glue.
    pub fn is_glue(&self) -> bool {
        matches!(self, Atom::Glue { .. })
    }

    /// Whether this penalty forces a break.
    pub fn forces_break(&self) -> bool {
        matches!(self, Atom::Penalty { cost, .. } if *cost == f64::NEG_INFINITY)
    }
}

/// Append the canonical paragraph terminator: infinitely stretchable
/// glue followed by a forced break.
pub fn push_terminator(atoms: &mut Vec<Atom>) {
    atoms.push(Atom::Glue {
        width: 0.0,
        stretch: f64::INFINITY,
        shrink: 0.0,
        run: None,
    });
    atoms.push(Atom::Penalty {
        width: 0.0,
        cost: f64::NEG_INFINITY,
        flagged: false,
        run: None,
    });
}
