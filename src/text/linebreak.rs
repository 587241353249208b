//! Line breaking: greedy first-fit and the Knuth–Plass optimum.
//!
//! Both breakers consume the shaper's atom stream and produce
//! [`Line`]s referencing atom ranges. The optimal breaker is a dynamic
//! program over feasible breakpoints; when no feasible breaking exists
//! the tolerance is expanded once, and failing that the greedy result
//! is returned with its overfull lines flagged.

use crate::geom::Pt;
use crate::text::atoms::Atom;

/// Badness is clamped here, per the classic algorithm.
const MAX_BADNESS: f64 = 10_000.0;

/// Parameters of the optimum-fit algorithm.
#[derive(Debug, Clone, Copy)]
pub struct BreakParams {
    /// Maximum allowed adjustment ratio (stretch tolerance)
    pub tolerance: f64,
    /// Tolerance used for the single retry when no feasible breaking
    /// exists at `tolerance`
    pub expanded_tolerance: f64,
    /// Extra demerits for two consecutive hyphenated lines
    pub flagged_demerit: f64,
    /// Extra demerits when adjacent lines differ by more than one
    /// fitness class
    pub fitness_demerit: f64,
}

impl Default for BreakParams {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            expanded_tolerance: 20.0,
            flagged_demerit: 100.0,
            fitness_demerit: 100.0,
        }
    }
}

/// One broken line: a range of atoms plus the numbers needed to
/// render and audit it.
#[derive(Debug, Clone)]
pub struct Line {
    /// Index of the first content atom
    pub start: usize,
    /// Index of the break atom (glue or penalty); content is
    /// `atoms[start..end]`, plus the hyphen when `hyphenated`
    pub end: usize,
    /// Natural width in points, including a taken hyphen
    pub width: Pt,
    /// Total glue stretch inside the line
    pub stretch: Pt,
    /// Total glue shrink inside the line
    pub shrink: Pt,
    /// Adjustment ratio applied when justifying (0 = natural)
    pub ratio: f64,
    /// Whether the line ends at a flagged penalty (visible hyphen)
    pub hyphenated: bool,
    /// Whether the line could not be made to fit
    pub overfull: bool,
}

impl Line {
    /// Width after applying the adjustment ratio to the glue.
    pub fn adjusted_width(&self) -> Pt {
        if self.ratio >= 0.0 {
            self.width + self.ratio * self.stretch
        } else {
            self.width + self.ratio * self.shrink
        }
    }

    /// Whether the line has no content atoms.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Break a paragraph of atoms into lines.
///
/// `width_of` maps a zero-based line number to the target width.
/// `optimal` selects Knuth–Plass; greedy otherwise. Knuth–Plass falls
/// back to greedy (flagging overfull lines) when even the expanded
/// tolerance admits no feasible breaking.
pub fn break_lines(
    atoms: &[Atom],
    width_of: &dyn Fn(usize) -> Pt,
    optimal: bool,
    params: &BreakParams,
) -> Vec<Line> {
    if optimal {
        if let Some(lines) = knuth_plass(atoms, width_of, params.tolerance, params) {
            return lines;
        }
        if let Some(lines) = knuth_plass(atoms, width_of, params.expanded_tolerance, params) {
            return lines;
        }
        log::warn!("no feasible breaking found, falling back to greedy");
    }
    break_greedy(atoms, width_of)
}

/// Skip glue and non-forced penalties: the discardable atoms at the
/// start of a line.
fn skip_discardable(atoms: &[Atom], mut i: usize) -> usize {
    while i < atoms.len() {
        match &atoms[i] {
            Atom::Glue { .. } => i += 1,
            Atom::Penalty { cost, .. } if *cost != f64::NEG_INFINITY => i += 1,
            _ => break,
        }
    }
    i
}

/// Whether a break is legal at atom `i`: glue directly after a box, or
/// a penalty with finite-or-forcing cost.
fn is_legal_break(atoms: &[Atom], i: usize) -> bool {
    match &atoms[i] {
        Atom::Glue { .. } => i > 0 && atoms[i - 1].is_box(),
        Atom::Penalty { cost, .. } => *cost != f64::INFINITY,
        Atom::Box { .. } => false,
    }
}

/// Extra width a taken break contributes (the hyphen).
fn break_width(atoms: &[Atom], i: usize) -> Pt {
    match &atoms[i] {
        Atom::Penalty { width, .. } => *width,
        _ => 0.0,
    }
}

fn break_cost(atoms: &[Atom], i: usize) -> f64 {
    match &atoms[i] {
        Atom::Penalty { cost, .. } => *cost,
        _ => 0.0,
    }
}

fn is_flagged(atoms: &[Atom], i: usize) -> bool {
    matches!(&atoms[i], Atom::Penalty { flagged: true, .. })
}

/// The adjustment ratio needed to set a line of `natural` width into
/// `target`. Zero available stretch/shrink yields ±∞.
fn adjustment_ratio(natural: Pt, stretch: Pt, shrink: Pt, target: Pt) -> f64 {
    if natural < target {
        let r = (target - natural) / stretch;
        if r.is_nan() {
            f64::INFINITY
        } else {
            r
        }
    } else if natural > target {
        if shrink > 0.0 {
            (target - natural) / shrink
        } else {
            f64::NEG_INFINITY
        }
    } else {
        0.0
    }
}

/// Badness: how stretched or shrunken the spaces are.
fn badness(ratio: f64) -> f64 {
    (100.0 * ratio.abs().powi(3)).min(MAX_BADNESS)
}

/// Demerits of one line, before adjacency terms.
///
/// Negative penalties reduce demerits (their square is subtracted) and
/// a forced break contributes no penalty term at all.
fn line_demerits(bad: f64, cost: f64) -> f64 {
    if cost == f64::NEG_INFINITY {
        (1.0 + bad).powi(2)
    } else if cost < 0.0 {
        (1.0 + bad).powi(2) - cost * cost
    } else {
        (1.0 + bad + cost).powi(2)
    }
}

/// Fitness classes: tight, decent, loose, very loose.
fn fitness_class(ratio: f64) -> u8 {
    if ratio < -0.5 {
        0
    } else if ratio <= 0.5 {
        1
    } else if ratio <= 1.0 {
        2
    } else {
        3
    }
}

/// Cumulative width/stretch/shrink sums over the atom stream.
struct Sums {
    width: Vec<Pt>,
    stretch: Vec<Pt>,
    shrink: Vec<Pt>,
}

impl Sums {
    fn new(atoms: &[Atom]) -> Self {
        let mut width = Vec::with_capacity(atoms.len() + 1);
        let mut stretch = Vec::with_capacity(atoms.len() + 1);
        let mut shrink = Vec::with_capacity(atoms.len() + 1);
        let (mut w, mut st, mut sh) = (0.0, 0.0, 0.0);
        width.push(w);
        stretch.push(st);
        shrink.push(sh);
        for atom in atoms {
            w += atom.width_in_line();
            if let Atom::Glue {
                stretch: gst,
                shrink: gsh,
                ..
            } = atom
            {
                st += gst;
                sh += gsh;
            }
            width.push(w);
            stretch.push(st);
            shrink.push(sh);
        }
        Self {
            width,
            stretch,
            shrink,
        }
    }

    fn natural(&self, start: usize, brk: usize) -> Pt {
        self.width[brk] - self.width[start]
    }

    fn stretch_between(&self, start: usize, brk: usize) -> Pt {
        self.stretch[brk] - self.stretch[start]
    }

    fn shrink_between(&self, start: usize, brk: usize) -> Pt {
        self.shrink[brk] - self.shrink[start]
    }
}

/// A node in the Knuth–Plass breakpoint graph.
#[derive(Debug, Clone)]
struct Node {
    /// Break atom index (`usize::MAX` for the paragraph start)
    at: usize,
    /// First content atom of the following line
    start: usize,
    /// Zero-based number of the following line
    line: usize,
    fitness: u8,
    flagged: bool,
    total_demerits: f64,
    /// Ratio of the line ending at this node (meaningless for root)
    ratio: f64,
    /// Raw badness of that line, kept for deterministic tie-breaks
    badness: f64,
    /// Arena index of the predecessor
    prev: usize,
}

/// Optimum-fit breaking. Returns `None` when no feasible breaking
/// exists at the given tolerance.
fn knuth_plass(
    atoms: &[Atom],
    width_of: &dyn Fn(usize) -> Pt,
    tolerance: f64,
    params: &BreakParams,
) -> Option<Vec<Line>> {
    let sums = Sums::new(atoms);
    let mut arena: Vec<Node> = vec![Node {
        at: usize::MAX,
        start: skip_discardable(atoms, 0),
        line: 0,
        fitness: 1,
        flagged: false,
        total_demerits: 0.0,
        ratio: 0.0,
        badness: 0.0,
        prev: usize::MAX,
    }];
    let mut active: Vec<usize> = vec![0];

    for b in 0..atoms.len() {
        if !is_legal_break(atoms, b) {
            continue;
        }
        let forced = atoms[b].forces_break();
        let cost = break_cost(atoms, b);
        let flagged = is_flagged(atoms, b);
        let extra = break_width(atoms, b);

        // (line, fitness) → best candidate, for the dominance rule.
        let mut candidates: Vec<Node> = Vec::new();
        let mut survivors: Vec<usize> = Vec::new();

        for &ai in &active {
            let node = &arena[ai];
            let natural = sums.natural(node.start, b) + extra;
            let target = width_of(node.line);
            let r = adjustment_ratio(
                natural,
                sums.stretch_between(node.start, b),
                sums.shrink_between(node.start, b),
                target,
            );

            let feasible = if forced {
                r >= -1.0 || node.start >= b
            } else {
                (-1.0..=tolerance).contains(&r)
            };
            if feasible {
                // A forced break never stretches: the line is set at
                // its natural width.
                let render_ratio = if forced { r.min(0.0) } else { r };
                let bad = badness(render_ratio);
                let fit = fitness_class(render_ratio);
                let mut demerits = line_demerits(bad, cost) + node.total_demerits;
                if flagged && node.flagged {
                    demerits += params.flagged_demerit;
                }
                let fitness_distance = fit.abs_diff(node.fitness);
                if fitness_distance > 1 {
                    demerits += params.fitness_demerit;
                }
                let candidate = Node {
                    at: b,
                    start: skip_discardable(atoms, b + 1),
                    line: node.line + 1,
                    fitness: fit,
                    flagged,
                    total_demerits: demerits,
                    ratio: render_ratio,
                    badness: bad,
                    prev: ai,
                };
                merge_candidate(&mut candidates, candidate, fitness_distance, &arena);
            }

            // Deactivate nodes whose line can no longer shrink enough,
            // and everything at a forced break.
            if !forced && r >= -1.0 {
                survivors.push(ai);
            }
        }

        if forced {
            active.clear();
        } else {
            active = survivors;
        }
        for candidate in candidates {
            arena.push(candidate);
            active.push(arena.len() - 1);
        }
        if active.is_empty() {
            return None;
        }
    }

    // The terminator's forced break put the paragraph-end nodes in
    // `active`; pick the cheapest.
    let end = atoms.len().checked_sub(1)?;
    let best = active
        .iter()
        .copied()
        .filter(|&ai| arena[ai].at == end)
        .min_by(|&a, &b| {
            arena[a]
                .total_demerits
                .partial_cmp(&arena[b].total_demerits)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| arena[a].badness.partial_cmp(&arena[b].badness).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| arena[a].prev.cmp(&arena[b].prev))
        })?;

    // Trace back to recover the break sequence.
    let mut chain = Vec::new();
    let mut i = best;
    while arena[i].at != usize::MAX {
        chain.push(i);
        i = arena[i].prev;
    }
    chain.reverse();

    let mut lines = Vec::with_capacity(chain.len());
    for &ni in &chain {
        let node = &arena[ni];
        let start = arena[node.prev].start;
        let natural = sums.natural(start, node.at) + break_width(atoms, node.at);
        lines.push(Line {
            start,
            end: node.at,
            width: natural,
            stretch: sums.stretch_between(start, node.at),
            shrink: sums.shrink_between(start, node.at),
            ratio: node.ratio,
            hyphenated: is_flagged(atoms, node.at),
            overfull: false,
        });
    }
    Some(lines)
}

/// Keep at most one candidate per (line, fitness) pair; ties resolve
/// by fitness distance, then raw badness, then smaller predecessor.
fn merge_candidate(
    candidates: &mut Vec<Node>,
    candidate: Node,
    fitness_distance: u8,
    arena: &[Node],
) {
    for existing in candidates.iter_mut() {
        if existing.line == candidate.line && existing.fitness == candidate.fitness {
            let existing_distance = existing.fitness.abs_diff(arena[existing.prev].fitness);
            let replace = match candidate
                .total_demerits
                .partial_cmp(&existing.total_demerits)
            {
                Some(std::cmp::Ordering::Less) => true,
                Some(std::cmp::Ordering::Equal) => (
                    fitness_distance,
                    candidate.badness,
                    candidate.prev,
                ) < (existing_distance, existing.badness, existing.prev),
                _ => false,
            };
            if replace {
                *existing = candidate;
            }
            return;
        }
    }
    candidates.push(candidate);
}

/// First-fit breaking: take atoms until the next box would overflow,
/// then break at the last legal breakpoint seen.
fn break_greedy(atoms: &[Atom], width_of: &dyn Fn(usize) -> Pt) -> Vec<Line> {
    let sums = Sums::new(atoms);
    let mut lines = Vec::new();
    let mut start = skip_discardable(atoms, 0);
    let mut line_no = 0;
    let mut last_break: Option<usize> = None;

    let mut i = start;
    while i < atoms.len() {
        let target = width_of(line_no);
        match &atoms[i] {
            Atom::Box { width, .. } => {
                let would_be = sums.natural(start, i) + width;
                if would_be > target {
                    let brk = last_break.unwrap_or(i);
                    let overfull = last_break.is_none();
                    // Breaking right before a box is not a legal break
                    // point; doing it anyway is what "overfull" means.
                    if brk > start {
                        lines.push(make_line(atoms, &sums, start, brk, target, false, overfull));
                        line_no += 1;
                        start = skip_discardable(atoms, if atoms_is_break(atoms, brk) { brk + 1 } else { brk });
                        last_break = None;
                        i = start;
                        continue;
                    }
                }
                i += 1;
            },
            Atom::Glue { .. } => {
                if is_legal_break(atoms, i) {
                    last_break = Some(i);
                }
                i += 1;
            },
            Atom::Penalty { cost, .. } => {
                if *cost == f64::NEG_INFINITY {
                    lines.push(make_line(atoms, &sums, start, i, target, true, false));
                    line_no += 1;
                    start = skip_discardable(atoms, i + 1);
                    last_break = None;
                    i = start;
                    continue;
                }
                if *cost != f64::INFINITY {
                    // Taking a discretionary break must also fit the
                    // hyphen; only remember it if it does.
                    let with_hyphen = sums.natural(start, i) + break_width(atoms, i);
                    if with_hyphen <= target {
                        last_break = Some(i);
                    }
                }
                i += 1;
            },
        }
    }
    lines
}

fn atoms_is_break(atoms: &[Atom], i: usize) -> bool {
    i < atoms.len() && is_legal_break(atoms, i)
}

fn make_line(
    atoms: &[Atom],
    sums: &Sums,
    start: usize,
    end: usize,
    target: Pt,
    forced: bool,
    overfull: bool,
) -> Line {
    let natural = sums.natural(start, end) + break_width(atoms, end.min(atoms.len() - 1));
    let stretch = sums.stretch_between(start, end);
    let shrink = sums.shrink_between(start, end);
    let mut ratio = adjustment_ratio(natural, stretch, shrink, target);
    if forced {
        ratio = ratio.min(0.0);
    }
    let mut overfull = overfull;
    if ratio < -1.0 {
        overfull = true;
    }
    if !ratio.is_finite() {
        ratio = 0.0;
    }
    if overfull {
        // Overfull lines render at their natural widths.
        ratio = 0.0;
    }
    Line {
        start,
        end,
        width: natural,
        stretch,
        shrink,
        ratio,
        hyphenated: is_flagged(atoms, end.min(atoms.len() - 1)),
        overfull,
    }
}

/// Cumulative demerits of a break sequence, for comparing breakers.
pub fn sequence_demerits(atoms: &[Atom], lines: &[Line], params: &BreakParams) -> f64 {
    let mut total = 0.0;
    let mut prev_flagged = false;
    let mut prev_fitness: u8 = 1;
    for line in lines {
        let bad = badness(line.ratio);
        let cost = if line.end < atoms.len() {
            break_cost(atoms, line.end)
        } else {
            0.0
        };
        total += line_demerits(bad, cost);
        let fit = fitness_class(line.ratio);
        if line.hyphenated && prev_flagged {
            total += params.flagged_demerit;
        }
        if fit.abs_diff(prev_fitness) > 1 {
            total += params.fitness_demerit;
        }
        prev_flagged = line.hyphenated;
        prev_fitness = fit;
    }
    total
}
