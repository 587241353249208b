//! Properties of the line breakers: justification round-trip,
//! optimality against greedy, and the hyphenation toggle.

use folio::layout::frame::line_segments;
use folio::layout::Align;
use folio::style::{Style, StyleResolved};
use folio::text::hyphenate::Hyphens;
use folio::text::linebreak::{break_lines, sequence_demerits, BreakParams};
use folio::text::shape::shape_paragraph;
use folio::writer::Segment;

/// Deterministic pseudo-random word list (no RNG dependency).
fn pseudo_random_words(count: usize) -> String {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut words = Vec::with_capacity(count);
    for _ in 0..count {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let len = 2 + (state >> 33) % 9;
        let mut word = String::new();
        for k in 0..len {
            let c = b'a' + ((state >> (k * 5)) % 26) as u8;
            word.push(c as char);
        }
        words.push(word);
    }
    words.join(" ")
}

fn resolved(style: Style) -> StyleResolved {
    style.resolve(&StyleResolved::default()).unwrap()
}

#[test]
fn test_justified_lines_meet_column_edge() {
    // 200 pseudo-random words at 10pt in a 400pt column: every line
    // except the last reaches the right edge to within 0.01pt.
    let text = pseudo_random_words(200);
    let style = resolved(Style::new().with_size(10.0));
    let (atoms, _) = shape_paragraph(&[(text, style)], true);
    let lines = break_lines(&atoms, &|_| 400.0, true, &BreakParams::default());
    assert!(lines.len() > 5);

    for line in &lines[..lines.len() - 1] {
        assert!(
            (line.adjusted_width() - 400.0).abs() < 0.01,
            "line edge at {} instead of 400",
            line.adjusted_width()
        );
        // The rendered segments agree with the accounting.
        let (segments, width) = line_segments(&atoms, line, Align::Justify);
        assert!(!segments.is_empty());
        let rebuilt: f64 = segments
            .iter()
            .map(|s| match s {
                Segment::Run(run) => run.width,
                Segment::Space { width, .. } => *width,
            })
            .sum();
        assert!((rebuilt - width).abs() < 1e-9);
        assert!((width - 400.0).abs() < 0.01, "rendered width {width}");
    }

    // The last line is left at its natural width.
    assert_eq!(lines.last().unwrap().ratio, 0.0);
}

#[test]
fn test_optimal_demerits_not_worse_than_greedy() {
    let params = BreakParams::default();
    let text = pseudo_random_words(120);
    let style = resolved(Style::new().with_size(10.0));
    let (atoms, _) = shape_paragraph(&[(text, style)], true);

    for width in [180.0, 260.0, 340.0] {
        let greedy = break_lines(&atoms, &|_| width, false, &params);
        let optimal = break_lines(&atoms, &|_| width, true, &params);
        let gd = sequence_demerits(&atoms, &greedy, &params);
        let od = sequence_demerits(&atoms, &optimal, &params);
        assert!(
            od <= gd + 1e-6,
            "optimal {od} worse than greedy {gd} at width {width}"
        );
    }
}

#[test]
fn test_hyphenation_toggle() {
    let text = "hyphenation toggling considering wanting testing quickly \
                wanted station walking reading printing nothing standing \
                mentioning repeating collecting"
        .to_string();

    let with_hyphens = resolved(Style::new().with_size(10.0));
    let without = resolved(Style::new().with_size(10.0).with_hyphens(Hyphens::Off));
    let width = 90.0;
    let params = BreakParams::default();

    let (atoms_on, _) = shape_paragraph(&[(text.clone(), with_hyphens)], true);
    let lines_on = break_lines(&atoms_on, &|_| width, true, &params);

    let (atoms_off, _) = shape_paragraph(&[(text, without)], true);
    let lines_off = break_lines(&atoms_off, &|_| width, true, &params);

    // Disabling hyphenation can only keep or increase the line count,
    // and consumes no flagged penalties.
    assert!(lines_off.len() >= lines_on.len());
    assert!(lines_off.iter().all(|l| !l.hyphenated));
}

#[test]
fn test_ragged_lines_keep_natural_width() {
    let text = pseudo_random_words(60);
    let style = resolved(Style::new());
    let (atoms, _) = shape_paragraph(&[(text, style)], false);
    let lines = break_lines(&atoms, &|_| 220.0, true, &BreakParams::default());

    for line in &lines {
        let (_, width) = line_segments(&atoms, line, Align::Left);
        // Rendered at natural width: never beyond the column.
        assert!(width <= 220.0 + 1e-6);
    }
}

#[test]
fn test_flagged_breaks_render_the_hyphen() {
    let style = resolved(Style::new());
    let (atoms, _) = shape_paragraph(
        &[("extraordinary walking considerations".to_string(), style)],
        true,
    );
    // Narrow enough to force a hyphenation somewhere.
    let lines = break_lines(&atoms, &|_| 70.0, true, &BreakParams::default());
    if let Some(line) = lines.iter().find(|l| l.hyphenated) {
        let (segments, _) = line_segments(&atoms, line, Align::Left);
        let last_run = segments
            .iter()
            .rev()
            .find_map(|s| match s {
                Segment::Run(r) => Some(r),
                _ => None,
            })
            .expect("hyphenated line has runs");
        assert_eq!(
            last_run.glyphs.last().unwrap().codepoint,
            '-',
            "flagged break must end with a hyphen glyph"
        );
    }
}
