//! Unit conversion helpers and standard page sizes.
//!
//! All lengths in the library are expressed in PDF points (1 in = 72 pt).

use crate::geom::Pt;

/// Convert inches to points.
pub fn inch(n: f64) -> Pt {
    n * 72.0
}

/// Convert picas to points.
pub fn pc(n: f64) -> Pt {
    n * 12.0
}

/// Convert centimeters to points.
pub fn cm(n: f64) -> Pt {
    n * (72.0 / 2.54)
}

/// Convert millimeters to points.
pub fn mm(n: f64) -> Pt {
    n * (7.2 / 2.54)
}

/// No-op conversion. Can be used to make units explicit.
pub fn pt(n: f64) -> Pt {
    n
}

/// A0 paper size (width, height) in points.
pub const A0: (Pt, Pt) = (2380.0, 3368.0);
/// A1 paper size in points.
pub const A1: (Pt, Pt) = (1684.0, 2380.0);
/// A2 paper size in points.
pub const A2: (Pt, Pt) = (1190.0, 1684.0);
/// A3 paper size in points.
pub const A3: (Pt, Pt) = (842.0, 1190.0);
/// A4 paper size in points.
pub const A4: (Pt, Pt) = (595.0, 842.0);
/// A5 paper size in points.
pub const A5: (Pt, Pt) = (420.0, 595.0);
/// A6 paper size in points.
pub const A6: (Pt, Pt) = (297.0, 420.0);
/// US Letter paper size in points.
pub const LETTER: (Pt, Pt) = (612.0, 792.0);
/// US Legal paper size in points.
pub const LEGAL: (Pt, Pt) = (612.0, 1008.0);
/// Tabloid paper size in points.
pub const TABLOID: (Pt, Pt) = (792.0, 1224.0);
/// Ledger paper size (tabloid landscape) in points.
pub const LEDGER: (Pt, Pt) = (1224.0, 792.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inch() {
        assert_eq!(inch(1.0), 72.0);
        assert_eq!(inch(0.5), 36.0);
    }

    #[test]
    fn test_pica() {
        assert_eq!(pc(1.0), 12.0);
    }

    #[test]
    fn test_metric() {
        assert!((cm(1.0) - 28.3465).abs() < 1e-3);
        assert!((mm(10.0) - cm(1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_page_sizes() {
        assert_eq!(A4, (595.0, 842.0));
        assert_eq!(LEDGER.0, TABLOID.1);
        assert_eq!(LEDGER.1, TABLOID.0);
    }
}
