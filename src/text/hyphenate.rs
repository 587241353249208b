//! Hyphenation as an injectable capability.
//!
//! A hyphenator is anything that can propose split positions inside a
//! word. Styles carry either a provider or an explicit "off" switch;
//! a Liang-pattern dictionary can be injected by implementing
//! [`Hyphenate`] for it.

use std::sync::Arc;

/// The hyphenation capability: propose break positions for one word.
pub trait Hyphenate {
    /// Sorted character indices at which `word` may be split.
    ///
    /// An index `i` means the word may break between `word[..i]` and
    /// `word[i..]` (character counts, not bytes).
    fn positions(&self, word: &str) -> Vec<usize>;
}

/// Hyphenation setting carried by a style.
#[derive(Clone)]
pub enum Hyphens {
    /// Never hyphenate.
    Off,
    /// Hyphenate with the given provider.
    Provider(Arc<dyn Hyphenate + Send + Sync>),
}

impl Hyphens {
    /// The built-in English fallback provider.
    pub fn fallback() -> Self {
        Hyphens::Provider(Arc::new(EnglishFallback))
    }

    /// Split positions for a word, empty when hyphenation is off.
    pub fn positions(&self, word: &str) -> Vec<usize> {
        match self {
            Hyphens::Off => Vec::new(),
            Hyphens::Provider(p) => p.positions(word),
        }
    }
}

impl PartialEq for Hyphens {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Hyphens::Off, Hyphens::Off) => true,
            (Hyphens::Provider(a), Hyphens::Provider(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Hyphens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hyphens::Off => write!(f, "Hyphens::Off"),
            Hyphens::Provider(_) => write!(f, "Hyphens::Provider(..)"),
        }
    }
}

/// English-only heuristic hyphenator.
///
/// Splits at explicit hyphens and before the common suffixes `-ing`,
/// `-ed`, `-tion` and `-ly`, keeping at least two characters before
/// and three after every break.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishFallback;

/// Minimum characters left of a break.
const MIN_LEADING: usize = 2;
/// Minimum characters right of a break.
const MIN_TRAILING: usize = 3;

const SUFFIXES: [&str; 4] = ["tion", "ing", "ed", "ly"];

impl Hyphenate for EnglishFallback {
    fn positions(&self, word: &str) -> Vec<usize> {
        let chars: Vec<char> = word.chars().collect();
        let n = chars.len();
        if n < MIN_LEADING + MIN_TRAILING {
            return Vec::new();
        }

        let mut positions = Vec::new();

        // Explicit hyphens break after the hyphen itself.
        for (i, &c) in chars.iter().enumerate() {
            let after = i + 1;
            if c == '-' && after >= MIN_LEADING && n - after >= MIN_TRAILING {
                positions.push(after);
            }
        }

        // Common suffixes break just before the suffix. The trailing
        // minimum is implied by the suffix itself.
        let lower: String = word.to_lowercase();
        for suffix in SUFFIXES {
            if let Some(stripped) = lower.strip_suffix(suffix) {
                let at = stripped.chars().count();
                if at >= MIN_LEADING {
                    positions.push(at);
                }
                break;
            }
        }

        positions.sort_unstable();
        positions.dedup();
        positions
    }
}

/// Split a word into fragments at the provider's positions.
pub fn syllables<'a>(word: &'a str, hyphens: &Hyphens) -> Vec<&'a str> {
    let positions = hyphens.positions(word);
    if positions.is_empty() {
        return vec![word];
    }
    let mut out = Vec::with_capacity(positions.len() + 1);
    let mut byte_start = 0;
    let mut chars_seen = 0;
    let mut iter = word.char_indices();
    let mut positions = positions.into_iter().peekable();
    while let Some((byte, _)) = iter.next() {
        if positions.peek() == Some(&chars_seen) {
            positions.next();
            if byte > byte_start {
                out.push(&word[byte_start..byte]);
                byte_start = byte;
            }
        }
        chars_seen += 1;
    }
    out.push(&word[byte_start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_splits() {
        let h = EnglishFallback;
        assert_eq!(h.positions("walking"), vec![4]);
        assert_eq!(h.positions("wanted"), vec![4]);
        assert_eq!(h.positions("station"), vec![3]);
        assert_eq!(h.positions("quickly"), vec![5]);
    }

    #[test]
    fn test_explicit_hyphen_splits() {
        let h = EnglishFallback;
        assert_eq!(h.positions("well-known"), vec![5]);
    }

    #[test]
    fn test_minimum_edges_respected() {
        let h = EnglishFallback;
        // "ed" suffix would leave < 2 leading chars.
        assert_eq!(h.positions("red"), Vec::<usize>::new());
        // "ing" suffix would leave only 1 leading char.
        assert_eq!(h.positions("king"), Vec::<usize>::new());
        assert_eq!(h.positions("go"), Vec::<usize>::new());
    }

    #[test]
    fn test_off_yields_nothing() {
        assert!(Hyphens::Off.positions("hyphenation").is_empty());
    }

    #[test]
    fn test_syllables_split() {
        let parts = syllables("walking", &Hyphens::fallback());
        assert_eq!(parts, vec!["walk", "ing"]);
    }

    #[test]
    fn test_syllables_whole_word_when_off() {
        let parts = syllables("walking", &Hyphens::Off);
        assert_eq!(parts, vec!["walking"]);
    }

    #[test]
    fn test_syllables_multibyte() {
        // No break positions, but must not split inside a multibyte char.
        let parts = syllables("café", &Hyphens::fallback());
        assert_eq!(parts, vec!["café"]);
    }
}
