//! Coordinate scrubbing for narrative output.
//!
//! The planner instructions forbid coordinates in the final itinerary, but
//! models leak them anyway. This is best-effort textual cleanup: it does not
//! understand sentence structure and will remove unrelated parenthesized
//! numeric pairs.

use regex::Regex;
use std::sync::LazyLock;

// A labeled pair, with its enclosing parentheses when it has them, so the
// whole clause disappears in one pass.
static LABELED_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?Lat:\s*[\d.\-]+,\s*Lng:\s*[\d.\-]+\)?").unwrap());
static LAT_PAREN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(Lat:[^)]+\)").unwrap());
static BARE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([\d.\-]+\s*,\s*[\d.\-]+\)").unwrap());

/// Strip latitude/longitude leakage from narrative text.
///
/// Removes, in order: labeled `Lat: <n>, Lng: <n>` pairs (signed/decimal
/// numbers), any parenthesized run beginning with `Lat:`, and any
/// parenthesized pair of bare numbers. Trims surrounding whitespace from
/// the result.
pub fn scrub_coordinates(text: &str) -> String {
    let text = LABELED_PAIR.replace_all(text, "");
    let text = LAT_PAREN.replace_all(&text, "");
    let text = BARE_PAIR.replace_all(&text, "");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_parenthesized_labeled_pair() {
        assert_eq!(
            scrub_coordinates("Visit the Forum (Lat: 41.89, Lng: 12.48) at dawn."),
            "Visit the Forum  at dawn."
        );
    }

    #[test]
    fn removes_bare_labeled_pair() {
        assert_eq!(
            scrub_coordinates("The hotel sits at Lat: -33.87, Lng: 151.21 near the quay."),
            "The hotel sits at  near the quay."
        );
    }

    #[test]
    fn removes_partial_lat_parenthetical() {
        assert_eq!(
            scrub_coordinates("Start here (Lat: 41.89 approx) then walk east."),
            "Start here  then walk east."
        );
    }

    #[test]
    fn removes_bare_numeric_pair() {
        assert_eq!(
            scrub_coordinates("Meet at the gate (41.89, 12.48) before noon."),
            "Meet at the gate  before noon."
        );
    }

    #[test]
    fn trims_result() {
        assert_eq!(scrub_coordinates("  (Lat: 1.0, Lng: 2.0) Rome  "), "Rome");
    }

    #[test]
    fn leaves_clean_text_alone() {
        let text = "Day 1: espresso at sunrise, ruins until dusk.";
        assert_eq!(scrub_coordinates(text), text);
    }

    #[test]
    fn over_removes_unrelated_numeric_parentheticals() {
        // Documented limitation: any parenthesized number pair goes.
        assert_eq!(
            scrub_coordinates("Bring two maps (1, 2) just in case."),
            "Bring two maps  just in case."
        );
    }
}
