//! Name similarity scoring.
//!
//! Inputs must already be normalized (see [`crate::normalize`]). Scores
//! are in `0.0..=1.0`; callers compare against the configured fuzzy
//! threshold.

use std::collections::BTreeSet;

/// Filler tokens ignored when comparing team names, so that
/// "Team TotalEnergies" and "TotalEnergies Pro Cycling" still overlap.
const TEAM_FILLER: &[&str] = &["team", "pro", "cycling"];

/// Surnames within this edit distance still count as the same family
/// name ("Smyth" / "Smith"). Short surnames get a tighter bound.
fn surname_edit_limit(a: &str, b: &str) -> usize {
    if a.len().min(b.len()) <= 5 {
        1
    } else {
        2
    }
}

/// Score two normalized team names: exact 1.0, containment 0.9, otherwise
/// token overlap over the larger token set with filler words removed.
pub fn team_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(b) || b.contains(a) {
        return 0.9;
    }

    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    fn clean<'a>(s: &BTreeSet<&'a str>) -> BTreeSet<&'a str> {
        let filtered: BTreeSet<&str> = s
            .iter()
            .copied()
            .filter(|t| !TEAM_FILLER.contains(t))
            .collect();
        if filtered.is_empty() {
            s.clone()
        } else {
            filtered
        }
    }
    let clean_a = clean(&set_a);
    let clean_b = clean(&set_b);
    let overlap = clean_a.intersection(&clean_b).count();
    overlap as f64 / clean_a.len().max(clean_b.len()) as f64
}

/// Score a scraped (given name, surname) pair against a catalog rider's
/// normalized given name and surname.
///
/// The surname gates the match: equal, contained (double-barrelled names),
/// or within a bounded edit distance; anything else scores zero. The given
/// name then refines the score, with credit for initials ("J." vs "John").
pub fn rider_similarity(
    scraped_first: &str,
    scraped_last: &str,
    cat_first: &str,
    cat_last: &str,
) -> f64 {
    if scraped_last.is_empty() || cat_last.is_empty() {
        return 0.0;
    }

    let last_score = if scraped_last == cat_last {
        1.0
    } else if scraped_last.contains(cat_last) || cat_last.contains(scraped_last) {
        0.8
    } else if strsim::levenshtein(scraped_last, cat_last)
        <= surname_edit_limit(scraped_last, cat_last)
    {
        0.7
    } else {
        return 0.0;
    };

    let first_score = if scraped_first.is_empty() || cat_first.is_empty() {
        0.0
    } else if scraped_first == cat_first {
        1.0
    } else if is_initial_of(scraped_first, cat_first) || is_initial_of(cat_first, scraped_first) {
        0.7
    } else if scraped_first.contains(cat_first) || cat_first.contains(scraped_first) {
        0.6
    } else {
        0.0
    };

    0.6 * last_score + 0.4 * first_score
}

fn is_initial_of(short: &str, full: &str) -> bool {
    short.len() == 1 && full.starts_with(short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_exact_and_containment() {
        assert_eq!(team_similarity("totalenergies", "totalenergies"), 1.0);
        assert_eq!(team_similarity("team totalenergies", "totalenergies"), 0.9);
    }

    #[test]
    fn team_filler_tokens_ignored() {
        let score = team_similarity("alpha pro cycling", "team alpha");
        assert!(score >= 0.9, "filler words should not dilute overlap: {score}");
    }

    #[test]
    fn team_disjoint_names_score_zero() {
        assert_eq!(team_similarity("alpha racing", "bravo squad"), 0.0);
    }

    #[test]
    fn rider_exact_name() {
        assert_eq!(rider_similarity("john", "smith", "john", "smith"), 1.0);
    }

    #[test]
    fn rider_surname_typo_with_initial() {
        // "J. Smyth" against catalog "J. Smith"
        let score = rider_similarity("j", "smyth", "j", "smith");
        assert!(score >= 0.5, "one-letter surname drift should match: {score}");
    }

    #[test]
    fn rider_initial_credit() {
        let score = rider_similarity("j", "smith", "john", "smith");
        assert!(score > 0.8);
    }

    #[test]
    fn rider_different_surname_is_zero() {
        assert_eq!(rider_similarity("j", "xanthopoulos", "j", "smith"), 0.0);
        // same given name alone never matches
        assert_eq!(rider_similarity("j", "jones", "j", "smith"), 0.0);
    }

    #[test]
    fn rider_double_barrelled_surname() {
        let score = rider_similarity("anna", "martin guyonnet", "anna", "martin");
        assert!(score >= 0.5);
    }

    #[test]
    fn short_surnames_get_tight_edit_bound() {
        assert_eq!(rider_similarity("b", "lee", "b", "law"), 0.0);
    }
}
