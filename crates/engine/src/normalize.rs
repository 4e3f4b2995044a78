//! Text normalization for name lookup.
//!
//! All matching goes through one normal form: lowercased, diacritics
//! stripped, punctuation replaced by spaces, whitespace collapsed.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a display name to its index key.
///
/// "Søren O'BRIEN-Smith " and "soren o brien smith" map to the same key;
/// accented letters fold to their base character via NFD decomposition.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let stripped: String = folded
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized tokens of a name, for overlap scoring.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Both readings of a normalized full name as (given name, surname):
/// "first rest..." and the reversed "rest... last" convention some sites
/// use. Returns `None` for single-token names.
pub fn name_splits(normalized: &str) -> Option<[(String, String); 2]> {
    let parts: Vec<&str> = normalized.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }
    let forward = (parts[0].to_string(), parts[1..].join(" "));
    let alternate = (
        parts[..parts.len() - 1].join(" "),
        parts[parts.len() - 1].to_string(),
    );
    Some([forward, alternate])
}
