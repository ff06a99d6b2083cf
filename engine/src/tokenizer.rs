use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\w+").expect("valid regex");
}

/// Tokenize text: lowercase, then extract maximal word-character runs.
/// Order and duplicates are preserved for frequency counting downstream.
/// Empty or whitespace-only input yields an empty vector, not an error.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.to_lowercase();
    RE.find_iter(&normalized)
        .map(|mat| mat.as_str().to_string())
        .collect()
}
