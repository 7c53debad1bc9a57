//! Normalized edit-distance similarity between labels

/// Similarity in `[0, 1]` derived from the Levenshtein distance of the
/// lowercased inputs: `1 - distance / max(len(a), len(b))`.
///
/// Lengths are counted in characters. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    1.0 - distance as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        for s in ["", "banana", "Hot Dog", "brócoli"] {
            assert_eq!(similarity(s, s), 1.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let pairs = [("bananas", "banana"), ("apple", "orange"), ("", "cake"), ("Donut", "doughnut")];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(similarity("BANANA", "banana"), 1.0);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(similarity("", "cake"), 0.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);

        let s = similarity("bananas", "banana");
        assert!((s - (1.0 - 1.0 / 7.0)).abs() < 1e-12);
        assert!(s > 0.7);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // one substitution over five characters
        let s = similarity("crème", "creme");
        assert!((s - 0.8).abs() < 1e-12);
    }
}
