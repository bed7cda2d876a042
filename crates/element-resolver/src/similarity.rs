//! Text similarity used by resolution strategies.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

/// Similarity between two free-text snippets in [0, 1].
///
/// Exact match (after trim + case fold) scores 1.0, containment either
/// way scores 0.8, otherwise the token-set Jaccard index decides.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let tokens_a: HashSet<&str> = a.unicode_words().collect();
    let tokens_b: HashSet<&str> = b.unicode_words().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count() as f64;
    let union = tokens_a.union(&tokens_b).count() as f64;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_ignores_case_and_whitespace() {
        assert_eq!(text_similarity("Male", " male "), 1.0);
    }

    #[test]
    fn test_containment_scores_lower_than_exact() {
        assert_eq!(text_similarity("age", "What is your age?"), 0.8);
        assert_eq!(text_similarity("Select your gender below", "gender"), 0.8);
    }

    #[test]
    fn test_token_overlap_uses_jaccard() {
        // {"employed", "full", "time"} vs {"working", "full", "time"}:
        // 2 shared of 4 distinct tokens.
        let sim = text_similarity("employed full time", "working full time");
        assert!((sim - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_text_scores_zero() {
        assert_eq!(text_similarity("male", "woman"), 0.0);
        assert_eq!(text_similarity("", "anything"), 0.0);
    }
}
