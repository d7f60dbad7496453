//! Keyword normalization and query-block padding.

/// Normalize one token: uppercase, ASCII alphanumerics only.
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Split on whitespace, normalize each token, drop empties.
pub fn tokenize_normalized(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Pad or truncate a keyword block list to a fixed cardinality.
///
/// Padding tokens are `DUMMY:{i}`; they hash to filter positions like any
/// other token, so a fixed block count hides the true query arity.
pub fn pad_query_blocks(blocks: &[String], max_r_blocks: usize) -> Vec<String> {
    let mut out: Vec<String> = blocks.iter().take(max_r_blocks).cloned().collect();
    for i in 0..max_r_blocks.saturating_sub(blocks.len()) {
        out.push(format!("DUMMY:{}", i));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize_token("café!"), "CAF");
        assert_eq!(normalize_token("park-and-ride"), "PARKANDRIDE");
        assert_eq!(normalize_token("42nd"), "42ND");
    }

    #[test]
    fn test_tokenize_drops_empties() {
        assert_eq!(
            tokenize_normalized("  park,  cafe;; "),
            vec!["PARK".to_string(), "CAFE".to_string()]
        );
        assert!(tokenize_normalized(" ;; -- ").is_empty());
    }

    #[test]
    fn test_pad_query_blocks() {
        let blocks = vec!["PARK".to_string()];
        let padded = pad_query_blocks(&blocks, 3);
        assert_eq!(padded, vec!["PARK", "DUMMY:0", "DUMMY:1"]);

        let many: Vec<String> = (0..5).map(|i| format!("T{}", i)).collect();
        assert_eq!(pad_query_blocks(&many, 3).len(), 3);
    }
}
