//! Paging guards and substring matching for note search.
//!
//! Search is a case-insensitive substring match performed in process after
//! retrieving the owner's full note list. Acceptable for small per-user
//! corpora; this is not a search index.

/// Default number of rows returned by a listing query.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Hard cap on rows returned by a listing query.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Clamp a requested limit into `[1, max]`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    match limit {
        Some(l) if l < 1 => default,
        Some(l) => l.min(max),
        None => default,
    }
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Case-insensitive substring containment.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_when_missing() {
        assert_eq!(clamp_limit(None, 50, 500), 50);
    }

    #[test]
    fn limit_defaults_when_non_positive() {
        assert_eq!(clamp_limit(Some(0), 50, 500), 50);
        assert_eq!(clamp_limit(Some(-3), 50, 500), 50);
    }

    #[test]
    fn limit_capped_at_max() {
        assert_eq!(clamp_limit(Some(9999), 50, 500), 500);
        assert_eq!(clamp_limit(Some(25), 50, 500), 25);
    }

    #[test]
    fn offset_never_negative() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-1)), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }

    #[test]
    fn contains_ci_ignores_case() {
        assert!(contains_ci("Hello World", "world"));
        assert!(contains_ci("HELLO", "hell"));
        assert!(!contains_ci("Hello", "bye"));
    }

    #[test]
    fn contains_ci_empty_needle_matches() {
        assert!(contains_ci("anything", ""));
    }
}
