//! Glob-style matching used for scoped dispatch and bulk unsubscribe.
//!
//! Supports:
//! - `*` matches any sequence of characters, including none
//! - `?` matches exactly one character
//!
//! Every other character matches itself, compared case-insensitively. The
//! whole candidate must match; there is no substring search.

/// A compiled value pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the pattern contains no wildcard and can only match one value.
    pub fn is_literal(&self) -> bool {
        !self.0.contains(['*', '?'])
    }

    pub fn matches(&self, candidate: &str) -> bool {
        matches(&self.0, candidate)
    }
}

impl From<&str> for Pattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

/// Returns whether `candidate` matches `pattern` in its entirety.
///
/// Backtracks to the most recent `*` on a mismatch, so the walk is linear in
/// the common case and never allocates. Positions are byte offsets that always
/// sit on `char` boundaries.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let (mut pi, mut ci) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while let Some(c) = candidate[ci..].chars().next() {
        match pattern[pi..].chars().next() {
            Some('*') => {
                pi += 1;
                star = Some((pi, ci));
                continue;
            }
            Some('?') => {
                pi += 1;
                ci += c.len_utf8();
                continue;
            }
            Some(p) if same_char(p, c) => {
                pi += p.len_utf8();
                ci += c.len_utf8();
                continue;
            }
            _ => {}
        }

        // mismatch: let the last star swallow one more character
        match star {
            Some((star_pi, star_ci)) => {
                let skipped = candidate[star_ci..].chars().next().map_or(1, char::len_utf8);
                pi = star_pi;
                ci = star_ci + skipped;
                star = Some((star_pi, ci));
            }
            None => return false,
        }
    }

    pattern[pi..].chars().all(|p| p == '*')
}

fn same_char(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_suffix() {
        assert!(matches("user-*", "user-42"));
        assert!(matches("user-*", "user-"));
        assert!(!matches("user-*", "admin-1"));
    }

    #[test]
    fn test_question_mark_is_exactly_one_char() {
        assert!(matches("?bc", "abc"));
        assert!(!matches("?bc", "abcd"));
        assert!(!matches("?bc", "bc"));
    }

    #[test]
    fn test_anchored_at_both_ends() {
        assert!(!matches("bc", "abc"));
        assert!(!matches("ab", "abc"));
        assert!(matches("*bc", "abc"));
        assert!(matches("a*c", "abbbbc"));
        assert!(!matches("a*c", "abbbbcd"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches("Host-*", "HOST-a"));
        assert!(matches("ÄBC", "äbc"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(matches("", ""));
        assert!(matches("*", ""));
        assert!(matches("**", ""));
        assert!(!matches("?", ""));
        assert!(!matches("", "a"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("a.b", "a.b"));
        assert!(!matches("a.b", "axb"));
        assert!(matches("[x]+(y)^$", "[x]+(y)^$"));
        assert!(matches("10.0.0.*", "10.0.0.7"));
        assert!(!matches("10.0.0.*", "10.0.1.7"));
    }

    #[test]
    fn test_multibyte_candidates() {
        assert!(matches("?", "é"));
        assert!(matches("*é", "café"));
        assert!(matches("c?f?", "café"));
    }

    #[test]
    fn test_backtracking_over_repeated_prefix() {
        assert!(matches("*aab", "aaaab"));
        assert!(matches("a*b*c", "aXbYbZc"));
        assert!(!matches("a*b*c", "aXbYbZ"));
    }

    #[test]
    fn test_compiled_pattern() {
        let pattern = Pattern::from("user-?");
        assert!(pattern.matches("user-1"));
        assert!(!pattern.matches("user-12"));
        assert!(!pattern.is_literal());
        assert!(Pattern::new("alice").is_literal());
        assert_eq!(pattern.as_str(), "user-?");
    }
}
