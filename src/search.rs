//! Fuzzy matching used by table search.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// Case-insensitive fuzzy matcher.
pub struct Matcher {
    inner: SkimMatcherV2,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self {
            inner: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// `true` if the characters of `pattern` appear in `text` in order.
    ///
    /// ```ignore
    /// let matcher = Matcher::new();
    /// assert!(matcher.matches("City Hall", "cth"));
    /// ```
    pub fn matches(&self, text: &str, pattern: &str) -> bool {
        self.inner.fuzzy_match(text, pattern).is_some()
    }

    /// `true` if any present field matches. Absent fields never match.
    pub fn matches_any<'a>(
        &self,
        texts: impl IntoIterator<Item = Option<&'a str>>,
        pattern: &str,
    ) -> bool {
        texts
            .into_iter()
            .flatten()
            .any(|text| self.matches(text, pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_match_ignores_case() {
        let matcher = Matcher::new();
        assert!(matcher.matches("Central Clinic", "cc"));
        assert!(matcher.matches("central clinic", "CLIN"));
        assert!(matcher.matches("Billing", "blg"));
        assert!(!matcher.matches("Billing", "xyz"));
    }

    #[test]
    fn test_matches_any_skips_missing_fields() {
        let matcher = Matcher::new();
        assert!(matcher.matches_any([Some("City Hall"), None], "hall"));
        assert!(matcher.matches_any([None, Some("Kigali")], "kgl"));
        assert!(!matcher.matches_any([None, None], "a"));
    }
}
