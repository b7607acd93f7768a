//! Preserved-hostname matching.
//!
//! A hostname matching any preserved pattern is never deleted by orphan
//! cleanup, regardless of orphan age. Patterns are exact hostnames or
//! `*.`-wildcards; matching is case-insensitive.

/// Compiled preserved-hostname list.
#[derive(Debug, Clone, Default)]
pub struct PreservedHostnames {
    /// Lowercased exact hostnames.
    exact: Vec<String>,
    /// Lowercased parent domains from `*.parent` patterns.
    wildcard_parents: Vec<String>,
}

impl PreservedHostnames {
    /// Build from raw patterns. Empty entries are ignored.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exact = Vec::new();
        let mut wildcard_parents = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().trim_end_matches('.');
            if pattern.is_empty() {
                continue;
            }
            let lowered = pattern.to_ascii_lowercase();
            if let Some(parent) = lowered.strip_prefix("*.") {
                wildcard_parents.push(parent.to_string());
            } else {
                exact.push(lowered);
            }
        }
        Self {
            exact,
            wildcard_parents,
        }
    }

    /// Whether `hostname` matches any preserved pattern.
    ///
    /// `*.parent` covers direct children only: `a.parent` matches,
    /// `a.b.parent` and `parent` itself do not (unless separately listed).
    #[must_use]
    pub fn matches(&self, hostname: &str) -> bool {
        let hostname = hostname.trim_end_matches('.').to_ascii_lowercase();

        if self.exact.iter().any(|e| *e == hostname) {
            return true;
        }

        self.wildcard_parents.iter().any(|parent| {
            hostname
                .strip_suffix(parent)
                .and_then(|prefix| prefix.strip_suffix('.'))
                .is_some_and(|label| !label.is_empty() && !label.contains('.'))
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard_parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive() {
        let p = PreservedHostnames::new(["Keep.Example.COM"]);
        assert!(p.matches("keep.example.com"));
        assert!(p.matches("KEEP.EXAMPLE.COM"));
        assert!(!p.matches("other.example.com"));
    }

    #[test]
    fn wildcard_matches_direct_children_only() {
        let p = PreservedHostnames::new(["*.sub.example.com"]);
        assert!(p.matches("a.sub.example.com"));
        assert!(p.matches("B.Sub.Example.Com"));
        // The parent itself is not covered.
        assert!(!p.matches("sub.example.com"));
        // Grandchildren are not covered.
        assert!(!p.matches("a.b.sub.example.com"));
    }

    #[test]
    fn wildcard_does_not_match_suffix_lookalikes() {
        let p = PreservedHostnames::new(["*.example.com"]);
        assert!(!p.matches("evil-example.com"));
        assert!(!p.matches("aexample.com"));
    }

    #[test]
    fn parent_listed_separately_is_covered() {
        let p = PreservedHostnames::new(["*.sub.example.com", "sub.example.com"]);
        assert!(p.matches("sub.example.com"));
        assert!(p.matches("a.sub.example.com"));
    }

    #[test]
    fn trailing_dots_ignored() {
        let p = PreservedHostnames::new(["keep.example.com."]);
        assert!(p.matches("keep.example.com"));
        assert!(p.matches("keep.example.com."));
    }

    #[test]
    fn empty_patterns_skipped() {
        let p = PreservedHostnames::new(["", "  "]);
        assert!(p.is_empty());
        assert!(!p.matches("anything.example.com"));
    }
}
