//! Known-identifier set
//!
//! The names a host vouches for: installed modules, collection directories,
//! explicitly registered names. Consulted by the needs filter and by pass
//! bucketing. Membership is case-insensitive; the first spelling seen wins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownIdentifiers {
    ids: Vec<String>,
}

impl KnownIdentifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier. Returns false if it (in any case) was present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            return false;
        }
        match self.search(id) {
            Ok(_) => false,
            Err(at) => {
                self.ids.insert(at, id.to_string());
                true
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.search(id.trim()).is_ok()
    }

    /// Identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn search(&self, id: &str) -> Result<usize, usize> {
        let key = id.to_lowercase();
        self.ids.binary_search_by(|probe| probe.to_lowercase().cmp(&key))
    }
}

impl<S: Into<String>> FromIterator<S> for KnownIdentifiers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut known = Self::new();
        known.extend(iter);
        known
    }
}

impl<S: Into<String>> Extend<S> for KnownIdentifiers {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_case_insensitive() {
        let known: KnownIdentifiers = ["beta", "Alpha", "ALPHA", "gamma", "Beta"].into_iter().collect();
        let ids: Vec<_> = known.iter().collect();
        assert_eq!(ids, vec!["Alpha", "beta", "gamma"]);
        assert_eq!(known.len(), 3);
    }

    #[test]
    fn test_contains_ignores_case() {
        let known: KnownIdentifiers = ["Squad"].into_iter().collect();
        assert!(known.contains("squad"));
        assert!(known.contains("SQUAD"));
        assert!(!known.contains("Squa"));
    }

    #[test]
    fn test_blank_ids_are_ignored() {
        let mut known = KnownIdentifiers::new();
        assert!(!known.insert("  "));
        assert!(known.insert(" Foo "));
        assert!(known.contains("foo"));
        assert!(known.iter().eq(["Foo"]));
    }
}
