//! Query key definitions.
//!
//! A `QueryKey` identifies one logical query result as an ordered sequence
//! of primitive segments, e.g. `["order", "42"]` or `["products", "shoes",
//! 2]`. Keys form a prefix hierarchy: invalidating `["orders"]` reaches
//! every key that extends it.

use std::fmt;

/// One element of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    Text(String),
    Number(u64),
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for KeySegment {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        Self::Number(u64::from(value))
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Ordered identifier for one logical query.
///
/// Two keys are equal iff their segment sequences are element-wise equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// Start a key with its root segment.
    pub fn root(segment: impl Into<KeySegment>) -> Self {
        Self(vec![segment.into()])
    }

    /// Append a segment, builder style.
    #[must_use]
    pub fn push(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` matches the leading segments of this key.
    ///
    /// Every key starts with the empty key, and with itself.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl<S: Into<KeySegment>> FromIterator<S> for QueryKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{segment}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_equality_is_element_wise() {
        let key1 = QueryKey::root("order").push("42");
        let key2 = QueryKey::root("order").push("42");
        assert_eq!(key1, key2);

        assert_ne!(key1, QueryKey::root("order").push("43"));
        assert_ne!(key1, QueryKey::root("orders").push("42"));
    }

    #[test]
    fn text_and_number_segments_are_distinct() {
        let text = QueryKey::root("products").push("1");
        let number = QueryKey::root("products").push(1u64);
        assert_ne!(text, number);
    }

    #[test]
    fn prefix_matches_extending_keys() {
        let prefix = QueryKey::root("orders");
        assert!(QueryKey::root("orders").starts_with(&prefix));
        assert!(QueryKey::root("orders").push("mine").starts_with(&prefix));
        assert!(QueryKey::root("orders").push("all").starts_with(&prefix));
    }

    #[test]
    fn prefix_never_matches_suffix_or_sibling() {
        let prefix = QueryKey::root("orders");
        // Shares a suffix segment, not a prefix.
        assert!(!QueryKey::root("mine").push("orders").starts_with(&prefix));
        // Singular root is a different key space entirely.
        assert!(!QueryKey::root("order").push("42").starts_with(&prefix));
    }

    #[test]
    fn longer_prefix_than_key_never_matches() {
        let prefix = QueryKey::root("order").push("42").push("items");
        assert!(!QueryKey::root("order").push("42").starts_with(&prefix));
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let empty = QueryKey::default();
        assert!(QueryKey::root("users").starts_with(&empty));
        assert!(empty.starts_with(&empty));
    }

    #[test]
    fn display_renders_like_a_sequence() {
        let key = QueryKey::root("products").push("shoes").push(2u32);
        assert_eq!(key.to_string(), "[\"products\", \"shoes\", 2]");
    }
}
