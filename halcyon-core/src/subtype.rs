//! Subtype registry for polymorphic relations.
//!
//! Maps a lower-cased label prefix (an embedded-collection label such as
//! `dogs`, or the collection segment of a `self` href) to a constructor of a
//! blank concrete instance.

use std::fmt;
use std::sync::Arc;

use crate::url::strip_query;

type Constructor<T> = Arc<dyn Fn() -> T + Send + Sync>;

pub struct SubtypeRegistry<T> {
    entries: Vec<(String, Constructor<T>)>,
}

impl<T> SubtypeRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `constructor` for labels starting with `prefix`
    /// (case-insensitive).
    pub fn register<F>(mut self, prefix: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert(prefix, constructor);
        self
    }

    pub fn insert<F>(&mut self, prefix: impl Into<String>, constructor: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let prefix = prefix.into().to_lowercase();
        self.entries.retain(|(p, _)| *p != prefix);
        self.entries.push((prefix, Arc::new(constructor)));
    }

    /// Blank instance for `label`, or `None` when no prefix matches.
    ///
    /// When several prefixes match, the most recently registered wins.
    pub fn instantiate(&self, label: &str) -> Option<T> {
        let label = label.to_lowercase();
        self.entries
            .iter()
            .rev()
            .find(|(prefix, _)| label.starts_with(prefix.as_str()))
            .map(|(_, constructor)| constructor())
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for SubtypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SubtypeRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> fmt::Debug for SubtypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtypeRegistry")
            .field("prefixes", &self.prefixes().collect::<Vec<_>>())
            .finish()
    }
}

/// Class-name-like label of a single resource, derived from its `self` href:
/// the path relative to `root_uri`, without the trailing id segment.
///
/// `http://host/api/dogs/7` under root `http://host/api` yields `dogs`, as
/// does the relative `/api/dogs/7`.
pub fn label_from_href(href: &str, root_uri: &str) -> String {
    let path = strip_query(href);
    let root = root_uri.trim_end_matches('/');
    let root_path = root
        .split_once("://")
        .and_then(|(_, rest)| rest.find('/').map(|idx| &rest[idx..]))
        .unwrap_or("");
    let relative = if root.is_empty() {
        path
    } else if let Some(rest) = path.strip_prefix(root) {
        rest
    } else if !root_path.is_empty() && path.starts_with('/') {
        path.strip_prefix(root_path).unwrap_or(path)
    } else {
        path
    };
    let relative = relative.trim_matches('/');
    match relative.rfind('/') {
        Some(idx) => relative[..idx].to_string(),
        None => relative.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Animal {
        Generic,
        Dog,
        Cat,
    }

    fn registry() -> SubtypeRegistry<Animal> {
        SubtypeRegistry::new()
            .register("Dog", || Animal::Dog)
            .register("cat", || Animal::Cat)
    }

    #[test]
    fn test_case_insensitive_prefix_match() {
        let reg = registry();
        assert_eq!(reg.instantiate("dogs"), Some(Animal::Dog));
        assert_eq!(reg.instantiate("CATS"), Some(Animal::Cat));
        assert_eq!(reg.instantiate("birds"), None);
        assert_eq!(reg.instantiate("hotdogs"), None);
    }

    #[test]
    fn test_latest_registration_wins_on_overlap() {
        let reg = registry().register("d", || Animal::Generic);
        assert_eq!(reg.instantiate("dogs"), Some(Animal::Generic));
    }

    #[test]
    fn test_reregistering_prefix_replaces_it() {
        let reg = registry().register("DOG", || Animal::Generic);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.instantiate("dog"), Some(Animal::Generic));
    }

    #[test]
    fn test_debug_lists_prefixes() {
        let out = format!("{:?}", registry());
        assert!(out.contains("dog"));
        assert!(out.contains("cat"));
    }

    #[test]
    fn test_label_from_href() {
        assert_eq!(label_from_href("http://h/api/dogs/7", "http://h/api"), "dogs");
        assert_eq!(label_from_href("http://h/api/dogs/7", "http://h/api/"), "dogs");
        assert_eq!(label_from_href("/zoo/cats/1?projection=x", ""), "zoo/cats");
        assert_eq!(label_from_href("http://h/api/dogs", "http://h/api"), "dogs");
        assert_eq!(label_from_href("/api/dogs/7", "http://h/api"), "dogs");
        assert_eq!(label_from_href("/other/dogs/7", "http://h/api"), "other/dogs");
    }
}
