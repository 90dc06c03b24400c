//! Per-request path variables.

use std::collections::HashMap;
use std::sync::Arc;

/// Named variables extracted from the request path.
///
/// Shared, immutable, and cheap to clone. Each [`Request`](crate::Request)
/// handle carries its own `Params`; attaching new variables produces a new
/// handle rather than editing this one, so nothing leaks between requests or
/// between candidate routes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params(Arc<HashMap<String, String>>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `self` overlaid with `other`; keys in `other` win.
    pub(crate) fn merged(&self, other: &Params) -> Params {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut map = (*self.0).clone();
        map.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Params(Arc::new(map))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Params(Arc::new(iter.into_iter().collect()))
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(map: HashMap<String, String>) -> Self {
        Params(Arc::new(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn empty_by_default() {
        let p = Params::default();
        assert!(p.is_empty());
        assert_eq!(p.get("id"), None);
    }

    #[test]
    fn merged_prefers_newer_values() {
        let base = params(&[("id", "1"), ("org", "acme")]);
        let merged = base.merged(&params(&[("id", "2")]));

        assert_eq!(merged.get("id"), Some("2"));
        assert_eq!(merged.get("org"), Some("acme"));
        assert_eq!(base.get("id"), Some("1"));
    }
}
