//! Selector paths.
//!
//! A [`Path`] addresses a subtree of the state by an ordered sequence of
//! keys. Keys address object fields; on arrays, a key that parses as an
//! index addresses the element at that position.

use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;

/// An ordered sequence of keys addressing a subtree of the state.
///
/// Most selector paths are short; up to four keys are stored inline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    keys: SmallVec<[Arc<str>; 4]>,
}

impl Path {
    /// The empty path, which addresses the whole state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key to the path.
    pub fn push(&mut self, key: impl Into<Arc<str>>) {
        self.keys.push(key.into());
    }

    /// The keys of this path, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|key| key.as_ref())
    }

    /// Number of keys in the path.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the path addresses the whole state.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Walk the path into a state snapshot.
    ///
    /// Returns `None` as soon as a key is missing or the walk lands in a
    /// scalar.
    pub fn resolve<'a>(&self, state: &'a Value) -> Option<&'a Value> {
        let mut current = state;
        for key in &self.keys {
            current = match current {
                Value::Object(map) => map.get(key.as_ref())?,
                Value::Array(items) => {
                    let index: usize = key.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

impl From<&str> for Path {
    fn from(key: &str) -> Self {
        let mut path = Path::new();
        path.push(key);
        path
    }
}

impl From<String> for Path {
    fn from(key: String) -> Self {
        let mut path = Path::new();
        path.push(key);
        path
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(keys: [&str; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl From<&[&str]> for Path {
    fn from(keys: &[&str]) -> Self {
        keys.iter().copied().collect()
    }
}

impl From<Vec<String>> for Path {
    fn from(keys: Vec<String>) -> Self {
        keys.into_iter().collect()
    }
}

impl<K: Into<Arc<str>>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_objects() {
        let state = json!({ "foo": { "bar": "foobar" }, "baz": 42 });
        let path = Path::from(["foo", "bar"]);
        assert_eq!(path.resolve(&state), Some(&json!("foobar")));
    }

    #[test]
    fn empty_path_addresses_whole_state() {
        let state = json!({ "baz": 42 });
        assert_eq!(Path::new().resolve(&state), Some(&state));
    }

    #[test]
    fn missing_key_resolves_to_none() {
        let state = json!({ "foo": { "bar": 1 } });
        assert_eq!(Path::from(["foo", "nope"]).resolve(&state), None);
        assert_eq!(Path::from(["nope", "deep"]).resolve(&state), None);
    }

    #[test]
    fn walking_into_a_scalar_resolves_to_none() {
        let state = json!({ "baz": 42 });
        assert_eq!(Path::from(["baz", "deeper"]).resolve(&state), None);
    }

    #[test]
    fn numeric_keys_index_arrays() {
        let state = json!({ "items": ["a", "b", "c"] });
        assert_eq!(Path::from(["items", "1"]).resolve(&state), Some(&json!("b")));
        assert_eq!(Path::from(["items", "9"]).resolve(&state), None);
        assert_eq!(Path::from(["items", "one"]).resolve(&state), None);
    }

    #[test]
    fn built_from_single_key_and_iterators() {
        assert_eq!(Path::from("baz").len(), 1);
        assert_eq!(Path::from(vec!["a".to_owned(), "b".to_owned()]).len(), 2);

        let collected: Path = ["x", "y", "z"].into_iter().collect();
        assert_eq!(collected.keys().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }
}
