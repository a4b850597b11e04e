//! Lookup helpers for the elements of keyed lists.

use serde_json::{Map, Value};

/// Returns the value of `merge_key` and the element itself, if the element is
/// an object which carries the merge key.
pub(crate) fn keyed<'a>(
    element: &'a Value,
    merge_key: &str,
) -> Option<(&'a Value, &'a Map<String, Value>)> {
    let object = element.as_object()?;
    object.get(merge_key).map(|key_value| (key_value, object))
}

/// Returns the position of the element whose merge key equals `key_value`.
pub(crate) fn position(elements: &[Value], merge_key: &str, key_value: &Value) -> Option<usize> {
    elements
        .iter()
        .position(|element| element.get(merge_key) == Some(key_value))
}

/// Builds the `{<merge_key>: <value>}` stub identifying a single element.
pub(crate) fn stub(merge_key: &str, key_value: &Value) -> Map<String, Value> {
    Map::from_iter([(merge_key.to_owned(), key_value.clone())])
}
