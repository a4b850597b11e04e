use serde_json::{Map, Value};
use snafu::{OptionExt, Snafu};

use crate::{
    DELETE_DIRECTIVE, MergeSchema, PATCH_DIRECTIVE, SET_ELEMENT_ORDER_PREFIX,
    element::{keyed, position, stub},
};

#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("the {document} document must be a JSON object"))]
    NotAnObject { document: &'static str },

    #[snafu(display("list {field:?} contains an element without the merge key {merge_key:?}"))]
    MissingMergeKey { field: String, merge_key: String },
}

/// Computes the strategic merge patch which turns `original` into `modified`.
///
/// Both documents are compared field by field, resolving keyed lists through
/// `schema`:
///
/// - fields which only exist in `modified` are copied,
/// - fields which only exist in `original` are set to `null`,
/// - nested objects are diffed recursively and omitted if they did not change,
/// - keyed lists contain only added and changed elements (each carrying its
///   merge key), `{"$patch": "delete"}` entries for removed elements, and a
///   `$setElementOrder/<field>` directive describing the final order,
/// - atomic lists and scalars are replaced.
///
/// Existing elements of keyed lists are never referenced by position, so a
/// patch which appends an element cannot reorder or duplicate elements which
/// were added concurrently.
pub fn create_two_way_merge_patch(
    original: &Value,
    modified: &Value,
    schema: &MergeSchema,
) -> Result<Value, Error> {
    let original = original.as_object().context(NotAnObjectSnafu {
        document: "original",
    })?;
    let modified = modified.as_object().context(NotAnObjectSnafu {
        document: "modified",
    })?;

    diff_maps(original, modified, schema).map(Value::Object)
}

fn diff_maps(
    original: &Map<String, Value>,
    modified: &Map<String, Value>,
    schema: &MergeSchema,
) -> Result<Map<String, Value>, Error> {
    let mut patch = Map::new();

    for (field, modified_value) in modified {
        let Some(original_value) = original.get(field) else {
            patch.insert(field.clone(), modified_value.clone());
            continue;
        };

        if original_value == modified_value {
            continue;
        }

        match (original_value, modified_value) {
            (Value::Object(original_map), Value::Object(modified_map)) => {
                let nested = diff_maps(original_map, modified_map, schema.nested(field))?;
                if !nested.is_empty() {
                    patch.insert(field.clone(), Value::Object(nested));
                }
            }
            (Value::Array(original_list), Value::Array(modified_list)) => {
                if let Some((merge_key, items)) = schema.merge_list(field) {
                    let list = diff_lists(field, original_list, modified_list, merge_key, items)?;

                    if let Some(element_order) = list.element_order {
                        patch.insert(
                            format!("{SET_ELEMENT_ORDER_PREFIX}{field}"),
                            Value::Array(element_order),
                        );
                    }
                    if !list.patch.is_empty() {
                        patch.insert(field.clone(), Value::Array(list.patch));
                    }
                } else {
                    patch.insert(field.clone(), modified_value.clone());
                }
            }
            _ => {
                patch.insert(field.clone(), modified_value.clone());
            }
        }
    }

    for field in original.keys() {
        if !modified.contains_key(field) {
            patch.insert(field.clone(), Value::Null);
        }
    }

    Ok(patch)
}

struct ListPatch {
    patch: Vec<Value>,

    /// Only set if the list patch is not empty or the elements were
    /// reordered.
    element_order: Option<Vec<Value>>,
}

fn diff_lists(
    field: &str,
    original: &[Value],
    modified: &[Value],
    merge_key: &str,
    items: &MergeSchema,
) -> Result<ListPatch, Error> {
    let missing_merge_key = || MissingMergeKeySnafu { field, merge_key };

    let mut patch = Vec::new();
    let mut modified_keys = Vec::with_capacity(modified.len());

    for element in modified {
        let (key_value, element) = keyed(element, merge_key).with_context(missing_merge_key)?;
        modified_keys.push(key_value);

        match position(original, merge_key, key_value) {
            Some(index) => {
                let original_element = original[index]
                    .as_object()
                    .with_context(missing_merge_key)?;

                let mut element_patch = diff_maps(original_element, element, items)?;
                if !element_patch.is_empty() {
                    element_patch.insert(merge_key.to_owned(), key_value.clone());
                    patch.push(Value::Object(element_patch));
                }
            }
            None => patch.push(Value::Object(element.clone())),
        }
    }

    let mut original_keys = Vec::with_capacity(original.len());
    for element in original {
        let (key_value, _) = keyed(element, merge_key).with_context(missing_merge_key)?;

        if position(modified, merge_key, key_value).is_some() {
            original_keys.push(key_value);
        } else {
            let mut deletion = stub(merge_key, key_value);
            deletion.insert(
                PATCH_DIRECTIVE.to_owned(),
                Value::String(DELETE_DIRECTIVE.to_owned()),
            );
            patch.push(Value::Object(deletion));
        }
    }

    // Elements which were only added do not count as a reordering.
    let reordered = modified_keys
        .iter()
        .filter(|key_value| original_keys.contains(*key_value))
        .ne(original_keys.iter());

    let element_order = (!patch.is_empty() || reordered).then(|| {
        modified_keys
            .iter()
            .map(|key_value| Value::Object(stub(merge_key, key_value)))
            .collect()
    });

    Ok(ListPatch {
        patch,
        element_order,
    })
}
