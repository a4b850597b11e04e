use serde_json::{Map, Value};
use snafu::{OptionExt, Snafu};

use crate::{
    DELETE_DIRECTIVE, MergeSchema, PATCH_DIRECTIVE, REPLACE_DIRECTIVE, SET_ELEMENT_ORDER_PREFIX,
    element::{keyed, position},
};

#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("the {document} document must be a JSON object"))]
    NotAnObject { document: &'static str },

    #[snafu(display("list {field:?} contains an element without the merge key {merge_key:?}"))]
    MissingMergeKey { field: String, merge_key: String },

    #[snafu(display("unsupported patch directive {directive}"))]
    UnsupportedDirective { directive: String },
}

/// Applies a strategic merge `patch` onto `original`, resolving keyed lists
/// through `schema`.
///
/// This mirrors what the API server does when it receives a request with the
/// `application/strategic-merge-patch+json` content type:
///
/// - `null` values remove the field,
/// - objects are merged recursively, unless they carry `"$patch": "replace"`,
/// - elements of keyed lists are merged with the element of the same key,
///   appended if there is none, or removed if they carry `"$patch": "delete"`,
/// - `$setElementOrder/<field>` directives reorder keyed lists,
/// - everything else replaces the original value.
pub fn apply_strategic_merge_patch(
    original: &Value,
    patch: &Value,
    schema: &MergeSchema,
) -> Result<Value, Error> {
    let original = original.as_object().context(NotAnObjectSnafu {
        document: "original",
    })?;
    let patch = patch
        .as_object()
        .context(NotAnObjectSnafu { document: "patch" })?;

    merge_maps(original.clone(), patch, schema).map(Value::Object)
}

fn merge_maps(
    mut original: Map<String, Value>,
    patch: &Map<String, Value>,
    schema: &MergeSchema,
) -> Result<Map<String, Value>, Error> {
    if let Some(directive) = patch.get(PATCH_DIRECTIVE) {
        if directive.as_str() != Some(REPLACE_DIRECTIVE) {
            return UnsupportedDirectiveSnafu {
                directive: directive.to_string(),
            }
            .fail();
        }

        let mut replacement = patch.clone();
        replacement.remove(PATCH_DIRECTIVE);
        return merge_maps(Map::new(), &replacement, schema);
    }

    let mut element_orders = Vec::new();

    for (field, patch_value) in patch {
        if let Some(ordered_field) = field.strip_prefix(SET_ELEMENT_ORDER_PREFIX) {
            element_orders.push((ordered_field, patch_value));
            continue;
        }

        if patch_value.is_null() {
            original.remove(field);
            continue;
        }

        let merged = match (original.remove(field), patch_value) {
            (Some(Value::Object(original_map)), Value::Object(patch_map)) => {
                Value::Object(merge_maps(original_map, patch_map, schema.nested(field))?)
            }
            (None, Value::Object(patch_map)) => {
                Value::Object(merge_maps(Map::new(), patch_map, schema.nested(field))?)
            }
            (original_value, Value::Array(patch_list)) => match schema.merge_list(field) {
                Some((merge_key, items)) => {
                    let original_list = match original_value {
                        Some(Value::Array(original_list)) => original_list,
                        _ => Vec::new(),
                    };
                    Value::Array(merge_lists(
                        field,
                        original_list,
                        patch_list,
                        merge_key,
                        items,
                    )?)
                }
                None => patch_value.clone(),
            },
            (_, patch_value) => patch_value.clone(),
        };
        original.insert(field.clone(), merged);
    }

    for (field, element_order) in element_orders {
        let Some((merge_key, _)) = schema.merge_list(field) else {
            continue;
        };
        if let Some(Value::Array(elements)) = original.get_mut(field) {
            let element_order =
                element_order
                    .as_array()
                    .with_context(|| UnsupportedDirectiveSnafu {
                        directive: format!("{SET_ELEMENT_ORDER_PREFIX}{field}"),
                    })?;
            reorder(elements, element_order, merge_key);
        }
    }

    Ok(original)
}

fn merge_lists(
    field: &str,
    mut original: Vec<Value>,
    patch: &[Value],
    merge_key: &str,
    items: &MergeSchema,
) -> Result<Vec<Value>, Error> {
    for element in patch {
        let (key_value, element) =
            keyed(element, merge_key).context(MissingMergeKeySnafu { field, merge_key })?;
        let index = position(&original, merge_key, key_value);

        match element.get(PATCH_DIRECTIVE) {
            Some(directive) if directive.as_str() == Some(DELETE_DIRECTIVE) => {
                if let Some(index) = index {
                    original.remove(index);
                }
            }
            Some(directive) => {
                return UnsupportedDirectiveSnafu {
                    directive: directive.to_string(),
                }
                .fail();
            }
            None => match index {
                Some(index) => {
                    let existing = match std::mem::take(&mut original[index]) {
                        Value::Object(existing) => existing,
                        _ => Map::new(),
                    };
                    original[index] = Value::Object(merge_maps(existing, element, items)?);
                }
                None => original.push(Value::Object(merge_maps(Map::new(), element, items)?)),
            },
        }
    }

    Ok(original)
}

/// Moves the elements named in `element_order` to the front, in that order.
/// Elements which are not named keep their relative order behind them.
fn reorder(elements: &mut Vec<Value>, element_order: &[Value], merge_key: &str) {
    let mut remaining = std::mem::take(elements);

    for entry in element_order {
        let Some(key_value) = entry.get(merge_key) else {
            continue;
        };
        if let Some(index) = position(&remaining, merge_key, key_value) {
            elements.push(remaining.remove(index));
        }
    }

    elements.extend(remaining);
}
