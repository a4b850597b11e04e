//! Client-side computation and application of Kubernetes strategic merge
//! patches.
//!
//! Unlike JSON merge patches (RFC 7386), strategic merge patches know which
//! lists of a resource are merged by a key (for example containers by their
//! `name`) instead of being replaced as a whole. This information is not part
//! of the JSON document itself, so every operation in this crate takes the
//! patch metadata as an explicit [`MergeSchema`].
//!
//! ```
//! use serde_json::json;
//! use strategic_merge::{MergeSchema, create_two_way_merge_patch};
//!
//! let original = json!({"spec": {"ephemeralContainers": [{"name": "a", "image": "busybox"}]}});
//! let modified = json!({"spec": {"ephemeralContainers": [
//!     {"name": "a", "image": "busybox"},
//!     {"name": "b", "image": "alpine"},
//! ]}});
//!
//! let patch = create_two_way_merge_patch(&original, &modified, &MergeSchema::pod())
//!     .expect("documents match the pod schema");
//!
//! assert_eq!(patch, json!({"spec": {
//!     "$setElementOrder/ephemeralContainers": [{"name": "a"}, {"name": "b"}],
//!     "ephemeralContainers": [{"name": "b", "image": "alpine"}],
//! }}));
//! ```

pub mod apply;
pub mod diff;
mod element;
pub mod schema;

pub use apply::apply_strategic_merge_patch;
pub use diff::create_two_way_merge_patch;
pub use schema::{FieldSchema, MergeSchema};

/// Key of the directive which changes how a single map or list element is
/// merged.
pub const PATCH_DIRECTIVE: &str = "$patch";

/// Value of [`PATCH_DIRECTIVE`] which removes a list element.
pub const DELETE_DIRECTIVE: &str = "delete";

/// Value of [`PATCH_DIRECTIVE`] which replaces a map instead of merging it.
pub const REPLACE_DIRECTIVE: &str = "replace";

/// Prefix of the directive which carries the final order of a keyed list.
pub const SET_ELEMENT_ORDER_PREFIX: &str = "$setElementOrder/";
