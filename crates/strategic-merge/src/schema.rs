use std::collections::BTreeMap;

static EMPTY_SCHEMA: MergeSchema = MergeSchema::new();

/// Patch metadata for the fields of a JSON object.
///
/// Kubernetes attaches `patchStrategy` and `patchMergeKey` markers to the Go
/// types of its built-in resources. A [`MergeSchema`] is the explicit
/// counterpart of these markers. Fields which are not part of the schema are
/// handled as follows:
///
/// - objects are merged recursively, using an empty schema,
/// - lists are atomic and always replaced as a whole,
/// - everything else is replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSchema {
    fields: BTreeMap<String, FieldSchema>,
}

/// Patch metadata of a single field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSchema {
    /// A nested object with its own field metadata.
    Map(MergeSchema),

    /// A list of objects, which are identified by the value of `merge_key`
    /// rather than by their position.
    MergeList {
        merge_key: String,
        items: MergeSchema,
    },
}

impl MergeSchema {
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Adds metadata for a nested object.
    pub fn with_map(mut self, field: impl Into<String>, schema: Self) -> Self {
        self.fields.insert(field.into(), FieldSchema::Map(schema));
        self
    }

    /// Adds metadata for a list whose elements are merged by `merge_key`.
    pub fn with_merge_list(
        mut self,
        field: impl Into<String>,
        merge_key: impl Into<String>,
        items: Self,
    ) -> Self {
        self.fields.insert(
            field.into(),
            FieldSchema::MergeList {
                merge_key: merge_key.into(),
                items,
            },
        );
        self
    }

    pub fn field(&self, field: &str) -> Option<&FieldSchema> {
        self.fields.get(field)
    }

    /// Returns the schema of the nested object `field`, or an empty schema if
    /// there is none.
    pub fn nested(&self, field: &str) -> &Self {
        match self.fields.get(field) {
            Some(FieldSchema::Map(schema)) => schema,
            _ => &EMPTY_SCHEMA,
        }
    }

    /// Returns the merge key and the element schema if `field` is a keyed
    /// list.
    pub fn merge_list(&self, field: &str) -> Option<(&str, &Self)> {
        match self.fields.get(field) {
            Some(FieldSchema::MergeList { merge_key, items }) => Some((merge_key.as_str(), items)),
            _ => None,
        }
    }

    /// Patch metadata of `core/v1` containers, which is shared by regular,
    /// init and ephemeral containers.
    pub fn container() -> Self {
        Self::new()
            .with_merge_list("ports", "containerPort", Self::new())
            .with_merge_list("env", "name", Self::new())
            .with_merge_list("volumeMounts", "mountPath", Self::new())
            .with_merge_list("volumeDevices", "devicePath", Self::new())
    }

    /// Patch metadata of the `core/v1` `Pod` resource.
    pub fn pod() -> Self {
        let metadata = Self::new().with_merge_list("ownerReferences", "uid", Self::new());

        let spec = Self::new()
            .with_merge_list("containers", "name", Self::container())
            .with_merge_list("initContainers", "name", Self::container())
            .with_merge_list("ephemeralContainers", "name", Self::container())
            .with_merge_list("volumes", "name", Self::new())
            .with_merge_list("imagePullSecrets", "name", Self::new())
            .with_merge_list("hostAliases", "ip", Self::new())
            .with_merge_list("topologySpreadConstraints", "topologyKey", Self::new());

        // Container status lists have no merge key and are replaced as a whole
        let status = Self::new()
            .with_merge_list("conditions", "type", Self::new())
            .with_merge_list("podIPs", "ip", Self::new());

        Self::new()
            .with_map("metadata", metadata)
            .with_map("spec", spec)
            .with_map("status", status)
    }
}
