//! Reference targets, recursion scope and the last-wins merge.

use formwright_schema::{PropertySchema, SchemaComponent, SchemaDefinition, SchemaTarget};
use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::field::FieldConfig;
use crate::fieldset::FieldSetAssignments;

/// Fields compiled from one schema (or one merged group of schemas) along
/// with their field-set assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFields {
    pub fields: Vec<FieldConfig>,
    /// Field-set of each field that declared one.
    pub assignments: FieldSetAssignments,
}

impl CompiledFields {
    /// Whether nothing was compiled.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Add one field, replacing an earlier one with the same key in place.
    pub fn push(&mut self, field: FieldConfig, field_set: Option<SmolStr>) {
        let key = field.key.clone();
        match self.fields.iter().position(|f| f.key == key) {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
        // An override without its own assignment keeps the earlier one.
        if let Some(set) = field_set {
            self.assignments.insert(key, set);
        }
    }

    /// Merge parts in order. A later field replaces an earlier field with
    /// the same key, keeping the earlier position.
    pub fn merge(parts: impl IntoIterator<Item = CompiledFields>) -> CompiledFields {
        let mut merged = CompiledFields::default();
        for part in parts {
            let CompiledFields {
                fields,
                mut assignments,
            } = part;
            for field in fields {
                let set = assignments.swap_remove(&field.key);
                merged.push(field, set);
            }
        }
        merged
    }

    /// Index of fields by key.
    pub fn by_key(&self) -> IndexMap<&str, &FieldConfig> {
        self.fields.iter().map(|f| (f.key.as_str(), f)).collect()
    }
}

/// Where a compilation currently is: the key path, the chain of named
/// schemas being expanded, and the nesting depth.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Dotted key path from the root group.
    pub path: String,
    /// Named schemas entered on this branch, root first.
    pub ancestors: Vec<SmolStr>,
    pub depth: usize,
}

impl Scope {
    /// Scope for a root schema.
    pub fn root(schema: &str) -> Self {
        Self {
            path: String::new(),
            ancestors: vec![SmolStr::new(schema)],
            depth: 0,
        }
    }

    /// Dotted path of a property in this scope.
    pub fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// Scope for the schemas referenced by a property.
    pub fn descend(&self, key: &str) -> Self {
        Self {
            path: self.path_of(key),
            ancestors: self.ancestors.clone(),
            depth: self.depth + 1,
        }
    }

    /// Scope for schema-level `allOf` parts, which share the current path.
    pub fn compose(&self) -> Self {
        Self {
            path: self.path.clone(),
            ancestors: self.ancestors.clone(),
            depth: self.depth + 1,
        }
    }

    /// Enter a named schema.
    pub fn enter(&self, name: &SmolStr) -> Self {
        let mut scope = self.clone();
        scope.ancestors.push(name.clone());
        scope
    }

    /// Key identifying what a named schema compiles to in this scope.
    ///
    /// Without a customizer the result depends only on the chain of
    /// ancestors (cycle cuts) and the depth (`max_depth` cuts), not on the
    /// key path.
    pub fn memo_key(&self) -> String {
        let chain: Vec<&str> = self.ancestors.iter().map(SmolStr::as_str).collect();
        format!("{}@{}", chain.join(">"), self.depth)
    }

    /// Whether a named schema is already being expanded on this branch.
    pub fn is_cycle(&self, name: &str) -> bool {
        self.ancestors.iter().any(|a| a == name)
    }
}

/// Targets a property expands into.
///
/// Arrays expand their item schema, falling back to their own references.
/// Inline parts are named `<schema>.<property>#<index>` for logging.
pub fn property_targets(
    property: &PropertySchema,
    schema: &SchemaDefinition,
) -> Vec<SchemaTarget> {
    let components = if property.is_type("array") {
        let items = property.item_components();
        if items.is_empty() {
            property.components()
        } else {
            items
        }
    } else {
        property.components()
    };
    let owner = format!("{}.{}", schema.name, property.id);
    targets(&components, &owner)
}

/// Targets of a schema-level `allOf`.
pub fn composition_targets(schema: &SchemaDefinition) -> Vec<SchemaTarget> {
    targets(&schema.all_of, schema.name.as_str())
}

fn targets(components: &[SchemaComponent], owner: &str) -> Vec<SchemaTarget> {
    components
        .iter()
        .enumerate()
        .filter_map(|(index, component)| match component.target_name() {
            Some(name) => Some(SchemaTarget::Named(name)),
            None if component.is_inline() => Some(SchemaTarget::Inline(
                component.to_definition(format!("{owner}#{index}")),
            )),
            None => None,
        })
        .collect()
}
