//! Field-set layout.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::field::{FieldConfig, FieldSet};

/// Field key to field-set name.
pub type FieldSetAssignments = IndexMap<SmolStr, SmolStr>;

/// Legend translation key for a named field-set.
pub fn legend_key(name: &str) -> String {
    format!("legend.{name}")
}

/// Build the field-set list for a group.
///
/// Fields without an assignment go to the implicit root set, which comes
/// first when present. Named sets follow in order of first appearance.
/// Every field lands in exactly one set.
pub fn accumulate(
    fields: &[FieldConfig],
    assignments: &FieldSetAssignments,
    root_id: &str,
) -> Vec<FieldSet> {
    let mut root = FieldSet::new(root_id, None);
    let mut named: IndexMap<SmolStr, FieldSet> = IndexMap::new();

    for field in fields {
        match assignments.get(&field.key) {
            Some(name) => named
                .entry(name.clone())
                .or_insert_with(|| FieldSet::new(name.clone(), Some(legend_key(name))))
                .fields
                .push(field.key.clone()),
            None => root.fields.push(field.key.clone()),
        }
    }

    let mut sets = Vec::with_capacity(named.len() + 1);
    if !root.fields.is_empty() {
        sets.push(root);
    }
    sets.extend(named.into_values());
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use pretty_assertions::assert_eq;

    fn fields(keys: &[&str]) -> Vec<FieldConfig> {
        keys.iter().map(|k| FieldConfig::new(*k, FieldKind::Input)).collect()
    }

    #[test]
    fn test_root_first_then_named_by_appearance() {
        let mut assignments = FieldSetAssignments::new();
        assignments.insert("street".into(), "address".into());
        assignments.insert("card".into(), "payment".into());
        assignments.insert("zip".into(), "address".into());

        let group = fields(&["card", "name", "street", "zip"]);
        let sets = accumulate(&group, &assignments, "root-controls");
        let ids: Vec<&str> = sets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["root-controls", "payment", "address"]);
        assert_eq!(sets[0].legend, None);
        assert_eq!(sets[2].legend.as_deref(), Some("legend.address"));
        assert_eq!(sets[2].fields, vec![SmolStr::new("street"), SmolStr::new("zip")]);
    }

    #[test]
    fn test_no_empty_root_set() {
        let mut assignments = FieldSetAssignments::new();
        assignments.insert("a".into(), "main".into());
        let sets = accumulate(&fields(&["a"]), &assignments, "root-controls");
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].id, "main");
        assert!(accumulate(&[], &assignments, "root-controls").is_empty());
    }

    #[test]
    fn test_every_field_in_one_set() {
        let all = fields(&["a", "b", "c"]);
        let mut assignments = FieldSetAssignments::new();
        assignments.insert("b".into(), "x".into());
        let sets = accumulate(&all, &assignments, "root-controls");
        for field in &all {
            assert_eq!(sets.iter().filter(|s| s.contains(&field.key)).count(), 1);
        }
    }
}
