//! Merging a type's own field declarations with its ancestor's.

use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldSpec;

/// Merge a type's own declared fields onto its nearest ancestor's resolved
/// field list.
///
/// The ancestor's names come first, in their original order, followed by
/// the own-declared names in declaration order. Names present in both groups
/// are kept twice; accessor generation treats the repeat as a no-op.
///
/// Fails with [`SchemaError::MissingName`] if a descriptor has no name.
pub fn merge(
    type_tag: &str,
    own_declared: &[FieldSpec],
    ancestor_resolved: &[String],
) -> SchemaResult<Vec<String>> {
    let mut merged = Vec::with_capacity(ancestor_resolved.len() + own_declared.len());
    merged.extend(ancestor_resolved.iter().cloned());
    for spec in own_declared {
        let name = spec.name().ok_or_else(|| SchemaError::MissingName {
            type_tag: type_tag.to_string(),
        })?;
        merged.push(name.to_string());
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;
    use proptest::prelude::*;
    use serde_json::json;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ancestor_fields_come_first() {
        let own = vec![FieldSpec::from("c"), FieldDescriptor::new("d").child().into()];
        let merged = merge("T", &own, &names(&["a", "b"])).unwrap();
        assert_eq!(merged, names(&["a", "b", "c", "d"]));
    }

    #[test]
    fn root_type_keeps_declaration_order() {
        let own = vec![FieldSpec::from("z"), FieldSpec::from("a")];
        assert_eq!(merge("T", &own, &[]).unwrap(), names(&["z", "a"]));
    }

    #[test]
    fn duplicates_are_not_removed() {
        let own = vec![FieldSpec::from("a")];
        let merged = merge("T", &own, &names(&["a"])).unwrap();
        assert_eq!(merged, names(&["a", "a"]));
    }

    #[test]
    fn nameless_descriptor_fails() {
        let spec = FieldSpec::from_value(json!({"doc": "?"}), "T").unwrap();
        let err = merge("T", &[spec], &[]).unwrap_err();
        assert_eq!(err, SchemaError::MissingName { type_tag: "T".into() });
    }

    proptest! {
        #[test]
        fn merged_list_is_ancestor_then_own(
            ancestor in proptest::collection::vec("[a-z]{1,6}", 0..8),
            own in proptest::collection::vec("[a-z]{1,6}", 0..8),
        ) {
            let specs: Vec<FieldSpec> = own.iter().map(|s| FieldSpec::from(s.as_str())).collect();
            let merged = merge("T", &specs, &ancestor).unwrap();
            prop_assert_eq!(merged.len(), ancestor.len() + own.len());
            prop_assert_eq!(&merged[..ancestor.len()], &ancestor[..]);
            prop_assert_eq!(&merged[ancestor.len()..], &own[..]);
        }
    }
}
