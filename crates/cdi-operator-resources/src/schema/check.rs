//! Structural checks over emitted definitions
//!
//! `check_crd` works on the serialized `k8s-openapi` representation, so it
//! also covers definitions that were not built from [`SchemaNode`] trees.
//! `missing_fields` compares two declared trees and lists every field the
//! newer one dropped.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use std::collections::BTreeSet;

use super::{NodeType, SchemaNode, SchemaViolation, ViolationReason};
use crate::error::ResourceError;

/// Check an emitted definition for structural problems
///
/// Every served version must be marked served, exactly one must be the
/// storage version, and every schema node must pass the same rules as
/// [`SchemaNode::validate`]. All violations are returned, not just the first.
pub fn check_crd(crd: &CustomResourceDefinition) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    let storage_count = crd.spec.versions.iter().filter(|v| v.storage).count();
    if storage_count != 1 {
        violations.push(SchemaViolation {
            path: "spec.versions".to_string(),
            reason: ViolationReason::StorageVersionCount(storage_count),
        });
    }

    for version in &crd.spec.versions {
        let path = format!("spec.versions[{}]", version.name);
        if !version.served {
            violations.push(SchemaViolation {
                path: path.clone(),
                reason: ViolationReason::VersionNotServed(version.name.clone()),
            });
        }

        match version
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
        {
            Some(schema) => check_props(schema, &format!("{}.openAPIV3Schema", path), &mut violations),
            None => violations.push(SchemaViolation {
                path,
                reason: ViolationReason::MissingVersionSchema(version.name.clone()),
            }),
        }
    }

    violations
}

/// Fail with the first violation [`check_crd`] finds
pub fn ensure_valid_crd(crd: &CustomResourceDefinition) -> crate::error::Result<()> {
    match check_crd(crd).into_iter().next() {
        Some(violation) => Err(ResourceError::Schema(violation)),
        None => Ok(()),
    }
}

fn node_type(props: &JSONSchemaProps) -> Result<NodeType, ViolationReason> {
    match props.type_.as_deref() {
        Some("object") => Ok(NodeType::Object),
        Some("array") => Ok(NodeType::Array),
        Some("string") => Ok(NodeType::String),
        Some("integer") => Ok(NodeType::Integer),
        Some("number") => Ok(NodeType::Number),
        Some("boolean") => Ok(NodeType::Boolean),
        None if props.any_of.as_ref().is_some_and(|alts| !alts.is_empty()) => Ok(NodeType::AnyOf),
        Some(other) => Err(ViolationReason::UnknownType(other.to_string())),
        None => Err(ViolationReason::UnknownType("(none)".to_string())),
    }
}

fn check_props(props: &JSONSchemaProps, path: &str, out: &mut Vec<SchemaViolation>) {
    let mut report = |reason| {
        out.push(SchemaViolation {
            path: path.to_string(),
            reason,
        })
    };

    let type_ = match node_type(props) {
        Ok(t) => t,
        Err(reason) => {
            report(reason);
            return;
        }
    };

    if props.enum_.as_ref().is_some_and(|e| !e.is_empty()) && !type_.is_scalar() {
        report(ViolationReason::EnumOnNonScalar(type_));
    }
    if props.pattern.is_some() && !matches!(type_, NodeType::String | NodeType::AnyOf) {
        report(ViolationReason::PatternOnNonString(type_));
    }

    let required = props.required.as_deref().unwrap_or_default();
    let mut seen = BTreeSet::new();
    for key in required {
        if !seen.insert(key) {
            report(ViolationReason::DuplicateRequiredKey(key.clone()));
        }
        let declared = props
            .properties
            .as_ref()
            .is_some_and(|p| p.contains_key(key));
        if !declared {
            report(ViolationReason::RequiredKeyMissing(key.clone()));
        }
    }

    if type_ != NodeType::Object && props.properties.as_ref().is_some_and(|p| !p.is_empty()) {
        report(ViolationReason::PropertiesOnNonObject(type_));
    }
    match (type_, &props.items) {
        (NodeType::Array, None) => report(ViolationReason::ArrayWithoutItems),
        (NodeType::Array, Some(_)) | (_, None) => {}
        (other, Some(_)) => report(ViolationReason::ItemsOnNonArray(other)),
    }

    for (name, child) in props.properties.iter().flatten() {
        check_props(child, &format!("{}.{}", path, name), out);
    }
    match &props.items {
        Some(JSONSchemaPropsOrArray::Schema(items)) => {
            check_props(items, &format!("{}.items", path), out)
        }
        Some(JSONSchemaPropsOrArray::Schemas(items)) => {
            for (i, item) in items.iter().enumerate() {
                check_props(item, &format!("{}.items[{}]", path, i), out);
            }
        }
        None => {}
    }
    if let Some(JSONSchemaPropsOrBool::Schema(values)) = &props.additional_properties {
        check_props(values, &format!("{}.additionalProperties", path), out);
    }
    for (i, alternative) in props.any_of.iter().flatten().enumerate() {
        check_props(alternative, &format!("{}.anyOf[{}]", path, i), out);
    }
}

/// Paths of fields declared in `old` that `new` no longer declares
///
/// Paths are dot-separated; item and map-value schemas are entered as
/// `items` and `additionalProperties`.
pub fn missing_fields(old: &SchemaNode, new: &SchemaNode) -> Vec<String> {
    let mut missing = Vec::new();
    compare_nodes(old, new, "", &mut missing);
    missing
}

fn compare_nodes(old: &SchemaNode, new: &SchemaNode, path_prefix: &str, missing: &mut Vec<String>) {
    let join = |name: &str| {
        if path_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", path_prefix, name)
        }
    };

    for (name, old_child) in &old.properties {
        match new.properties.get(name) {
            Some(new_child) => compare_nodes(old_child, new_child, &join(name), missing),
            None => missing.push(join(name)),
        }
    }

    if let (Some(old_items), Some(new_items)) = (&old.items, &new.items) {
        compare_nodes(old_items, new_items, &join("items"), missing);
    }
    if let (Some(old_values), Some(new_values)) =
        (&old.additional_properties, &new.additional_properties)
    {
        compare_nodes(old_values, new_values, &join("additionalProperties"), missing);
    }
}
