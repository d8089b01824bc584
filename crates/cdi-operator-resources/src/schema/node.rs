//! Declarative OpenAPI v3 schema nodes
//!
//! A `SchemaNode` is a tagged record describing one node of a structural
//! schema. Trees are composed with small constructor functions and converted
//! into the `k8s-openapi` representation when the CRD is assembled.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSON, JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeType {
    #[default]
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    /// Untyped node whose alternatives are listed in `any_of`
    AnyOf,
}

impl NodeType {
    /// Scalar nodes may carry enumerations
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Number | Self::Boolean)
    }

    /// Nodes that may carry a string `pattern`
    fn accepts_pattern(self) -> bool {
        matches!(self, Self::String | Self::AnyOf)
    }

    /// OpenAPI `type` keyword (absent for `AnyOf`)
    pub fn as_openapi(self) -> Option<&'static str> {
        match self {
            Self::Object => Some("object"),
            Self::Array => Some("array"),
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::AnyOf => None,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnyOf => write!(f, "anyOf"),
            other => write!(f, "{}", other.as_openapi().unwrap_or_default()),
        }
    }
}

/// One node in an OpenAPI v3 schema tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaNode {
    pub type_: NodeType,
    pub description: Option<String>,
    /// Format hint (`int32`, `int64`, `date-time`)
    pub format: Option<String>,
    /// Allowed values, in declaration order
    pub enum_values: Vec<String>,
    pub pattern: Option<String>,
    /// Required property names, in declaration order
    pub required: Vec<String>,
    pub properties: BTreeMap<String, SchemaNode>,
    pub items: Option<Box<SchemaNode>>,
    pub additional_properties: Option<Box<SchemaNode>>,
    pub any_of: Vec<SchemaNode>,
    /// `x-kubernetes-int-or-string`
    pub int_or_string: bool,
}

impl SchemaNode {
    fn typed(type_: NodeType) -> Self {
        Self {
            type_,
            ..Default::default()
        }
    }

    /// Object node without properties
    pub fn object() -> Self {
        Self::typed(NodeType::Object)
    }

    pub fn string() -> Self {
        Self::typed(NodeType::String)
    }

    pub fn integer() -> Self {
        Self::typed(NodeType::Integer)
    }

    pub fn number() -> Self {
        Self::typed(NodeType::Number)
    }

    pub fn boolean() -> Self {
        Self::typed(NodeType::Boolean)
    }

    /// Array node with an item schema
    pub fn array(items: SchemaNode) -> Self {
        Self {
            type_: NodeType::Array,
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Object node whose values all follow `values`
    pub fn map(values: SchemaNode) -> Self {
        Self {
            type_: NodeType::Object,
            additional_properties: Some(Box::new(values)),
            ..Default::default()
        }
    }

    /// Untyped node matching any of the alternatives
    pub fn any_of(alternatives: impl IntoIterator<Item = SchemaNode>) -> Self {
        Self {
            type_: NodeType::AnyOf,
            any_of: alternatives.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn enumerated<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.properties.insert(name.into(), node);
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn int_or_string(mut self) -> Self {
        self.int_or_string = true;
        self
    }

    /// Check if this node has nested properties
    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Get a nested property by path (dot-separated)
    pub fn get_nested(&self, path: &str) -> Option<&SchemaNode> {
        let mut current = self;
        for part in path.split('.') {
            current = current.properties.get(part)?;
        }
        Some(current)
    }

    /// Check if a nested property is required
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Check the declaration is a legal structural schema node
    ///
    /// Stops at the first violation and reports its dotted path.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        self.validate_at("")
    }

    fn validate_at(&self, path: &str) -> Result<(), SchemaViolation> {
        let violation = |reason| SchemaViolation {
            path: display_path(path),
            reason,
        };

        if !self.enum_values.is_empty() && !self.type_.is_scalar() {
            return Err(violation(ViolationReason::EnumOnNonScalar(self.type_)));
        }
        if let Some(dup) = first_duplicate(&self.enum_values) {
            return Err(violation(ViolationReason::DuplicateEnumValue(dup)));
        }

        if let Some(pattern) = &self.pattern {
            if !self.type_.accepts_pattern() {
                return Err(violation(ViolationReason::PatternOnNonString(self.type_)));
            }
            if let Err(e) = Regex::new(pattern) {
                return Err(violation(ViolationReason::InvalidPattern(e.to_string())));
            }
        }

        if self.type_ != NodeType::Object
            && (self.has_properties()
                || !self.required.is_empty()
                || self.additional_properties.is_some())
        {
            return Err(violation(ViolationReason::PropertiesOnNonObject(self.type_)));
        }
        if let Some(dup) = first_duplicate(&self.required) {
            return Err(violation(ViolationReason::DuplicateRequiredKey(dup)));
        }
        if let Some(missing) = self
            .required
            .iter()
            .find(|key| !self.properties.contains_key(*key))
        {
            return Err(violation(ViolationReason::RequiredKeyMissing(missing.clone())));
        }

        match (self.type_, &self.items) {
            (NodeType::Array, None) => return Err(violation(ViolationReason::ArrayWithoutItems)),
            (NodeType::Array, Some(_)) | (_, None) => {}
            (other, Some(_)) => return Err(violation(ViolationReason::ItemsOnNonArray(other))),
        }

        if self.type_ == NodeType::AnyOf && self.any_of.is_empty() {
            return Err(violation(ViolationReason::EmptyAnyOf));
        }
        if self.type_ != NodeType::AnyOf && !self.any_of.is_empty() {
            return Err(violation(ViolationReason::AnyOfOnTypedNode(self.type_)));
        }

        for (name, child) in &self.properties {
            child.validate_at(&join(path, name))?;
        }
        if let Some(items) = &self.items {
            items.validate_at(&join(path, "items"))?;
        }
        if let Some(values) = &self.additional_properties {
            values.validate_at(&join(path, "additionalProperties"))?;
        }
        for (i, alternative) in self.any_of.iter().enumerate() {
            alternative.validate_at(&join(path, &format!("anyOf[{}]", i)))?;
        }
        Ok(())
    }

    /// Convert into the `k8s-openapi` schema representation
    pub fn to_openapi(&self) -> JSONSchemaProps {
        JSONSchemaProps {
            type_: self.type_.as_openapi().map(String::from),
            description: self.description.clone(),
            format: self.format.clone(),
            enum_: (!self.enum_values.is_empty()).then(|| {
                self.enum_values
                    .iter()
                    .map(|v| JSON(serde_json::Value::String(v.clone())))
                    .collect()
            }),
            pattern: self.pattern.clone(),
            required: (!self.required.is_empty()).then(|| self.required.clone()),
            properties: self.has_properties().then(|| {
                self.properties
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_openapi()))
                    .collect()
            }),
            items: self
                .items
                .as_ref()
                .map(|items| JSONSchemaPropsOrArray::Schema(Box::new(items.to_openapi()))),
            additional_properties: self
                .additional_properties
                .as_ref()
                .map(|values| JSONSchemaPropsOrBool::Schema(Box::new(values.to_openapi()))),
            any_of: (!self.any_of.is_empty())
                .then(|| self.any_of.iter().map(SchemaNode::to_openapi).collect()),
            x_kubernetes_int_or_string: self.int_or_string.then_some(true),
            ..Default::default()
        }
    }
}

impl From<&SchemaNode> for JSONSchemaProps {
    fn from(node: &SchemaNode) -> Self {
        node.to_openapi()
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

fn first_duplicate(values: &[String]) -> Option<String> {
    let mut seen = BTreeSet::new();
    values.iter().find(|v| !seen.insert(v.as_str())).cloned()
}

/// A malformed schema declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct SchemaViolation {
    /// Dotted path of the offending node
    pub path: String,
    pub reason: ViolationReason,
}

/// Why a schema node was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationReason {
    #[error("enum declared on non-scalar {0} node")]
    EnumOnNonScalar(NodeType),
    #[error("duplicate enum value '{0}'")]
    DuplicateEnumValue(String),
    #[error("pattern declared on {0} node")]
    PatternOnNonString(NodeType),
    #[error("pattern does not compile: {0}")]
    InvalidPattern(String),
    #[error("properties declared on {0} node")]
    PropertiesOnNonObject(NodeType),
    #[error("duplicate required key '{0}'")]
    DuplicateRequiredKey(String),
    #[error("required key '{0}' is not a property")]
    RequiredKeyMissing(String),
    #[error("array without item schema")]
    ArrayWithoutItems,
    #[error("items declared on {0} node")]
    ItemsOnNonArray(NodeType),
    #[error("anyOf without alternatives")]
    EmptyAnyOf,
    #[error("anyOf declared on typed {0} node")]
    AnyOfOnTypedNode(NodeType),
    #[error("unsupported type '{0}'")]
    UnknownType(String),
    #[error("version '{0}' has no openAPIV3Schema")]
    MissingVersionSchema(String),
    #[error("version '{0}' is not served")]
    VersionNotServed(String),
    #[error("expected exactly one storage version, found {0}")]
    StorageVersionCount(usize),
}
