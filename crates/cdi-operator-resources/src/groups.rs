//! Resource-group registry
//!
//! Groups are kept in an ordered list. The aggregate `everything` group is
//! declared with its own member order (CRD, cluster RBAC, namespaced RBAC,
//! deployment); `create_all` walks the non-aggregate groups, which are
//! registered in that same order, so both produce identical output.

use cdi_operator_core::Config;

use crate::error::{ResourceError, Result};
use crate::object::{validate_gvks, ResourceObject};
use crate::operator::{create_cluster_rbac, create_crd, create_deployment, create_namespaced_rbac};

pub const OPERATOR_CRD: &str = "operator-crd";
pub const OPERATOR_CLUSTER_RBAC: &str = "operator-cluster-rbac";
pub const OPERATOR_RBAC: &str = "operator-rbac";
pub const OPERATOR_DEPLOYMENT: &str = "operator-deployment";
pub const EVERYTHING: &str = "everything";

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

type FactoryFn = fn(&Config) -> Vec<ResourceObject>;

#[derive(Clone, Copy)]
enum Factory {
    Single(FactoryFn),
    Aggregate(&'static [FactoryFn]),
}

/// A named factory
#[derive(Clone, Copy)]
pub struct ResourceGroup {
    id: &'static str,
    factory: Factory,
}

impl ResourceGroup {
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Whether this group only concatenates other groups
    pub fn is_aggregate(&self) -> bool {
        matches!(self.factory, Factory::Aggregate(_))
    }

    fn produce(&self, config: &Config) -> Vec<ResourceObject> {
        match self.factory {
            Factory::Single(factory) => factory(config),
            Factory::Aggregate(members) => members.iter().flat_map(|f| f(config)).collect(),
        }
    }
}

impl std::fmt::Debug for ResourceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGroup")
            .field("id", &self.id)
            .field("aggregate", &self.is_aggregate())
            .finish()
    }
}

/// Members of `everything`, in emission order
const EVERYTHING_MEMBERS: &[FactoryFn] = &[
    create_crd,
    create_cluster_rbac,
    create_namespaced_rbac,
    create_deployment,
];

/// Registered groups, non-aggregate groups first in `everything` order
static REGISTRY: [ResourceGroup; 5] = [
    ResourceGroup {
        id: OPERATOR_CRD,
        factory: Factory::Single(create_crd),
    },
    ResourceGroup {
        id: OPERATOR_CLUSTER_RBAC,
        factory: Factory::Single(create_cluster_rbac),
    },
    ResourceGroup {
        id: OPERATOR_RBAC,
        factory: Factory::Single(create_namespaced_rbac),
    },
    ResourceGroup {
        id: OPERATOR_DEPLOYMENT,
        factory: Factory::Single(create_deployment),
    },
    ResourceGroup {
        id: EVERYTHING,
        factory: Factory::Aggregate(EVERYTHING_MEMBERS),
    },
];

/// All registered groups in registry order
pub fn groups() -> &'static [ResourceGroup] {
    &REGISTRY
}

/// Registered group ids in registry order
pub fn group_ids() -> Vec<&'static str> {
    REGISTRY.iter().map(ResourceGroup::id).collect()
}

pub fn find_group(id: &str) -> Option<&'static ResourceGroup> {
    REGISTRY.iter().find(|g| g.id == id)
}

fn suggest_group(id: &str) -> Option<String> {
    REGISTRY
        .iter()
        .map(|g| (strsim::levenshtein(id, g.id), g.id))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.to_string())
}

/// Produce the objects of one group
///
/// Fails with `UnknownGroup` when `id` is not registered, and with
/// `UninitializedGvk` when the factory returns an unaddressable object.
pub fn create_group(id: &str, config: &Config) -> Result<Vec<ResourceObject>> {
    let group = find_group(id).ok_or_else(|| ResourceError::UnknownGroup {
        group: id.to_string(),
        suggestion: suggest_group(id),
    })?;

    let objects = group.produce(config);
    validate_gvks(&objects)?;
    Ok(objects)
}

/// Produce every non-aggregate group, concatenated in registry order
pub fn create_all(config: &Config) -> Result<Vec<ResourceObject>> {
    let mut objects = Vec::new();
    for group in REGISTRY.iter().filter(|g| !g.is_aggregate()) {
        objects.extend(create_group(group.id, config)?);
    }
    Ok(objects)
}
