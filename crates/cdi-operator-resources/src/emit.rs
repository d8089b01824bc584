//! Entry points used by command-line harnesses
//!
//! These functions are thin wrappers over the registry and the bundle
//! assembler. They perform no I/O; turning the values into documents is
//! left to the caller.

use cdi_operator_core::Config;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use crate::bundle::create_cluster_service_version;
use crate::error::Result;
use crate::groups::{create_all, create_group};
use crate::object::ResourceObject;
use crate::olm::ClusterServiceVersion;
use crate::schema::{cdi_crd, ensure_valid_crd};

pub use crate::groups::group_ids;

/// Produce the objects of one resource group
pub fn emit_group(id: &str, config: &Config) -> Result<Vec<ResourceObject>> {
    create_group(id, config)
}

/// Produce the lifecycle bundle
pub fn emit_bundle(config: &Config) -> Result<ClusterServiceVersion> {
    create_cluster_service_version(config)
}

/// The operator-config CRD
///
/// Fails with `SchemaValidation` when the assembled definition does not pass
/// the structural checks.
pub fn emit_crd() -> Result<CustomResourceDefinition> {
    let crd = cdi_crd();
    ensure_valid_crd(crd)?;
    Ok(crd.clone())
}

/// Every non-aggregate group, in registry order
pub fn emit_all(config: &Config) -> Result<Vec<ResourceObject>> {
    create_all(config)
}
