//! CDI Operator Resources - Everything the CDI operator manifests are made of
//!
//! This crate provides:
//! - **Schema Model**: The `cdis.cdi.kubevirt.io` CRD, declared once as a typed schema tree
//! - **Resource Builders**: Roles, bindings, service accounts, deployments and config maps
//! - **Rule Sets**: Cluster and namespaced policy rules granted to the operator
//! - **Group Registry**: Named resource groups that can be emitted alone or together
//! - **Lifecycle Bundle**: The ClusterServiceVersion packaging the operator
//!
//! Every operation is a pure function of a [`Config`](cdi_operator_core::Config):
//!
//! ```
//! use cdi_operator_core::Config;
//! use cdi_operator_resources::emit_group;
//!
//! let config = Config::builder().namespace("cdi").build();
//! let objects = emit_group("operator-rbac", &config).unwrap();
//! assert_eq!(objects.len(), 3);
//! ```

pub mod builder;
pub mod bundle;
pub mod emit;
pub mod error;
pub mod groups;
pub mod object;
pub mod olm;
pub mod operator;
pub mod rules;
pub mod schema;

pub use builder::ResourceBuilder;
pub use bundle::{create_cluster_service_version, create_cluster_service_version_with};
pub use emit::{emit_all, emit_bundle, emit_crd, emit_group, group_ids};
pub use error::{ErrorKind, ResourceError, Result};
pub use groups::{create_all, create_group, ResourceGroup};
pub use object::ResourceObject;
pub use olm::{ClusterServiceVersion, ClusterServiceVersionSpec, StrategyDetailsDeployment};
pub use rules::{CdiComponentRules, ClusterRulesProvider};
pub use schema::{
    CdiVersion, CrValidator, OperatorConfigStatus, SchemaNode, SchemaViolation,
    StatusSchemaProvider,
};
