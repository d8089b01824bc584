//! Schema model for the CDI operator configuration resource
//!
//! This module holds the single source of truth for the `cdis.cdi.kubevirt.io`
//! definition:
//!
//! - **Nodes** (`node`): Declarative OpenAPI v3 tree with structural checks
//! - **Placement** (`affinity`): Affinity, node selector and toleration trees
//! - **Status** (`status`): Pluggable status sub-schema
//! - **Definition** (`cdi`): Both served versions and the assembled CRD
//! - **Checks** (`check`): Structural checks and version comparison
//! - **Validation** (`validator`): Validate custom resources with `jsonschema`
//!
//! ```text
//!   SchemaNode trees ──► version_schema ──► build_crd ──► cdi_crd (global)
//!                              │                             │
//!                              ▼                             ▼
//!                        missing_fields               check_crd / CrValidator
//! ```

pub mod affinity;
pub mod cdi;
pub mod check;
mod node;
pub mod status;
pub mod validator;

pub use cdi::{build_crd, build_crd_with, cdi_crd, spec_schema, version_schema, CdiVersion};
pub use check::{check_crd, ensure_valid_crd, missing_fields};
pub use node::{NodeType, SchemaNode, SchemaViolation, ViolationReason};
pub use status::{OperatorConfigStatus, StatusSchemaProvider};
pub use validator::{CrValidator, CrViolation};
