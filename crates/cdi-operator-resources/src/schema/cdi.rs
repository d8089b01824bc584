//! The CDI operator configuration resource definition
//!
//! Both served versions are declared in full. `v1beta1` is the storage
//! version and carries every `v1alpha1` spec field plus `featureGates` and
//! `preallocation` under `config`.

use cdi_operator_core::naming::{self, cdi};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceColumnDefinition, CustomResourceConversion, CustomResourceDefinition,
    CustomResourceDefinitionNames, CustomResourceDefinitionSpec, CustomResourceDefinitionVersion,
    CustomResourceSubresources, CustomResourceValidation,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use once_cell::sync::Lazy;

use super::affinity::node_placement;
use super::status::{OperatorConfigStatus, StatusSchemaProvider};
use super::SchemaNode;

/// Canonical resource quantity pattern
pub const QUANTITY_PATTERN: &str = r"^(\+|-)?(([0-9]+(\.[0-9]*)?)|(\.[0-9]+))(([KMGTPE]i)|[numkMGTPE]|([eE](\+|-)?(([0-9]+(\.[0-9]*)?)|(\.[0-9]+))))?$";

/// Filesystem overhead fraction, between 0 and 1 with up to three decimals
pub const FILESYSTEM_OVERHEAD_PATTERN: &str = r"^(0(?:\.\d{1,3})?|1)$";

const API_VERSION_DESCRIPTION: &str = "APIVersion defines the versioned schema of this representation of an object. Servers should convert recognized schemas to the latest internal value, and may reject unrecognized values. More info: https://git.k8s.io/community/contributors/devel/sig-architecture/api-conventions.md#resources";

const KIND_DESCRIPTION: &str = "Kind is a string value representing the REST resource this object represents. Servers may infer this from the endpoint the client submits requests to. Cannot be updated. In CamelCase. More info: https://git.k8s.io/community/contributors/devel/sig-architecture/api-conventions.md#types-kinds";

/// Served versions of the CDI resource, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CdiVersion {
    V1Alpha1,
    V1Beta1,
}

impl CdiVersion {
    pub const ALL: [CdiVersion; 2] = [CdiVersion::V1Alpha1, CdiVersion::V1Beta1];

    pub fn name(self) -> &'static str {
        match self {
            Self::V1Alpha1 => cdi::VERSION_V1ALPHA1,
            Self::V1Beta1 => cdi::VERSION_V1BETA1,
        }
    }

    /// Only the newest version is persisted
    pub fn is_storage(self) -> bool {
        self == Self::V1Beta1
    }

    /// The version objects are stored as
    pub fn storage() -> Self {
        Self::V1Beta1
    }

    /// Look a version up by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }
}

impl std::fmt::Display for CdiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn cert_config() -> SchemaNode {
    let cert = |description: &str| {
        SchemaNode::object()
            .describe(description)
            .property(
                "duration",
                SchemaNode::string()
                    .describe("The requested 'duration' (i.e. lifetime) of the Certificate."),
            )
            .property(
                "renewBefore",
                SchemaNode::string().describe("The amount of time before the currently issued certificate's `notAfter` time that we will begin to attempt to renew the certificate."),
            )
    };

    SchemaNode::object()
        .describe("certificate configuration")
        .property(
            "ca",
            cert("CA configuration CA certs are kept in the CA bundle as long as they are valid"),
        )
        .property(
            "server",
            cert("Server configuration Certs are rotated and discarded"),
        )
}

fn quantity_map(description: &str) -> SchemaNode {
    let quantity = SchemaNode::any_of([SchemaNode::integer(), SchemaNode::string()])
        .pattern(QUANTITY_PATTERN)
        .int_or_string();
    SchemaNode::map(quantity).describe(description)
}

fn pod_resource_requirements() -> SchemaNode {
    SchemaNode::object()
        .describe("ResourceRequirements describes the compute resource requirements.")
        .property(
            "limits",
            quantity_map("Limits describes the maximum amount of compute resources allowed. More info: https://kubernetes.io/docs/concepts/configuration/manage-compute-resources-container/"),
        )
        .property(
            "requests",
            quantity_map("Requests describes the minimum amount of compute resources required. If Requests is omitted for a container, it defaults to Limits if that is explicitly specified, otherwise to an implementation-defined value. More info: https://kubernetes.io/docs/concepts/configuration/manage-compute-resources-container/"),
        )
}

fn filesystem_overhead() -> SchemaNode {
    SchemaNode::object()
        .describe("FilesystemOverhead describes the space reserved for overhead when using Filesystem volumes. A value is between 0 and 1, if not defined it is 0.055 (5.5% overhead)")
        .property(
            "global",
            SchemaNode::string()
                .describe("Global is how much space of a Filesystem volume should be reserved for overhead. This value is used unless overridden by a more specific value (per storageClass)")
                .pattern(FILESYSTEM_OVERHEAD_PATTERN),
        )
        .property(
            "storageClass",
            SchemaNode::map(
                SchemaNode::string()
                    .describe("Percent is a string that can only be a value between [0,1) (Note: we actually rely on reconcile to reject invalid values)")
                    .pattern(FILESYSTEM_OVERHEAD_PATTERN),
            )
            .describe("StorageClass specifies how much space of a Filesystem volume should be reserved for safety. The keys are the storageClass and the values are the overhead. This value overrides the global value"),
        )
}

fn import_proxy() -> SchemaNode {
    SchemaNode::object()
        .describe("ImportProxy contains importer pod proxy configuration.")
        .property(
            "HTTPProxy",
            SchemaNode::string().describe("HTTPProxy is the URL http://<username>:<pswd>@<ip>:<port> of the import proxy for HTTP requests.  Empty means unset and will not result in the import pod env var."),
        )
        .property(
            "HTTPSProxy",
            SchemaNode::string().describe("HTTPSProxy is the URL https://<username>:<pswd>@<ip>:<port> of the import proxy for HTTPS requests.  Empty means unset and will not result in the import pod env var."),
        )
        .property(
            "noProxy",
            SchemaNode::string().describe("NoProxy is a comma-separated list of hostnames and/or CIDRs for which the proxy should not be used. Empty means unset and will not result in the import pod env var."),
        )
        .property(
            "trustedCAProxy",
            SchemaNode::string().describe("TrustedCAProxy is the name of a ConfigMap in the cdi namespace that contains a user-provided trusted certificate authority (CA) bundle. The TrustedCAProxy field is consumed by the import controller that is resposible for coping it to a config map named trusted-ca-proxy-bundle-cm in the cdi namespace."),
        )
}

fn cdi_config(version: CdiVersion) -> SchemaNode {
    let mut config = SchemaNode::object()
        .describe("CDIConfig at CDI level")
        .property("filesystemOverhead", filesystem_overhead())
        .property("importProxy", import_proxy())
        .property(
            "insecureRegistries",
            SchemaNode::array(SchemaNode::string())
                .describe("InsecureRegistries is a list of TLS disabled registries"),
        )
        .property("podResourceRequirements", pod_resource_requirements())
        .property(
            "scratchSpaceStorageClass",
            SchemaNode::string().describe("Override the storage class to used for scratch space during transfer operations. The scratch space storage class is determined in the following order: 1. value of scratchSpaceStorageClass, if that doesn't exist, use the default storage class, if there is no default storage class, use the storage class of the DataVolume, if no storage class specified, use no storage class for scratch space"),
        )
        .property(
            "uploadProxyURLOverride",
            SchemaNode::string().describe("Override the URL used when uploading to a DataVolume"),
        );

    if version == CdiVersion::V1Beta1 {
        config = config
            .property(
                "featureGates",
                SchemaNode::array(SchemaNode::string())
                    .describe("FeatureGates are a list of specific enabled feature gates"),
            )
            .property(
                "preallocation",
                SchemaNode::boolean().describe(
                    "Preallocation controls whether storage for DataVolumes should be allocated in advance.",
                ),
            );
    }
    config
}

/// `spec` of the CDI resource for one served version
pub fn spec_schema(version: CdiVersion) -> SchemaNode {
    SchemaNode::object()
        .describe("CDISpec defines our specification for the CDI installation")
        .property("certConfig", cert_config())
        .property(
            "cloneStrategyOverride",
            SchemaNode::string()
                .describe("Clone strategy override: should we use a host-assisted copy even if snapshots are available?")
                .enumerated(["copy", "snapshot"]),
        )
        .property("config", cdi_config(version))
        .property(
            "imagePullPolicy",
            SchemaNode::string()
                .describe("PullPolicy describes a policy for if/when to pull a container image")
                .enumerated(["Always", "IfNotPresent", "Never"]),
        )
        .property(
            "infra",
            node_placement("Rules on which nodes CDI infrastructure pods will be scheduled"),
        )
        .property(
            "uninstallStrategy",
            SchemaNode::string()
                .describe("CDIUninstallStrategy defines the state to leave CDI on uninstall")
                .enumerated(["RemoveWorkloads", "BlockUninstallIfWorkloadsExist"]),
        )
        .property(
            "workload",
            node_placement("Restrict on which nodes CDI workload pods will be scheduled"),
        )
}

/// Whole `openAPIV3Schema` for one served version
pub fn version_schema(version: CdiVersion, status: &dyn StatusSchemaProvider) -> SchemaNode {
    SchemaNode::object()
        .describe("CDI is the CDI Operator CRD")
        .property(
            "apiVersion",
            SchemaNode::string().describe(API_VERSION_DESCRIPTION),
        )
        .property("kind", SchemaNode::string().describe(KIND_DESCRIPTION))
        .property("metadata", SchemaNode::object())
        .property("spec", spec_schema(version))
        .property("status", status.status_schema(cdi::STATUS_NAME))
        .required(["spec"])
}

fn printer_columns() -> Vec<CustomResourceColumnDefinition> {
    vec![
        CustomResourceColumnDefinition {
            name: "Age".to_string(),
            type_: "date".to_string(),
            json_path: ".metadata.creationTimestamp".to_string(),
            ..Default::default()
        },
        CustomResourceColumnDefinition {
            name: "Phase".to_string(),
            type_: "string".to_string(),
            json_path: ".status.phase".to_string(),
            ..Default::default()
        },
    ]
}

fn crd_version(
    version: CdiVersion,
    status: &dyn StatusSchemaProvider,
) -> CustomResourceDefinitionVersion {
    let schema = version_schema(version, status);
    debug_assert!(
        schema.validate().is_ok(),
        "malformed {} schema: {:?}",
        version,
        schema.validate()
    );

    CustomResourceDefinitionVersion {
        name: version.name().to_string(),
        served: true,
        storage: version.is_storage(),
        additional_printer_columns: Some(printer_columns()),
        schema: Some(CustomResourceValidation {
            open_api_v3_schema: Some(schema.to_openapi()),
        }),
        subresources: Some(CustomResourceSubresources::default()),
        ..Default::default()
    }
}

/// Build the CDI custom resource definition with a custom status schema
pub fn build_crd_with(status: &dyn StatusSchemaProvider) -> CustomResourceDefinition {
    CustomResourceDefinition {
        metadata: ObjectMeta {
            name: Some(cdi::CRD_NAME.to_string()),
            labels: Some(naming::operator_labels()),
            ..Default::default()
        },
        spec: CustomResourceDefinitionSpec {
            group: naming::CDI_GROUP.to_string(),
            names: CustomResourceDefinitionNames {
                kind: cdi::KIND.to_string(),
                list_kind: Some(cdi::LIST_KIND.to_string()),
                plural: cdi::PLURAL.to_string(),
                singular: Some(cdi::SINGULAR.to_string()),
                short_names: Some(cdi::SHORT_NAMES.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            },
            scope: "Cluster".to_string(),
            conversion: Some(CustomResourceConversion {
                strategy: "None".to_string(),
                webhook: None,
            }),
            versions: CdiVersion::ALL
                .into_iter()
                .map(|version| crd_version(version, status))
                .collect(),
            ..Default::default()
        },
        status: None,
    }
}

/// Build the CDI custom resource definition
pub fn build_crd() -> CustomResourceDefinition {
    build_crd_with(&OperatorConfigStatus)
}

static CDI_CRD: Lazy<CustomResourceDefinition> = Lazy::new(build_crd);

/// Process-wide CDI custom resource definition, built on first use
pub fn cdi_crd() -> &'static CustomResourceDefinition {
    &CDI_CRD
}
