//! Factories for the objects that install the CDI operator
//!
//! Each factory is a pure function of the [`Config`]. Image references are
//! used as given; callers fill defaults beforehand (see
//! [`Config::with_image_defaults`]).

use cdi_operator_core::naming::{self, labels};
use cdi_operator_core::Config;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ContainerPort, EnvVar, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

use crate::builder::ResourceBuilder;
use crate::object::ResourceObject;
use crate::rules::{cluster_rules, namespaced_rules, CdiComponentRules};
use crate::schema::cdi_crd;

/// Port the operator serves metrics on
pub const METRICS_PORT: i32 = 60000;

/// Environment variable names of the operator container, in order
pub const OPERATOR_ENV: [&str; 10] = [
    "DEPLOY_CLUSTER_RESOURCES",
    "OPERATOR_VERSION",
    "CONTROLLER_IMAGE",
    "IMPORTER_IMAGE",
    "CLONER_IMAGE",
    "APISERVER_IMAGE",
    "UPLOAD_SERVER_IMAGE",
    "UPLOAD_PROXY_IMAGE",
    "VERBOSITY",
    "PULL_POLICY",
];

fn env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        value_from: None,
    }
}

/// Environment of the operator container
pub fn operator_env(config: &Config) -> Vec<EnvVar> {
    let images = &config.images;
    let values = [
        config.deploy_cluster_resources_value(),
        config.operator_version.as_str(),
        images.controller_image.as_str(),
        images.importer_image.as_str(),
        images.cloner_image.as_str(),
        images.api_server_image.as_str(),
        images.upload_server_image.as_str(),
        images.upload_proxy_image.as_str(),
        config.verbosity.as_str(),
        config.image_pull_policy.as_str(),
    ];

    OPERATOR_ENV
        .iter()
        .zip(values)
        .map(|(name, value)| env(name, value))
        .collect()
}

pub fn prometheus_ports() -> Vec<ContainerPort> {
    vec![ContainerPort {
        name: Some("metrics".to_string()),
        container_port: METRICS_PORT,
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }]
}

/// The operator deployment, one replica running the operator image
pub fn operator_deployment(config: &Config) -> Deployment {
    let builder = ResourceBuilder::default();
    let mut deployment = builder.operator_deployment(
        naming::OPERATOR_NAME,
        &config.namespace,
        naming::OPERATOR_SELECTOR_KEY,
        naming::OPERATOR_NAME,
        naming::SERVICE_ACCOUNT_NAME,
        1,
    );

    let mut container = builder.ports_container(
        naming::OPERATOR_NAME,
        &config.images.operator_image,
        &config.image_pull_policy,
        prometheus_ports(),
    );
    container.resources = Some(ResourceRequirements {
        requests: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity("100m".to_string())),
            ("memory".to_string(), Quantity("150Mi".to_string())),
        ])),
        ..Default::default()
    });
    container.env = Some(operator_env(config));

    let (key, value) = (labels::PROMETHEUS, labels::PROMETHEUS_VALUE);
    if let Some(meta_labels) = deployment.metadata.labels.as_mut() {
        meta_labels.insert(key.to_string(), value.to_string());
    }
    if let Some(spec) = deployment.spec.as_mut() {
        if let Some(meta) = spec.template.metadata.as_mut() {
            meta.labels
                .get_or_insert_with(BTreeMap::new)
                .insert(key.to_string(), value.to_string());
        }
        if let Some(pod) = spec.template.spec.as_mut() {
            pod.containers = vec![container];
        }
    }

    deployment
}

/// `operator-cluster-rbac`: cluster role and its binding
pub fn create_cluster_rbac(config: &Config) -> Vec<ResourceObject> {
    let builder = ResourceBuilder::default();
    vec![
        builder
            .operator_cluster_role(naming::CLUSTER_ROLE_NAME, cluster_rules(&CdiComponentRules))
            .into(),
        builder
            .operator_cluster_role_binding(
                naming::SERVICE_ACCOUNT_NAME,
                naming::CLUSTER_ROLE_NAME,
                &config.namespace,
            )
            .into(),
    ]
}

/// `operator-rbac`: service account, role and role binding
pub fn create_namespaced_rbac(config: &Config) -> Vec<ResourceObject> {
    let builder = ResourceBuilder::default();
    vec![
        builder
            .operator_service_account(naming::SERVICE_ACCOUNT_NAME, &config.namespace)
            .into(),
        builder
            .role(naming::ROLE_NAME, &config.namespace, namespaced_rules())
            .into(),
        builder
            .role_binding(naming::SERVICE_ACCOUNT_NAME, naming::ROLE_NAME, &config.namespace)
            .into(),
    ]
}

/// `operator-deployment`: the deployment and its leader-election config map
pub fn create_deployment(config: &Config) -> Vec<ResourceObject> {
    let builder = ResourceBuilder::default();
    vec![
        operator_deployment(config).into(),
        builder
            .config_map(
                naming::LEADER_ELECTION_CONFIG_MAP,
                &config.namespace,
                BTreeMap::new(),
            )
            .into(),
    ]
}

/// `operator-crd`: the CDI custom resource definition
pub fn create_crd(_config: &Config) -> Vec<ResourceObject> {
    vec![cdi_crd().clone().into()]
}
