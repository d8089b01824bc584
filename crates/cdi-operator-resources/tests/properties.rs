//! Properties every emission must hold, checked across several configurations

use cdi_operator_core::naming::labels;
use cdi_operator_core::{Config, ImageSet};
use cdi_operator_resources::bundle::alm_example;
use cdi_operator_resources::groups::{groups, EVERYTHING};
use cdi_operator_resources::operator::OPERATOR_ENV;
use cdi_operator_resources::schema::{
    build_crd, check_crd, missing_fields, version_schema, CdiVersion, CrValidator,
    OperatorConfigStatus,
};
use cdi_operator_resources::{emit_bundle, emit_crd, emit_group, ResourceObject};

fn configs() -> Vec<Config> {
    vec![
        Config::builder().build(),
        Config::builder()
            .namespace("kubevirt-hyperconverged")
            .operator_version("v1.58.0")
            .image_pull_policy("Always")
            .verbosity("5")
            .deploy_cluster_resources(false)
            .csv_version("1.58.0")
            .replaces_csv_version("1.57.0")
            .build(),
        Config::builder()
            .namespace("ns")
            .images(ImageSet {
                operator_image: "registry.example/cdi-operator:v9".to_string(),
                ..Default::default()
            })
            .csv_version("0.1.0-rc.1")
            .build(),
    ]
}

fn everything(config: &Config) -> Vec<ResourceObject> {
    emit_group(EVERYTHING, config).unwrap()
}

#[test]
fn test_emission_is_deterministic() {
    for config in configs() {
        let first = serde_json::to_vec(&everything(&config)).unwrap();
        let second = serde_json::to_vec(&everything(&config)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_bundle_is_deterministic() {
    for config in configs().into_iter().filter(|c| !c.csv_version.is_empty()) {
        let first = serde_json::to_vec(&emit_bundle(&config).unwrap()).unwrap();
        let second = serde_json::to_vec(&emit_bundle(&config).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_everything_is_ordered_union_of_groups() {
    for config in configs() {
        let expected: Vec<ResourceObject> = groups()
            .iter()
            .filter(|g| !g.is_aggregate())
            .flat_map(|g| emit_group(g.id(), &config).unwrap())
            .collect();
        assert_eq!(everything(&config), expected);
    }
}

#[test]
fn test_fill_defaults_is_idempotent() {
    let partial = ImageSet {
        importer_image: "importer:v1".to_string(),
        upload_server_image: "us".to_string(),
        ..Default::default()
    };

    for images in [ImageSet::default(), partial] {
        let once = images.fill_defaults();
        assert!(once.is_filled());
        assert_eq!(once.clone().fill_defaults(), once);
    }
}

#[test]
fn test_crd_is_well_formed() {
    let crd = build_crd();
    let violations = check_crd(&crd);
    assert!(violations.is_empty(), "violations: {:?}", violations);

    assert!(crd.spec.versions.iter().all(|v| v.served));
    assert_eq!(crd.spec.versions.iter().filter(|v| v.storage).count(), 1);

    for version in CdiVersion::ALL {
        version_schema(version, &OperatorConfigStatus).validate().unwrap();
    }
    assert_eq!(emit_crd().unwrap(), crd);
}

#[test]
fn test_storage_version_keeps_every_alpha_field() {
    let alpha = version_schema(CdiVersion::V1Alpha1, &OperatorConfigStatus);
    let beta = version_schema(CdiVersion::V1Beta1, &OperatorConfigStatus);
    assert!(missing_fields(&alpha, &beta).is_empty());
}

#[test]
fn test_alm_example_is_a_valid_custom_resource() {
    let validator = CrValidator::for_storage_version(&emit_crd().unwrap()).unwrap();
    assert_eq!(validator.version(), "v1beta1");
    assert!(validator.validate(&alm_example()).is_empty());
}

#[test]
fn test_bundle_embeds_emitted_deployment() {
    for config in configs().into_iter().filter(|c| !c.csv_version.is_empty()) {
        let details = emit_bundle(&config)
            .unwrap()
            .spec
            .install
            .decode_deployment()
            .unwrap();

        let emitted = everything(&config)
            .iter()
            .find_map(ResourceObject::as_deployment)
            .and_then(|d| d.spec.clone());
        assert_eq!(Some(details.deployments[0].spec.clone()), emitted);
    }
}

#[test]
fn test_operator_label_and_namespace() {
    for config in configs() {
        for object in everything(&config) {
            let operator_label = object.labels().and_then(|l| l.get(labels::OPERATOR));
            assert_eq!(operator_label.map(String::as_str), Some(""), "{}", object);

            if object.is_namespaced() {
                assert_eq!(object.namespace(), Some(config.namespace.as_str()), "{}", object);
            } else {
                assert_eq!(object.namespace(), None, "{}", object);
            }
        }
    }
}

#[test]
fn test_operator_env_order() {
    for config in configs() {
        let objects = everything(&config);
        let container = objects
            .iter()
            .find_map(ResourceObject::as_deployment)
            .and_then(|d| d.spec.as_ref())
            .and_then(|s| s.template.spec.as_ref())
            .map(|pod| pod.containers[0].clone())
            .unwrap();

        let names: Vec<_> = container
            .env
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, OPERATOR_ENV);
    }
}
