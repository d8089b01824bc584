//! End-to-end emission scenarios

use cdi_operator_core::{Config, ImageSet};
use cdi_operator_resources::olm::InstallModeType;
use cdi_operator_resources::schema::build_crd;
use cdi_operator_resources::{emit_bundle, emit_group, ErrorKind, ResourceObject};

fn sample_images() -> ImageSet {
    ImageSet {
        operator_image: "O".to_string(),
        controller_image: "C".to_string(),
        importer_image: "I".to_string(),
        cloner_image: "K".to_string(),
        api_server_image: "A".to_string(),
        upload_proxy_image: "UP".to_string(),
        upload_server_image: "US".to_string(),
    }
}

fn deployment_config() -> Config {
    Config::builder()
        .namespace("ns")
        .operator_version("2.0")
        .image_pull_policy("IfNotPresent")
        .verbosity("3")
        .images(sample_images())
        .build()
}

mod unknown_group {
    use super::*;

    #[test]
    fn test_unknown_group_names_the_group() {
        let config = Config::builder()
            .namespace("x")
            .csv_version("1.2.3")
            .build();

        let err = emit_group("does-not-exist", &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownGroup);
        assert!(err.is_input_error());
        assert!(err.to_string().contains("does-not-exist"));
    }
}

mod image_defaults {
    use super::*;

    #[test]
    fn test_empty_images_get_literal_defaults() {
        let images = ImageSet::default().fill_defaults();

        assert_eq!(images.controller_image, "cdi-controller");
        assert_eq!(images.importer_image, "cdi-importer");
        assert_eq!(images.cloner_image, "cdi-cloner");
        assert_eq!(images.api_server_image, "cdi-apiserver");
        assert_eq!(images.upload_proxy_image, "cdi-uploadproxy");
        assert_eq!(images.upload_server_image, "cdi-uploadserver");
        assert_eq!(images.operator_image, "cdi-operator");
    }
}

mod printer_columns {
    use super::*;

    #[test]
    fn test_crd_printer_columns() {
        let crd = build_crd();
        for version in &crd.spec.versions {
            let columns: Vec<_> = version
                .additional_printer_columns
                .as_ref()
                .unwrap()
                .iter()
                .map(|c| (c.name.as_str(), c.type_.as_str(), c.json_path.as_str()))
                .collect();

            assert_eq!(
                columns,
                [
                    ("Age", "date", ".metadata.creationTimestamp"),
                    ("Phase", "string", ".status.phase"),
                ],
                "unexpected columns for {}",
                version.name
            );
        }
    }
}

mod deployment_environment {
    use super::*;

    #[test]
    fn test_operator_deployment_env_and_port() {
        let objects = emit_group("operator-deployment", &deployment_config()).unwrap();
        let deployments: Vec<_> = objects
            .iter()
            .filter_map(ResourceObject::as_deployment)
            .collect();
        assert_eq!(deployments.len(), 1);

        let pod = deployments[0]
            .spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
            .unwrap();
        let container = &pod.containers[0];

        let env: Vec<_> = container
            .env
            .as_ref()
            .unwrap()
            .iter()
            .map(|e| (e.name.as_str(), e.value.as_deref().unwrap_or_default()))
            .collect();
        assert_eq!(
            env,
            [
                ("DEPLOY_CLUSTER_RESOURCES", "true"),
                ("OPERATOR_VERSION", "2.0"),
                ("CONTROLLER_IMAGE", "C"),
                ("IMPORTER_IMAGE", "I"),
                ("CLONER_IMAGE", "K"),
                ("APISERVER_IMAGE", "A"),
                ("UPLOAD_SERVER_IMAGE", "US"),
                ("UPLOAD_PROXY_IMAGE", "UP"),
                ("VERBOSITY", "3"),
                ("PULL_POLICY", "IfNotPresent"),
            ]
        );

        let ports = container.ports.as_ref().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some("metrics"));
        assert_eq!(ports[0].container_port, 60000);
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
    }
}

mod bundle_assembly {
    use super::*;

    fn bundle_config() -> Config {
        Config {
            csv_version: "1.2.3".to_string(),
            replaces_csv_version: "1.2.2".to_string(),
            ..deployment_config()
        }
    }

    #[test]
    fn test_bundle_contents() {
        let csv = emit_bundle(&bundle_config()).unwrap();

        assert_eq!(csv.metadata.name.as_deref(), Some("cdioperator.1.2.3"));
        assert_eq!(csv.spec.replaces.as_deref(), Some("1.2.2"));

        let modes: Vec<_> = csv.spec.install_modes.iter().map(|m| m.type_).collect();
        assert_eq!(modes, InstallModeType::ALL);
        assert!(csv.spec.install_modes.iter().all(|m| m.supported));

        let owned = &csv.spec.customresourcedefinitions.owned;
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].name, "cdis.cdi.kubevirt.io");
        assert_eq!(owned[0].version, "v1beta1");
        assert_eq!(owned[0].kind, "CDI");
    }

    #[test]
    fn test_strategy_embeds_emitted_deployment() {
        let config = bundle_config();
        let csv = emit_bundle(&config).unwrap();
        assert_eq!(csv.spec.install.strategy, "deployment");

        let details = csv.spec.install.decode_deployment().unwrap();
        assert_eq!(details.deployments.len(), 1);
        assert_eq!(details.deployments[0].name, "cdi-operator");

        let objects = emit_group("operator-deployment", &deployment_config()).unwrap();
        let emitted = objects
            .iter()
            .find_map(ResourceObject::as_deployment)
            .and_then(|d| d.spec.clone())
            .unwrap();
        assert_eq!(details.deployments[0].spec, emitted);
    }
}

mod invalid_version {
    use super::*;

    #[test]
    fn test_malformed_csv_version() {
        let config = Config {
            csv_version: "not-a-version".to_string(),
            ..deployment_config()
        };

        let err = emit_bundle(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVersion);
        assert!(err.to_string().contains("not-a-version"));
    }

    #[test]
    fn test_truncated_csv_version_is_rejected() {
        let config = Config {
            csv_version: "1.2".to_string(),
            ..deployment_config()
        };
        assert_eq!(
            emit_bundle(&config).unwrap_err().kind(),
            ErrorKind::InvalidVersion
        );
    }
}
