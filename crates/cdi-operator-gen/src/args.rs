//! Configuration flags shared by every subcommand
//!
//! Values are resolved in order: defaults, then the `--config` file, then
//! flags (or their `CDI_*` environment variables).

use cdi_operator_core::{Config, ImageSet};
use clap::Args;
use std::path::PathBuf;

use crate::error::Result;

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Configuration file (YAML or JSON) with any of the values below
    #[arg(long, global = true, env = "CDI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Version of the generated ClusterServiceVersion
    #[arg(long, global = true, env = "CDI_CSV_VERSION")]
    pub csv_version: Option<String>,

    /// Version of the ClusterServiceVersion being replaced
    #[arg(long, global = true, env = "CDI_REPLACES_CSV_VERSION")]
    pub replaces_csv_version: Option<String>,

    /// Namespace the operator is installed into
    #[arg(long, global = true, env = "CDI_NAMESPACE")]
    pub namespace: Option<String>,

    /// Image pull policy for every CDI container
    #[arg(long, global = true, env = "CDI_PULL_POLICY")]
    pub pull_policy: Option<String>,

    /// Operator log verbosity
    #[arg(long, global = true, env = "CDI_VERBOSITY")]
    pub verbosity: Option<String>,

    /// Version reported by the operator
    #[arg(long, global = true, env = "CDI_OPERATOR_VERSION")]
    pub operator_version: Option<String>,

    #[arg(long, global = true, env = "CDI_OPERATOR_IMAGE")]
    pub operator_image: Option<String>,

    #[arg(long, global = true, env = "CDI_CONTROLLER_IMAGE")]
    pub controller_image: Option<String>,

    #[arg(long, global = true, env = "CDI_IMPORTER_IMAGE")]
    pub importer_image: Option<String>,

    #[arg(long, global = true, env = "CDI_CLONER_IMAGE")]
    pub cloner_image: Option<String>,

    #[arg(long, global = true, env = "CDI_APISERVER_IMAGE")]
    pub apiserver_image: Option<String>,

    #[arg(long, global = true, env = "CDI_UPLOADPROXY_IMAGE")]
    pub uploadproxy_image: Option<String>,

    #[arg(long, global = true, env = "CDI_UPLOADSERVER_IMAGE")]
    pub uploadserver_image: Option<String>,

    /// Base64-encoded PNG logo for the ClusterServiceVersion
    #[arg(long = "cdi-logo-base64", global = true, env = "CDI_LOGO_BASE64")]
    pub logo_base64: Option<String>,

    /// Whether the operator deploys cluster-scoped resources (true/false)
    #[arg(long, global = true, env = "CDI_DEPLOY_CLUSTER_RESOURCES", value_name = "BOOL")]
    pub deploy_cluster_resources: Option<bool>,
}

fn set(field: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

impl ConfigArgs {
    fn apply_images(&self, images: &mut ImageSet) {
        set(&mut images.operator_image, &self.operator_image);
        set(&mut images.controller_image, &self.controller_image);
        set(&mut images.importer_image, &self.importer_image);
        set(&mut images.cloner_image, &self.cloner_image);
        set(&mut images.api_server_image, &self.apiserver_image);
        set(&mut images.upload_proxy_image, &self.uploadproxy_image);
        set(&mut images.upload_server_image, &self.uploadserver_image);
    }

    /// Build the emission configuration, filling image defaults
    pub fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        set(&mut config.csv_version, &self.csv_version);
        set(&mut config.replaces_csv_version, &self.replaces_csv_version);
        set(&mut config.namespace, &self.namespace);
        set(&mut config.image_pull_policy, &self.pull_policy);
        set(&mut config.verbosity, &self.verbosity);
        set(&mut config.operator_version, &self.operator_version);
        set(&mut config.icon_base64, &self.logo_base64);
        if let Some(deploy) = self.deploy_cluster_resources {
            config.deploy_cluster_resources = deploy;
        }
        self.apply_images(&mut config.images);

        config.validate()?;
        Ok(config.with_image_defaults())
    }
}
