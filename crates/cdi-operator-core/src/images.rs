//! Container image catalog
//!
//! One image reference per CDI component. Empty references are replaced by
//! the component's default image name when defaults are filled.

use serde::{Deserialize, Serialize};

/// Default controller image
pub const CONTROLLER_IMAGE_DEFAULT: &str = "cdi-controller";
/// Default importer image
pub const IMPORTER_IMAGE_DEFAULT: &str = "cdi-importer";
/// Default cloner image
pub const CLONER_IMAGE_DEFAULT: &str = "cdi-cloner";
/// Default API server image
pub const APISERVER_IMAGE_DEFAULT: &str = "cdi-apiserver";
/// Default upload proxy image
pub const UPLOAD_PROXY_IMAGE_DEFAULT: &str = "cdi-uploadproxy";
/// Default upload server image
pub const UPLOAD_SERVER_IMAGE_DEFAULT: &str = "cdi-uploadserver";
/// Default operator image
pub const OPERATOR_IMAGE_DEFAULT: &str = "cdi-operator";

/// Images provided to the CDI operator
///
/// The upload proxy/server keys keep the historical `uploda*` spelling in
/// their serialized form; existing image-set documents use those keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSet {
    #[serde(default)]
    pub controller_image: String,

    #[serde(default)]
    pub importer_image: String,

    #[serde(default)]
    pub cloner_image: String,

    #[serde(default, rename = "apiServerImage")]
    pub api_server_image: String,

    #[serde(default, rename = "uplodaProxyImage", alias = "uploadProxyImage")]
    pub upload_proxy_image: String,

    #[serde(default, rename = "uplodaServerImage", alias = "uploadServerImage")]
    pub upload_server_image: String,

    #[serde(default)]
    pub operator_image: String,
}

impl ImageSet {
    /// Return a copy with every empty reference replaced by its default
    ///
    /// Applying this twice yields the same value as applying it once.
    pub fn fill_defaults(mut self) -> Self {
        fill(&mut self.controller_image, CONTROLLER_IMAGE_DEFAULT);
        fill(&mut self.importer_image, IMPORTER_IMAGE_DEFAULT);
        fill(&mut self.cloner_image, CLONER_IMAGE_DEFAULT);
        fill(&mut self.api_server_image, APISERVER_IMAGE_DEFAULT);
        fill(&mut self.upload_proxy_image, UPLOAD_PROXY_IMAGE_DEFAULT);
        fill(&mut self.upload_server_image, UPLOAD_SERVER_IMAGE_DEFAULT);
        fill(&mut self.operator_image, OPERATOR_IMAGE_DEFAULT);
        self
    }

    /// Check whether every image reference is set
    pub fn is_filled(&self) -> bool {
        self.references().iter().all(|(_, image)| !image.is_empty())
    }

    /// Image references paired with their component role, in catalog order
    pub fn references(&self) -> [(ImageRole, &str); 7] {
        [
            (ImageRole::Controller, self.controller_image.as_str()),
            (ImageRole::Importer, self.importer_image.as_str()),
            (ImageRole::Cloner, self.cloner_image.as_str()),
            (ImageRole::ApiServer, self.api_server_image.as_str()),
            (ImageRole::UploadProxy, self.upload_proxy_image.as_str()),
            (ImageRole::UploadServer, self.upload_server_image.as_str()),
            (ImageRole::Operator, self.operator_image.as_str()),
        ]
    }
}

fn fill(image: &mut String, default: &str) {
    if image.is_empty() {
        *image = default.to_string();
    }
}

/// Recognized container image roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Controller,
    Importer,
    Cloner,
    ApiServer,
    UploadProxy,
    UploadServer,
    Operator,
}

impl ImageRole {
    /// Default image name for this role
    pub fn default_image(self) -> &'static str {
        match self {
            Self::Controller => CONTROLLER_IMAGE_DEFAULT,
            Self::Importer => IMPORTER_IMAGE_DEFAULT,
            Self::Cloner => CLONER_IMAGE_DEFAULT,
            Self::ApiServer => APISERVER_IMAGE_DEFAULT,
            Self::UploadProxy => UPLOAD_PROXY_IMAGE_DEFAULT,
            Self::UploadServer => UPLOAD_SERVER_IMAGE_DEFAULT,
            Self::Operator => OPERATOR_IMAGE_DEFAULT,
        }
    }
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Controller => write!(f, "controller"),
            Self::Importer => write!(f, "importer"),
            Self::Cloner => write!(f, "cloner"),
            Self::ApiServer => write!(f, "apiserver"),
            Self::UploadProxy => write!(f, "uploadproxy"),
            Self::UploadServer => write!(f, "uploadserver"),
            Self::Operator => write!(f, "operator"),
        }
    }
}
