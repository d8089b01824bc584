//! Document rendering and writing
//!
//! Every value is first converted to a `serde_json::Value`. This resolves
//! the raw JSON install strategy of the ClusterServiceVersion into a plain
//! tree, which YAML output needs.

use cdi_operator_resources::{ClusterServiceVersion, ResourceObject};
use clap::ValueEnum;
use console::style;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{CliError, Result};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Multi-document YAML separated by `---`
    #[default]
    Yaml,
    /// A JSON array (one file per object with --output-dir)
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}

/// One rendered object and the file stem it is written under
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub stem: String,
    pub value: serde_json::Value,
}

impl Document {
    pub fn new(stem: impl Into<String>, value: &impl Serialize) -> Result<Self> {
        Ok(Self {
            stem: stem.into(),
            value: serde_json::to_value(value).map_err(CliError::output)?,
        })
    }

    pub fn from_object(object: &ResourceObject) -> Result<Self> {
        Self::new(object.file_stem(), object)
    }

    pub fn from_csv(csv: &ClusterServiceVersion) -> Result<Self> {
        let name = csv.metadata.name.as_deref().unwrap_or_default();
        Self::new(format!("clusterserviceversion-{}", name), csv)
    }

    pub fn from_crd(crd: &CustomResourceDefinition) -> Result<Self> {
        let name = crd.metadata.name.as_deref().unwrap_or_default();
        Self::new(format!("customresourcedefinition-{}", name), crd)
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Yaml => serde_yaml::to_string(&self.value).map_err(CliError::output),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&self.value).map_err(CliError::output)
            }
        }
    }
}

/// Render documents as one stream
pub fn render_stream(documents: &[Document], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            let mut out = String::new();
            for document in documents {
                out.push_str("---\n");
                out.push_str(&document.render(format)?);
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let values: Vec<_> = documents.iter().map(|d| &d.value).collect();
            let mut out = serde_json::to_string_pretty(&values).map_err(CliError::output)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Write documents to stdout, or one file each under `output_dir`
pub fn emit(documents: &[Document], format: OutputFormat, output_dir: Option<&Path>) -> Result<()> {
    let Some(dir) = output_dir else {
        print!("{}", render_stream(documents, format)?);
        return Ok(());
    };

    fs::create_dir_all(dir)?;
    for document in documents {
        let path = dir.join(format!("{}.{}", document.stem, format.extension()));
        let mut content = document.render(format)?;
        if !content.ends_with('\n') {
            content.push('\n');
        }
        fs::write(&path, content)?;
        println!("{} {}", style("wrote").green(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(stem: &str, value: serde_json::Value) -> Document {
        Document {
            stem: stem.to_string(),
            value,
        }
    }

    #[test]
    fn test_yaml_stream_separates_documents() {
        let docs = [doc("a", json!({"kind": "A"})), doc("b", json!({"kind": "B"}))];
        let out = render_stream(&docs, OutputFormat::Yaml).unwrap();
        assert_eq!(out, "---\nkind: A\n---\nkind: B\n");
    }

    #[test]
    fn test_json_stream_is_array() {
        let docs = [doc("a", json!({"kind": "A"}))];
        let out = render_stream(&docs, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!([{"kind": "A"}]));
    }

    #[test]
    fn test_output_dir_writes_one_file_per_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let docs = [doc("configmap-leader", json!({"kind": "ConfigMap"}))];
        emit(&docs, OutputFormat::Yaml, Some(dir.path())).unwrap();

        let written = fs::read_to_string(dir.path().join("configmap-leader.yaml")).unwrap();
        assert_eq!(written, "kind: ConfigMap\n");
    }
}
