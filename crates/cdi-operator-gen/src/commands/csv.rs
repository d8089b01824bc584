//! Csv command - emit the ClusterServiceVersion

use cdi_operator_core::Config;
use cdi_operator_resources::{emit_bundle, emit_crd};

use super::OutputOptions;
use crate::error::Result;
use crate::output::{emit, Document};

pub fn run(config: &Config, dump_crds: bool, options: OutputOptions<'_>) -> Result<()> {
    options.debug(format_args!(
        "Assembling ClusterServiceVersion {} (replaces: {})",
        config.csv_version,
        if config.replaces_csv_version.is_empty() {
            "none"
        } else {
            config.replaces_csv_version.as_str()
        }
    ));

    let csv = emit_bundle(config)?;
    let mut documents = vec![Document::from_csv(&csv)?];
    if dump_crds {
        documents.push(Document::from_crd(&emit_crd()?)?);
    }

    emit(&documents, options.format, options.output_dir)
}
