//! Group command - emit one resource group

use cdi_operator_core::Config;
use cdi_operator_resources::emit_group;

use super::OutputOptions;
use crate::error::Result;
use crate::output::{emit, Document};

pub fn run(group: &str, config: &Config, options: OutputOptions<'_>) -> Result<()> {
    options.debug(format_args!(
        "Emitting group {} into namespace {}",
        group, config.namespace
    ));

    let objects = emit_group(group, config)?;
    for object in &objects {
        options.debug(object);
    }

    let documents = objects
        .iter()
        .map(Document::from_object)
        .collect::<Result<Vec<_>>>()?;
    emit(&documents, options.format, options.output_dir)
}
