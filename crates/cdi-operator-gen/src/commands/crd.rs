//! Crd command - emit the CDI custom resource definition

use cdi_operator_resources::emit_crd;

use super::OutputOptions;
use crate::error::Result;
use crate::output::{emit, Document};

pub fn run(options: OutputOptions<'_>) -> Result<()> {
    let crd = emit_crd()?;
    options.debug(format_args!(
        "Emitting CRD with {} served version(s)",
        crd.spec.versions.len()
    ));
    emit(&[Document::from_crd(&crd)?], options.format, options.output_dir)
}
