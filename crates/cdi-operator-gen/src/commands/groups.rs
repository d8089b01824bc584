//! Groups command - list resource groups

use cdi_operator_resources::groups::groups;
use console::style;

use crate::error::{CliError, Result};
use crate::output::OutputFormat;

pub fn run(format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let ids: Vec<_> = groups().iter().map(|g| g.id()).collect();
        let json = serde_json::to_string_pretty(&ids).map_err(CliError::output)?;
        println!("{}", json);
        return Ok(());
    }

    for group in groups() {
        if group.is_aggregate() {
            println!("{} {}", group.id(), style("(all groups)").dim());
        } else {
            println!("{}", group.id());
        }
    }
    Ok(())
}
