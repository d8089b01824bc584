//! cdi-operator-gen - Generate the CDI operator manifests and OLM bundle

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod args;
mod commands;
mod error;
mod exit_codes;
mod output;

use args::ConfigArgs;
use commands::OutputOptions;
use error::Result;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "cdi-operator-gen")]
#[command(author = "KubeVirt CDI Contributors")]
#[command(version)]
#[command(about = "Generate the CDI operator manifests and its ClusterServiceVersion", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Yaml)]
    output: OutputFormat,

    /// Write one file per object into this directory instead of stdout
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit a resource group
    Group {
        /// Group id (see `groups`)
        #[arg(default_value = "everything")]
        group: String,
    },

    /// Emit the ClusterServiceVersion
    Csv {
        /// Also emit the CDI custom resource definition
        #[arg(long)]
        dump_crds: bool,
    },

    /// Emit the CDI custom resource definition
    Crd,

    /// List resource groups
    Groups,
}

fn run(cli: Cli) -> Result<()> {
    let options = OutputOptions {
        format: cli.output,
        output_dir: cli.output_dir.as_deref(),
        debug: cli.debug,
    };

    match cli.command {
        Commands::Group { group } => {
            let config = cli.config.resolve()?;
            commands::group::run(&group, &config, options)
        }
        Commands::Csv { dump_crds } => {
            let config = cli.config.resolve()?;
            commands::csv::run(&config, dump_crds, options)
        }
        Commands::Crd => commands::crd::run(options),
        Commands::Groups => commands::groups::run(options.format),
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();
    // Keep group names and versions on one line in reports
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().wrap_lines(false).build())
    }));

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}
