//! `smb` - command-line tools for sort-merge bucketed datasets.

use anyhow::Result;
use clap::Parser;

use smb_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    smb_core::observability::init_logging_with_default(cli.log_format, "warn");
    tracing::debug!(log_format = %cli.log_format, "logging initialized");
    let config = cli.config();

    match cli.command {
        Commands::Inspect(args) => smb_cli::commands::inspect::execute(&args, &config),
        Commands::Check(args) => smb_cli::commands::check::execute(&args, &config),
        Commands::Plan(args) => smb_cli::commands::plan::execute(&args, &config),
        Commands::Assign(args) => smb_cli::commands::assign::execute(&args, &config),
        Commands::New(args) => smb_cli::commands::new::execute(&args, &config),
    }
}
