mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::{run_expand, run_list, run_peek, run_read};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Expand(args) => {
            run_expand(args)?;
        }
        Commands::List(args) => {
            run_list(args)?;
        }
        Commands::Peek(args) => {
            run_peek(args)?;
        }
        Commands::Read(args) => {
            run_read(args)?;
        }
    }

    Ok(())
}
