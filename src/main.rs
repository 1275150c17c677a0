mod agents;
mod cli;
mod config;
mod error;
mod repository;
mod utils;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use std::process;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::DepUpdate(cmd) => {
            workflow::execute_dep_update(cmd.into(), cli.config.as_deref(), cli.verbose)
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
