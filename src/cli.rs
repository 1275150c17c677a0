use crate::config::{DEFAULT_MAIN_BRANCH, DepUpdateArgs};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "otcbot",
    about = "OTC Bot - automation helpers for documentation repositories",
    version,
    author
)]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file overriding the remote name, manifest list or bot identity
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Propose a dependency version bump on a dedicated branch
    #[command(name = "dep_update")]
    DepUpdate(DepUpdateCommand),
}

#[derive(Args, Debug)]
pub struct DepUpdateCommand {
    /// Project name
    #[arg(long)]
    pub name: String,

    /// Project git repository URL
    #[arg(long = "repo-url")]
    pub repo_url: String,

    /// Dependency package
    #[arg(long = "dependency-name")]
    pub dependency_name: String,

    /// New dependency version (requirements.txt syntax, e.g. ">=2.0.0")
    #[arg(long = "dependency-version", allow_hyphen_values = true)]
    pub dependency_version: String,

    /// Checkout location (defaults to the project name)
    #[arg(long = "checkout_dir", value_name = "PATH")]
    pub checkout_dir: Option<PathBuf>,

    /// Main/master branch name
    #[arg(long = "main-branch", default_value = DEFAULT_MAIN_BRANCH)]
    pub main_branch: String,

    /// Target (PR) branch name (defaults to deps/update-<dependency>)
    #[arg(long)]
    pub branch: Option<String>,

    /// Patch the manifests but skip the commit and the push
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl From<DepUpdateCommand> for DepUpdateArgs {
    fn from(cmd: DepUpdateCommand) -> Self {
        DepUpdateArgs {
            name: cmd.name,
            repo_url: cmd.repo_url,
            dependency_name: cmd.dependency_name,
            dependency_version: cmd.dependency_version,
            checkout_dir: cmd.checkout_dir,
            main_branch: cmd.main_branch,
            branch: cmd.branch,
            dry_run: cmd.dry_run,
            report: cmd.report,
        }
    }
}
