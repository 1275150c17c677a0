use crate::agents::{
    BranchResetter, ChangePublisher, DependencyPatcher, PublishOutcome, RepositorySynchronizer,
};
use crate::config::{DepUpdateArgs, FileConfig, RunSettings};
use crate::error::Result;
use crate::repository::{RepositoryFactory, VersionControlClient};
use crate::utils::reporter::{ConsoleReporter, Reporter};
use colored::Colorize;
use jiff::Timestamp;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What a `dep_update` run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub project: String,
    pub dependency: String,
    pub version: String,
    pub checkout_dir: PathBuf,
    pub proposal_branch: String,
    pub changed_files: Vec<PathBuf>,
    pub committed: bool,
    pub commit_id: Option<String>,
    pub pushed: bool,
    pub dry_run: bool,
    pub started_at: String,
}

/// CLI entry point: resolve settings, run against the real `git`, print and
/// optionally persist the summary.
pub fn execute_dep_update(
    args: DepUpdateArgs,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<RunSummary> {
    let file_config = match config_path {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = RunSettings::resolve(args, file_config)?;

    let reporter = ConsoleReporter::new(verbose);
    let vcs = RepositoryFactory::create_git(true);

    println!(
        "{}",
        format!(
            "Proposing {}{} for {}...",
            settings.rule.dependency_name, settings.rule.new_version_spec, settings.project
        )
        .cyan()
        .bold()
    );

    let summary = run_dep_update(&settings, vcs.as_ref(), &reporter)?;
    print_summary(&summary);

    if let Some(report_path) = &settings.report {
        write_report(report_path, &summary)?;
        reporter.detail(&format!("Report written to {}", report_path.display()));
    }

    Ok(summary)
}

/// Synchronize, reset, patch, publish. Each stage only runs once the previous
/// one succeeded; any error ends the run and leaves the checkout as it is.
pub fn run_dep_update(
    settings: &RunSettings,
    vcs: &dyn VersionControlClient,
    reporter: &dyn Reporter,
) -> Result<RunSummary> {
    let started_at = Timestamp::now().to_string();
    let remote = settings.remote.as_str();

    reporter.step("1. Synchronizing repository...");
    let repo = RepositorySynchronizer::new(vcs, reporter, remote).ensure(
        &settings.repo_url,
        &settings.checkout_dir,
        &settings.main_branch.name,
    )?;
    reporter.success(&format!("Checkout ready at {}", repo.path().display()));

    reporter.step("2. Resetting proposal branch...");
    BranchResetter::new(vcs, reporter, remote).reset(
        &repo,
        &settings.main_branch,
        &settings.proposal_branch,
    )?;
    reporter.success(&format!(
        "{} recreated from {}/{}",
        settings.proposal_branch.name, remote, settings.main_branch.name
    ));

    reporter.step("3. Updating manifests...");
    let change_set =
        DependencyPatcher::new(vcs, reporter).patch(&repo, &settings.manifests, &settings.rule)?;

    reporter.step("4. Publishing changes...");
    let outcome = if change_set.is_empty() {
        reporter.warn(&format!(
            "No manifest references {}; nothing to publish",
            settings.rule.dependency_name
        ));
        PublishOutcome::NothingToPublish
    } else if settings.dry_run {
        reporter.warn(&format!(
            "Dry run: {} patched file(s) left uncommitted on {}; nothing pushed",
            change_set.paths().len(),
            settings.proposal_branch.name
        ));
        PublishOutcome::NothingToPublish
    } else {
        ChangePublisher::new(vcs, reporter, remote).publish(
            &repo,
            &change_set,
            &settings.proposal_branch,
            &settings.rule,
            &settings.identity,
        )?
    };

    Ok(RunSummary {
        project: settings.project.clone(),
        dependency: settings.rule.dependency_name.clone(),
        version: settings.rule.new_version_spec.clone(),
        checkout_dir: repo.local_path.clone(),
        proposal_branch: settings.proposal_branch.name.clone(),
        changed_files: change_set.paths().to_vec(),
        committed: outcome.committed(),
        commit_id: outcome.commit_id().map(str::to_string),
        pushed: matches!(outcome, PublishOutcome::Pushed { .. }),
        dry_run: settings.dry_run,
        started_at,
    })
}

fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "Run Summary:".cyan().bold());
    println!(
        "  {} {}{}",
        "Dependency:".white().bold(),
        summary.dependency,
        summary.version.green()
    );
    println!(
        "  {} {}",
        "Branch:".white().bold(),
        summary.proposal_branch.bright_cyan()
    );

    if summary.changed_files.is_empty() {
        println!("  {}", "No files changed".yellow());
    } else {
        println!("  {}", "Changed files:".white().bold());
        for path in &summary.changed_files {
            println!("    • {}", path.display());
        }
    }

    match (&summary.commit_id, summary.pushed) {
        (Some(id), true) => println!("  {} {} (pushed)", "Commit:".white().bold(), id.green()),
        _ if summary.dry_run => println!("  {} skipped (dry run)", "Commit:".white().bold()),
        _ => println!("  {} none", "Commit:".white().bold()),
    }

    println!(
        "\n{}",
        "✨ Dependency update completed successfully!".green().bold()
    );
}
