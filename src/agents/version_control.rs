use crate::agents::change_publisher::CommitIdentity;
use crate::error::{OtcbotError, Result};
use crate::repository::{RepositoryHandle, VersionControlClient};
use crate::utils::path_validator::PathValidator;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;

/// VersionControlClient that drives the `git` executable.
pub struct GitCli {
    show_progress: bool,
}

impl GitCli {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    fn run_git(&self, dir: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
        Command::new("git")
            .current_dir(dir)
            .args(args)
            .envs(envs.iter().copied())
            .output()
            .map_err(|e| {
                OtcbotError::GitOperation(format!(
                    "Failed to execute git command '{}': {e}",
                    args.join(" ")
                ))
            })
    }

    fn run_checked(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        let output = self.run_git(dir, args, &[])?;
        Self::ensure_success(&output, &format!("git {}", args.join(" ")))?;
        Ok(output)
    }

    /// Clone, fetch and push can block on the network; show a spinner meanwhile.
    fn run_network(&self, dir: &Path, args: &[&str], message: String) -> Result<()> {
        let spinner = self.spinner(message);
        let result = self.run_checked(dir, args);
        spinner.finish_and_clear();
        result.map(|_| ())
    }

    fn spinner(&self, message: String) -> ProgressBar {
        let pb = if self.show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    fn ensure_success(output: &Output, command: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        Err(OtcbotError::GitOperation(format!(
            "{} failed: {}",
            command,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }

    fn repo_dir(repo: &RepositoryHandle) -> Result<&Path> {
        let path = repo.path();
        Self::validate_git_path(path)?;
        Ok(path)
    }

    fn validate_git_path(path: &Path) -> Result<()> {
        let dangerous = [';', '|', '&', '$', '`', '\n', '\r'];
        let path_str = path.to_string_lossy();
        if let Some(ch) = dangerous.iter().find(|c| path_str.contains(**c)) {
            return Err(OtcbotError::GitOperation(format!(
                "Path contains dangerous character: '{}'",
                ch
            )));
        }

        if !path.is_absolute() {
            return Err(OtcbotError::GitOperation(
                "Only absolute paths are allowed for Git operations".to_string(),
            ));
        }

        Ok(())
    }
}

impl VersionControlClient for GitCli {
    fn is_checkout(&self, path: &Path) -> bool {
        path.join(".git").exists()
    }

    fn clone_repository(&self, remote_url: &str, path: &Path, branch: &str) -> Result<()> {
        Self::validate_git_path(path)?;
        let parent = path.parent().ok_or_else(|| {
            OtcbotError::GitOperation(format!("Cannot clone into '{}'", path.display()))
        })?;
        std::fs::create_dir_all(parent)?;

        let target = path.to_string_lossy();
        self.run_network(
            parent,
            &["clone", "--branch", branch, "--", remote_url, target.as_ref()],
            format!("Cloning {remote_url}"),
        )
    }

    fn fetch(&self, repo: &RepositoryHandle, remote: &str) -> Result<()> {
        let dir = Self::repo_dir(repo)?;
        self.run_network(
            dir,
            &["fetch", "--prune", remote],
            format!("Fetching {remote}"),
        )
    }

    fn checkout(&self, repo: &RepositoryHandle, branch: &str, force: bool) -> Result<()> {
        let dir = Self::repo_dir(repo)?;
        if force {
            self.run_checked(dir, &["checkout", "--force", branch, "--"])?;
        } else {
            self.run_checked(dir, &["checkout", branch, "--"])?;
        }
        Ok(())
    }

    fn reset_hard(&self, repo: &RepositoryHandle, target: &str) -> Result<()> {
        let dir = Self::repo_dir(repo)?;
        self.run_checked(dir, &["reset", "--hard", target])?;
        Ok(())
    }

    fn branch_exists(&self, repo: &RepositoryHandle, branch: &str) -> Result<bool> {
        let dir = Self::repo_dir(repo)?;
        let reference = format!("refs/heads/{branch}");
        let args = ["rev-parse", "--verify", "--quiet", reference.as_str()];
        let output = self.run_git(dir, &args, &[])?;
        // --quiet exits 1 for a missing ref; anything else is a real failure
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => {
                Self::ensure_success(&output, &format!("git {}", args.join(" ")))?;
                Err(OtcbotError::GitOperation(format!(
                    "git {} was terminated",
                    args.join(" ")
                )))
            }
        }
    }

    fn delete_branch(&self, repo: &RepositoryHandle, branch: &str) -> Result<()> {
        let dir = Self::repo_dir(repo)?;
        self.run_checked(dir, &["branch", "-D", branch])?;
        Ok(())
    }

    fn create_branch(&self, repo: &RepositoryHandle, branch: &str) -> Result<()> {
        let dir = Self::repo_dir(repo)?;
        self.run_checked(dir, &["branch", branch])?;
        Ok(())
    }

    fn stage(&self, repo: &RepositoryHandle, path: &Path) -> Result<()> {
        let dir = Self::repo_dir(repo)?;
        PathValidator::validate_file_path(dir.join(path), dir).map_err(|err| {
            OtcbotError::GitOperation(format!("Refusing to stage unsafe path: {err}"))
        })?;

        let relative = path.to_string_lossy();
        self.run_checked(dir, &["add", "--", &relative])?;
        Ok(())
    }

    fn commit(
        &self,
        repo: &RepositoryHandle,
        message: &str,
        identity: &CommitIdentity,
    ) -> Result<String> {
        let dir = Self::repo_dir(repo)?;
        let envs = [
            ("GIT_AUTHOR_NAME", identity.name.as_str()),
            ("GIT_AUTHOR_EMAIL", identity.email.as_str()),
            ("GIT_COMMITTER_NAME", identity.name.as_str()),
            ("GIT_COMMITTER_EMAIL", identity.email.as_str()),
        ];
        let output = self.run_git(dir, &["commit", "-m", message], &envs)?;
        Self::ensure_success(&output, "git commit")?;
        self.resolve(repo, "HEAD")
    }

    fn push(&self, repo: &RepositoryHandle, remote: &str, branch: &str) -> Result<()> {
        let dir = Self::repo_dir(repo)?;
        self.run_network(
            dir,
            &["push", "--force-with-lease", remote, branch],
            format!("Pushing {branch} to {remote}"),
        )
    }

    fn resolve(&self, repo: &RepositoryHandle, revision: &str) -> Result<String> {
        let dir = Self::repo_dir(repo)?;
        let spec = format!("{revision}^{{commit}}");
        let output = self.run_checked(dir, &["rev-parse", "--verify", &spec])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Throw-away git repositories for tests that need a real `git`.

    use std::fs;
    use std::path::{Path, PathBuf};
    use std::process::Command;

    pub fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }

    /// Runs git with a fixed test identity and returns trimmed stdout.
    pub fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .current_dir(dir)
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .env("GIT_AUTHOR_NAME", "Fixture")
            .env("GIT_AUTHOR_EMAIL", "fixture@example.com")
            .env("GIT_COMMITTER_NAME", "Fixture")
            .env("GIT_COMMITTER_EMAIL", "fixture@example.com")
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// A bare remote plus the working repository used to author its history.
    pub struct Upstream {
        pub bare: PathBuf,
        pub work: PathBuf,
    }

    impl Upstream {
        /// Bare repository with `main` holding the given files.
        pub fn create(root: &Path, files: &[(&str, &str)]) -> Self {
            let work = root.join("upstream");
            fs::create_dir_all(&work).unwrap();
            git(&work, &["init", "--quiet"]);
            git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
            write_files(&work, files);
            git(&work, &["add", "--all"]);
            git(&work, &["commit", "--quiet", "-m", "Initial commit"]);

            let bare = root.join("remote.git");
            git(
                root,
                &[
                    "clone",
                    "--quiet",
                    "--bare",
                    &work.to_string_lossy(),
                    &bare.to_string_lossy(),
                ],
            );
            git(
                &work,
                &["remote", "add", "origin", &bare.to_string_lossy()],
            );
            Self { bare, work }
        }

        pub fn url(&self) -> String {
            self.bare.to_string_lossy().to_string()
        }

        /// Adds a commit to the remote `main` and returns its id.
        pub fn push_commit(&self, files: &[(&str, &str)], message: &str) -> String {
            write_files(&self.work, files);
            git(&self.work, &["add", "--all"]);
            git(&self.work, &["commit", "--quiet", "-m", message]);
            git(&self.work, &["push", "--quiet", "origin", "main"]);
            git(&self.work, &["rev-parse", "HEAD"])
        }

        pub fn remote_ref(&self, branch: &str) -> Option<String> {
            let output = Command::new("git")
                .current_dir(&self.bare)
                .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
                .output()
                .unwrap();
            output
                .status
                .success()
                .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
    }

    pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
    }
}
