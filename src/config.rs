use crate::agents::change_publisher::CommitIdentity;
use crate::agents::dependency_patcher::{DEFAULT_MANIFESTS, ReplacementRule};
use crate::error::{OtcbotError, Result};
use crate::repository::BranchSpec;
use crate::utils::path_validator::PathValidator;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_MAIN_BRANCH: &str = "main";
const MAX_BRANCH_LEN: usize = 50;

/// Optional TOML overrides for the ambient defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub remote: Option<String>,
    pub manifests: Option<Vec<String>>,
    pub identity: Option<CommitIdentity>,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OtcbotError::Config(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Raw `dep_update` arguments before validation.
#[derive(Debug, Clone, Default)]
pub struct DepUpdateArgs {
    pub name: String,
    pub repo_url: String,
    pub dependency_name: String,
    pub dependency_version: String,
    pub checkout_dir: Option<PathBuf>,
    pub main_branch: String,
    pub branch: Option<String>,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
}

/// Everything a run needs, validated before any git command is issued.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub project: String,
    pub repo_url: String,
    pub checkout_dir: PathBuf,
    pub main_branch: BranchSpec,
    pub proposal_branch: BranchSpec,
    pub rule: ReplacementRule,
    pub manifests: Vec<PathBuf>,
    pub identity: CommitIdentity,
    pub remote: String,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
}

impl RunSettings {
    pub fn resolve(args: DepUpdateArgs, file: FileConfig) -> Result<Self> {
        let project = args.name.trim().to_string();
        let dependency = require_single_line("dependency name", &args.dependency_name)?;
        let version = require_single_line("dependency version", &args.dependency_version)?;
        let repo_url = validate_repo_url(&args.repo_url)?;

        let checkout_dir = match args.checkout_dir {
            Some(dir) => dir,
            None if !project.is_empty() => PathBuf::from(&project),
            None => {
                return Err(OtcbotError::Config(
                    "Either --checkout_dir or --name must be given".to_string(),
                ));
            }
        };
        let checkout_dir = PathValidator::validate_checkout_dir(checkout_dir)?;

        let main_branch = validate_branch_name(&args.main_branch)?;
        let proposal_branch = match args.branch.as_deref() {
            Some(branch) => validate_branch_name(branch)?,
            None => default_proposal_branch(&dependency),
        };
        if proposal_branch == main_branch {
            return Err(OtcbotError::Config(format!(
                "Proposal branch '{}' must differ from the main branch",
                proposal_branch
            )));
        }

        let remote = match file.remote {
            Some(remote) => validate_branch_name(&remote)
                .map_err(|_| OtcbotError::Config(format!("Invalid remote name '{remote}'")))?,
            None => DEFAULT_REMOTE.to_string(),
        };

        let manifests = match file.manifests {
            Some(list) if list.is_empty() => {
                return Err(OtcbotError::Config(
                    "Manifest list in config file is empty".to_string(),
                ));
            }
            Some(list) => list,
            None => DEFAULT_MANIFESTS.iter().map(|s| s.to_string()).collect(),
        };
        let manifests = manifests
            .iter()
            .map(PathValidator::validate_manifest_path)
            .collect::<Result<Vec<_>>>()?;

        let identity = file.identity.unwrap_or_default();
        if identity.name.trim().is_empty() || !identity.email.contains('@') {
            return Err(OtcbotError::Config(format!(
                "Invalid commit identity '{} <{}>'",
                identity.name, identity.email
            )));
        }

        Ok(Self {
            project,
            repo_url,
            checkout_dir,
            main_branch: BranchSpec::main(main_branch),
            proposal_branch: BranchSpec::proposal(proposal_branch),
            rule: ReplacementRule::new(dependency, version),
            manifests,
            identity,
            remote,
            dry_run: args.dry_run,
            report: args.report,
        })
    }
}

fn require_single_line(what: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OtcbotError::Config(format!("The {what} cannot be empty")));
    }
    if trimmed.contains(['\n', '\r', '#']) {
        return Err(OtcbotError::Config(format!(
            "The {what} '{trimmed}' must be a single requirement token"
        )));
    }
    Ok(trimmed.to_string())
}

/// Accepts http(s)/ssh/git/file URLs, scp-like `user@host:path` and existing
/// local paths.
fn validate_repo_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(OtcbotError::Config("Repository URL is not set".to_string()));
    }
    if trimmed.starts_with('-') || trimmed.contains(char::is_whitespace) {
        return Err(OtcbotError::Config(format!(
            "Invalid repository URL '{trimmed}'"
        )));
    }

    if let Ok(url) = Url::parse(trimmed) {
        return match url.scheme() {
            "https" | "http" | "ssh" | "git" | "file" => Ok(trimmed.to_string()),
            // Windows drive letters parse as a one-letter scheme.
            scheme if scheme.len() == 1 && Path::new(trimmed).exists() => Ok(trimmed.to_string()),
            scheme => Err(OtcbotError::Config(format!(
                "Unsupported repository URL scheme '{scheme}'"
            ))),
        };
    }

    if is_scp_like(trimmed) || Path::new(trimmed).exists() {
        return Ok(trimmed.to_string());
    }

    Err(OtcbotError::Config(format!(
        "Repository URL '{trimmed}' is neither a URL nor an existing path"
    )))
}

fn is_scp_like(value: &str) -> bool {
    match value.split_once(':') {
        Some((host, path)) => {
            !host.is_empty() && !host.contains('/') && !path.is_empty() && host.contains('@')
        }
        None => false,
    }
}

fn validate_branch_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    let invalid = name.is_empty()
        || name.starts_with('-')
        || name.starts_with('/')
        || name.ends_with('/')
        || name.ends_with('.')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.contains("//")
        || name.contains("@{")
        || name.chars().any(|c| {
            c.is_whitespace()
                || c.is_control()
                || matches!(
                    c,
                    '~' | '^' | ':' | '?' | '*' | '[' | '\\' | ';' | '|' | '&' | '$' | '`'
                )
        });

    if invalid {
        return Err(OtcbotError::Config(format!("Invalid branch name '{raw}'")));
    }
    Ok(name.to_string())
}

/// `deps/update-<dependency>`, stable across runs so reruns reuse the branch.
pub fn default_proposal_branch(dependency: &str) -> String {
    let mut branch_name: String = format!("deps/update-{dependency}")
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '/' | '.' => c,
            _ => '-',
        })
        .collect();

    while branch_name.contains("..") {
        branch_name = branch_name.replace("..", ".");
    }

    if branch_name.len() > MAX_BRANCH_LEN {
        branch_name.truncate(MAX_BRANCH_LEN);
    }

    while branch_name.ends_with(['.', '/']) {
        branch_name.pop();
    }

    branch_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::change_publisher::BOT_EMAIL;
    use std::fs;
    use tempfile::tempdir;

    fn args(checkout: &Path) -> DepUpdateArgs {
        DepUpdateArgs {
            name: "docs-project".to_string(),
            repo_url: "https://github.com/opentelekomcloud-docs/docs-project.git".to_string(),
            dependency_name: "otc-sphinx-directives".to_string(),
            dependency_version: ">=0.2.0".to_string(),
            checkout_dir: Some(checkout.to_path_buf()),
            main_branch: "main".to_string(),
            branch: None,
            dry_run: false,
            report: None,
        }
    }

    #[test]
    fn resolves_defaults() {
        let dir = tempdir().unwrap();
        let settings = RunSettings::resolve(args(dir.path()), FileConfig::default()).unwrap();

        assert_eq!(settings.checkout_dir, dir.path().canonicalize().unwrap());
        assert_eq!(settings.main_branch, BranchSpec::main("main"));
        assert_eq!(
            settings.proposal_branch,
            BranchSpec::proposal("deps/update-otc-sphinx-directives")
        );
        assert_eq!(settings.remote, "origin");
        assert_eq!(settings.manifests.len(), 4);
        assert_eq!(settings.manifests[0], PathBuf::from("requirements.txt"));
        assert_eq!(settings.identity.email, BOT_EMAIL);
        assert_eq!(
            settings.rule,
            ReplacementRule::new("otc-sphinx-directives", ">=0.2.0")
        );
    }

    #[test]
    fn checkout_dir_falls_back_to_project_name() {
        let mut raw = args(Path::new("unused"));
        raw.checkout_dir = None;
        let settings = RunSettings::resolve(raw, FileConfig::default()).unwrap();
        assert!(settings.checkout_dir.is_absolute());
        assert!(settings.checkout_dir.ends_with("docs-project"));
    }

    #[test]
    fn missing_work_dir_and_name_is_a_config_error() {
        let mut raw = args(Path::new("unused"));
        raw.checkout_dir = None;
        raw.name = " ".to_string();
        let err = RunSettings::resolve(raw, FileConfig::default()).unwrap_err();
        assert!(matches!(err, OtcbotError::Config(_)));
    }

    #[test]
    fn rejects_missing_or_bogus_urls() {
        let dir = tempdir().unwrap();
        for url in ["", "ftp://example.com/repo", "not a url", "--upload-pack=x"] {
            let mut raw = args(dir.path());
            raw.repo_url = url.to_string();
            assert!(
                RunSettings::resolve(raw, FileConfig::default()).is_err(),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_scp_and_local_urls() {
        let dir = tempdir().unwrap();
        let local = dir.path().to_string_lossy().to_string();
        for url in ["git@github.com:org/repo.git", "ssh://git@host/repo", local.as_str()] {
            let mut raw = args(dir.path());
            raw.repo_url = url.to_string();
            assert!(RunSettings::resolve(raw, FileConfig::default()).is_ok(), "{url}");
        }
    }

    #[test]
    fn rejects_unsafe_branch_names() {
        let dir = tempdir().unwrap();
        for branch in ["-f", "a..b", "has space", "x;rm", "main"] {
            let mut raw = args(dir.path());
            raw.branch = Some(branch.to_string());
            assert!(
                RunSettings::resolve(raw, FileConfig::default()).is_err(),
                "{branch} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_or_multiline_dependency_fields() {
        let dir = tempdir().unwrap();
        let mut raw = args(dir.path());
        raw.dependency_name = "".to_string();
        assert!(RunSettings::resolve(raw, FileConfig::default()).is_err());

        let mut raw = args(dir.path());
        raw.dependency_version = "==1\nevil==2".to_string();
        assert!(RunSettings::resolve(raw, FileConfig::default()).is_err());
    }

    #[test]
    fn default_branch_is_sanitized_and_bounded() {
        assert_eq!(default_proposal_branch("foo"), "deps/update-foo");
        assert_eq!(default_proposal_branch("foo bar~1"), "deps/update-foo-bar-1");
        assert_eq!(default_proposal_branch("a..b."), "deps/update-a.b");
        let long = default_proposal_branch(&"x".repeat(100));
        assert_eq!(long.len(), 50);
    }

    #[test]
    fn file_config_overrides_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("otcbot.toml");
        fs::write(
            &config_path,
            r#"
remote = "upstream"
manifests = ["requirements.txt", "test-requirements.txt"]

[identity]
name = "release-bot"
email = "release-bot@example.com"
"#,
        )
        .unwrap();

        let file = FileConfig::load(&config_path).unwrap();
        let settings = RunSettings::resolve(args(dir.path()), file).unwrap();

        assert_eq!(settings.remote, "upstream");
        assert_eq!(
            settings.manifests,
            vec![
                PathBuf::from("requirements.txt"),
                PathBuf::from("test-requirements.txt")
            ]
        );
        assert_eq!(
            settings.identity,
            CommitIdentity::new("release-bot", "release-bot@example.com")
        );
    }

    #[test]
    fn file_config_rejects_escaping_manifests_and_unknown_keys() {
        let dir = tempdir().unwrap();
        let escaping = FileConfig {
            manifests: Some(vec!["../outside.txt".to_string()]),
            ..FileConfig::default()
        };
        assert!(RunSettings::resolve(args(dir.path()), escaping).is_err());

        let config_path = dir.path().join("bad.toml");
        fs::write(&config_path, "unknown = 1\n").unwrap();
        assert!(matches!(
            FileConfig::load(&config_path),
            Err(OtcbotError::Toml(_))
        ));
    }
}
