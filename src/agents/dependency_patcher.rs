use crate::error::{OtcbotError, Result};
use crate::repository::{RepositoryHandle, VersionControlClient};
use crate::utils::reporter::Reporter;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifests scanned when no other list is configured, in scan order.
pub const DEFAULT_MANIFESTS: &[&str] = &[
    "requirements.txt",
    "doc/requirements.txt",
    "api-ref/requirements.txt",
    "umn/requirements.txt",
];

const COMMENT_MARKER: char = '#';
const TMP_SUFFIX: &str = "otcbot.tmp";

/// Replace the version constraint of `dependency_name` with `new_version_spec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    pub dependency_name: String,
    pub new_version_spec: String,
}

impl ReplacementRule {
    pub fn new(dependency_name: impl Into<String>, new_version_spec: impl Into<String>) -> Self {
        Self {
            dependency_name: dependency_name.into(),
            new_version_spec: new_version_spec.into(),
        }
    }

    pub fn commit_message(&self) -> String {
        format!(
            "Update {} to {}",
            self.dependency_name, self.new_version_spec
        )
    }
}

/// Manifest paths whose content changed, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: Vec<PathBuf>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// Rewrites a single requirement line at a time.
///
/// The dependency name is matched literally, as the requirement a line
/// declares: only leading whitespace may precede it and it may not run into
/// another `[A-Za-z0-9._-]` character. Mentions elsewhere on the line (markers,
/// URLs, lists) are ignored. Everything from the comment marker on is left
/// alone.
pub struct LinePatcher {
    pattern: Regex,
    replacement: String,
}

impl LinePatcher {
    pub fn new(rule: &ReplacementRule) -> Result<Self> {
        let name = rule.dependency_name.trim();
        if name.is_empty() {
            return Err(OtcbotError::Config(
                "Dependency name cannot be empty".to_string(),
            ));
        }

        // indent, name, constraint, whitespace before the comment
        let pattern = format!(
            r"^(\s*){}((?:[^A-Za-z0-9._-][^#]*?)??)(\s*)$",
            regex::escape(name)
        );
        let pattern = Regex::new(&pattern).map_err(|e| {
            OtcbotError::Config(format!("Invalid dependency name '{}': {}", name, e))
        })?;

        Ok(Self {
            pattern,
            replacement: format!("{}{}", name, rule.new_version_spec),
        })
    }

    /// Returns the rewritten line, or `None` when the line does not declare
    /// the dependency. `line` may carry its line terminator.
    pub fn patch_line(&self, line: &str) -> Option<String> {
        let (body, ending) = split_line_ending(line);
        let (code, comment) = match body.find(COMMENT_MARKER) {
            Some(idx) => body.split_at(idx),
            None => (body, ""),
        };

        if !self.pattern.is_match(code) {
            return None;
        }

        let patched = self.pattern.replacen(code, 1, |caps: &Captures| {
            let trailing = match &caps[3] {
                "" => " ",
                ws => ws,
            };
            format!("{}{}{}", &caps[1], self.replacement, trailing)
        });

        Some(format!("{patched}{comment}{ending}"))
    }

    /// Rewrites every matching line; returns `None` if nothing changed.
    pub fn patch_content(&self, content: &str) -> Option<String> {
        let mut changed = false;
        let mut output = String::with_capacity(content.len() + 16);

        for line in content.split_inclusive('\n') {
            match self.patch_line(line) {
                Some(new_line) if new_line != line => {
                    changed = true;
                    output.push_str(&new_line);
                }
                _ => output.push_str(line),
            }
        }

        changed.then_some(output)
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Applies a [`ReplacementRule`] to the manifests of a checkout and stages
/// every file it changes.
pub struct DependencyPatcher<'a> {
    vcs: &'a dyn VersionControlClient,
    reporter: &'a dyn Reporter,
}

impl<'a> DependencyPatcher<'a> {
    pub fn new(vcs: &'a dyn VersionControlClient, reporter: &'a dyn Reporter) -> Self {
        Self { vcs, reporter }
    }

    /// Missing manifests are skipped. An IO failure aborts the scan; files
    /// rewritten before it keep their new content.
    pub fn patch(
        &self,
        repo: &RepositoryHandle,
        manifest_paths: &[PathBuf],
        rule: &ReplacementRule,
    ) -> Result<ChangeSet> {
        let patcher = LinePatcher::new(rule)?;
        let mut change_set = ChangeSet::new();

        for relative in manifest_paths {
            let path = repo.path().join(relative);
            if !path.is_file() {
                self.reporter
                    .detail(&format!("{} not present, skipping", relative.display()));
                continue;
            }

            let content =
                fs::read_to_string(&path).map_err(|e| OtcbotError::patch_io(&path, e))?;

            let Some(patched) = patcher.patch_content(&content) else {
                self.reporter.detail(&format!(
                    "{} does not reference {}",
                    relative.display(),
                    rule.dependency_name
                ));
                continue;
            };

            write_atomically(&path, &patched)?;
            self.vcs.stage(repo, relative)?;
            self.reporter
                .success(&format!("Updated {}", relative.display()));
            change_set.push(relative.clone());
        }

        Ok(change_set)
    }
}

/// Writes `<path>.otcbot.tmp` and renames it over `path`, so the original is
/// either fully replaced or untouched.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let tmp = tmp_path(path);
    if let Err(e) = fs::write(&tmp, content) {
        let _ = fs::remove_file(&tmp);
        return Err(OtcbotError::patch_io(&tmp, e));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(OtcbotError::patch_io(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}
