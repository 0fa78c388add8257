//! Dependency manifest hygiene
//!
//! Unpinned dependency specs make builds non-reproducible. The detector
//! flags every spec in a root `requirements*.txt` that is not an exact
//! `==` pin, and every loose range (`^`, `~`, `>=`, `*`, `latest`) in a
//! root `package.json`. The fixer converts requirement lower bounds
//! (`>=`) into exact pins, the only rewrite that can be done without
//! resolving versions. Bare names and npm ranges stay flagged for review.

use afo_engine::{Detector, DetectorError, Fixer, FixerError, Workspace, WorkspaceEntry};
use afo_model::{Category, FixOutcome, Issue, Severity};
use afo_policy::Policy;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn is_requirements_file(entry: &WorkspaceEntry) -> bool {
    if entry.is_dir {
        return false;
    }
    entry
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("requirements") && n.ends_with(".txt"))
}

async fn requirements_files(
    workspace: &dyn Workspace,
) -> Result<Vec<PathBuf>, afo_engine::WorkspaceError> {
    let entries = workspace.list(Path::new("")).await?;
    Ok(entries
        .into_iter()
        .filter(is_requirements_file)
        .map(|e| e.path)
        .collect())
}

const PACKAGE_JSON: &str = "package.json";

/// An npm range that does not resolve to exactly one version
fn is_loose_range(spec: &str) -> bool {
    let spec = spec.trim();
    spec.is_empty()
        || spec == "*"
        || spec == "latest"
        || spec.starts_with('^')
        || spec.starts_with('~')
        || spec.contains(">=")
}

async fn loose_npm_ranges(workspace: &dyn Workspace) -> Result<Vec<String>, DetectorError> {
    let path = Path::new(PACKAGE_JSON);
    if !workspace.exists(path).await {
        return Ok(Vec::new());
    }
    let content = workspace.read(path).await?;
    let manifest: Value = serde_json::from_str(&content)
        .map_err(|e| DetectorError::Tool(format!("unparsable package.json: {e}")))?;

    let mut loose = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(deps) = manifest.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, spec) in deps {
            if let Some(range) = spec.as_str() {
                if is_loose_range(range) {
                    loose.push(format!("{name} {range}"));
                }
            }
        }
    }
    Ok(loose)
}

/// A requirement line that participates in pinning checks.
///
/// Blank lines, comments, and pip options (`-r`, `--hash`, ...) are not
/// requirement specs.
fn is_spec(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#') && !line.starts_with('-')
}

/// Flags dependency specs that are not exact pins, across `requirements*.txt`
/// and `package.json`
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyPinDetector;

#[async_trait]
impl Detector for DependencyPinDetector {
    fn category(&self) -> Category {
        Category::Dependency
    }

    async fn scan(&self, workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
        let files = requirements_files(workspace).await?;
        let mut issues = Vec::new();

        for file in files {
            let content = workspace.read(&file).await?;
            let unpinned: Vec<&str> = content
                .lines()
                .filter(|l| is_spec(l) && !l.contains("=="))
                .map(str::trim)
                .collect();
            if unpinned.is_empty() {
                continue;
            }

            issues.push(
                Issue::new(Category::Dependency, Severity::Medium)
                    .with_count(unpinned.len())
                    .with_location(&file)
                    .with_detail(
                        "unpinned",
                        Value::Array(
                            unpinned.iter().map(|s| Value::String((*s).to_string())).collect(),
                        ),
                    ),
            );
        }

        let loose = loose_npm_ranges(workspace).await?;
        if !loose.is_empty() {
            issues.push(
                Issue::new(Category::Dependency, Severity::Medium)
                    .with_count(loose.len())
                    .with_location(Path::new(PACKAGE_JSON))
                    .with_detail(
                        "loose",
                        Value::Array(loose.into_iter().map(Value::String).collect()),
                    ),
            );
        }

        if issues.is_empty() {
            issues.push(Issue::clean(Category::Dependency));
        }
        Ok(issues)
    }
}

/// Converts `>=` lower bounds into exact `==` pins
#[derive(Debug, Default, Clone, Copy)]
pub struct RequirementsPinFixer;

fn pin_line(line: &str) -> Option<String> {
    if !is_spec(line) || line.contains("==") {
        return None;
    }
    // Only the lower-bound form carries a concrete version to pin to
    line.find(">=")
        .map(|idx| format!("{}=={}", &line[..idx], &line[idx + 2..]))
}

#[async_trait]
impl Fixer for RequirementsPinFixer {
    fn category(&self) -> Category {
        Category::Dependency
    }

    async fn apply(
        &self,
        workspace: &dyn Workspace,
        policy: &Policy,
    ) -> Result<FixOutcome, FixerError> {
        let files = requirements_files(workspace).await?;
        let mut changed = Vec::new();

        for file in files {
            if policy.is_excluded(&file) {
                continue;
            }
            let content = workspace.read(&file).await?;
            let mut modified = false;
            let rewritten: Vec<String> = content
                .lines()
                .map(|line| match pin_line(line) {
                    Some(pinned) => {
                        modified = true;
                        pinned
                    }
                    None => line.to_string(),
                })
                .collect();
            if modified {
                let mut text = rewritten.join("\n");
                if content.ends_with('\n') {
                    text.push('\n');
                }
                workspace.write(&file, &text).await?;
                tracing::info!(path = %file.display(), "pinned lower-bound requirements");
                changed.push(file);
            }
        }

        if changed.is_empty() {
            return Ok(FixOutcome::noop(Category::Dependency));
        }
        Ok(FixOutcome::applied(Category::Dependency, changed))
    }
}
