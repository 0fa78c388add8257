//! Dockerfile hygiene
//!
//! Detection mirrors common image best practices: multi-stage builds, layer
//! caching, and a `.dockerignore` to keep build contexts small. The stock
//! fixer only handles the missing `.dockerignore` case; restructuring a
//! Dockerfile is not something to do unattended.

use afo_engine::{Detector, DetectorError, Fixer, FixerError, Workspace};
use afo_model::{Category, FixOutcome, Issue, Severity};
use afo_policy::Policy;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

const DOCKERFILE: &str = "Dockerfile";
const DOCKERIGNORE: &str = ".dockerignore";

/// Build-context entries written when `.dockerignore` is absent
pub const DEFAULT_DOCKERIGNORE: &str = "\
.git
.gitignore
.dockerignore
.env
node_modules
__pycache__
.pytest_cache
.venv
build
dist
*.egg-info
.vscode
.idea
";

/// Checks a root `Dockerfile` against image best practices
#[derive(Debug, Default, Clone, Copy)]
pub struct DockerfileDetector;

#[async_trait]
impl Detector for DockerfileDetector {
    fn category(&self) -> Category {
        Category::Docker
    }

    async fn scan(&self, workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
        let dockerfile = Path::new(DOCKERFILE);
        if !workspace.exists(dockerfile).await {
            return Ok(vec![Issue::clean(Category::Docker)]);
        }

        let content = workspace.read(dockerfile).await?;
        let multi_stage = content.matches("FROM").count() > 1;
        let layer_caching = content.contains("RUN");
        let has_dockerignore = workspace.exists(Path::new(DOCKERIGNORE)).await;

        let count = [multi_stage, layer_caching, has_dockerignore]
            .iter()
            .filter(|ok| !**ok)
            .count();
        if count == 0 {
            return Ok(vec![Issue::clean(Category::Docker)]);
        }

        Ok(vec![Issue::new(Category::Docker, Severity::Medium)
            .with_count(count)
            .with_location(DOCKERFILE)
            .with_detail("multi_stage", Value::Bool(multi_stage))
            .with_detail("layer_caching", Value::Bool(layer_caching))
            .with_detail("dockerignore", Value::Bool(has_dockerignore))])
    }
}

/// Writes a stock `.dockerignore` next to an existing `Dockerfile`
#[derive(Debug, Default, Clone, Copy)]
pub struct DockerignoreFixer;

#[async_trait]
impl Fixer for DockerignoreFixer {
    fn category(&self) -> Category {
        Category::Docker
    }

    async fn apply(
        &self,
        workspace: &dyn Workspace,
        policy: &Policy,
    ) -> Result<FixOutcome, FixerError> {
        let target = Path::new(DOCKERIGNORE);
        if !workspace.exists(Path::new(DOCKERFILE)).await
            || workspace.exists(target).await
            || policy.is_excluded(target)
        {
            return Ok(FixOutcome::noop(Category::Docker));
        }

        workspace.write(target, DEFAULT_DOCKERIGNORE).await?;
        tracing::info!(path = DOCKERIGNORE, "wrote default build-context ignore file");
        Ok(FixOutcome::applied(
            Category::Docker,
            vec![target.to_path_buf()],
        ))
    }
}
