//! Compose file hygiene
//!
//! The detector flags missing healthchecks, missing resource limits, and
//! hardcoded credentials in a root compose file; hardcoded credentials raise
//! the severity to high. The fixer adds a stock healthcheck to every service
//! that declares an image but no healthcheck, preserving the rest of the
//! document through a parse/serialize round trip.

use afo_engine::{Detector, DetectorError, Fixer, FixerError, Workspace};
use afo_model::{Category, FixOutcome, Issue, Severity};
use afo_policy::Policy;
use async_trait::async_trait;
use serde_yaml::{Mapping, Value};
use std::path::Path;

const COMPOSE_FILES: [&str; 2] = ["docker-compose.yml", "docker-compose.yaml"];

const PASSWORD_MARKERS: [&str; 3] = ["password:", "MYSQL_ROOT_PASSWORD", "POSTGRES_PASSWORD"];

#[inline]
fn json(flag: bool) -> serde_json::Value {
    serde_json::Value::Bool(flag)
}

async fn compose_path(workspace: &dyn Workspace) -> Option<&'static Path> {
    for name in COMPOSE_FILES {
        let path = Path::new(name);
        if workspace.exists(path).await {
            return Some(path);
        }
    }
    None
}

/// Checks a root compose file for healthchecks, limits, and credentials
#[derive(Debug, Default, Clone, Copy)]
pub struct ComposeDetector;

#[async_trait]
impl Detector for ComposeDetector {
    fn category(&self) -> Category {
        Category::Config
    }

    async fn scan(&self, workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
        let Some(path) = compose_path(workspace).await else {
            return Ok(vec![Issue::clean(Category::Config)]);
        };

        let content = workspace.read(path).await?;
        let missing_healthcheck = !content.contains("healthcheck");
        let missing_resource_limits = !content.contains("deploy");
        let hardcoded_passwords = PASSWORD_MARKERS.iter().any(|m| content.contains(m));

        let count = [missing_healthcheck, missing_resource_limits, hardcoded_passwords]
            .iter()
            .filter(|flagged| **flagged)
            .count();
        if count == 0 {
            return Ok(vec![Issue::clean(Category::Config)]);
        }

        let severity = if hardcoded_passwords {
            Severity::High
        } else {
            Severity::Medium
        };
        Ok(vec![Issue::new(Category::Config, severity)
            .with_count(count)
            .with_location(path)
            .with_detail("missing_healthcheck", json(missing_healthcheck))
            .with_detail("missing_resource_limits", json(missing_resource_limits))
            .with_detail("hardcoded_passwords", json(hardcoded_passwords))])
    }
}

/// Adds a stock healthcheck to image-based services that lack one
#[derive(Debug, Default, Clone, Copy)]
pub struct ComposeHealthcheckFixer;

fn default_healthcheck() -> Value {
    let mut m = Mapping::new();
    m.insert(
        Value::from("test"),
        Value::Sequence(vec![
            Value::from("CMD"),
            Value::from("curl"),
            Value::from("-f"),
            Value::from("http://localhost/ || exit 1"),
        ]),
    );
    m.insert(Value::from("interval"), Value::from("30s"));
    m.insert(Value::from("timeout"), Value::from("10s"));
    m.insert(Value::from("retries"), Value::from(3));
    m.insert(Value::from("start_period"), Value::from("40s"));
    Value::Mapping(m)
}

#[async_trait]
impl Fixer for ComposeHealthcheckFixer {
    fn category(&self) -> Category {
        Category::Config
    }

    async fn apply(
        &self,
        workspace: &dyn Workspace,
        policy: &Policy,
    ) -> Result<FixOutcome, FixerError> {
        let Some(path) = compose_path(workspace).await else {
            return Ok(FixOutcome::noop(Category::Config));
        };
        if policy.is_excluded(path) {
            return Ok(FixOutcome::noop(Category::Config));
        }

        let content = workspace.read(path).await?;
        let mut doc: Value = serde_yaml::from_str(&content)
            .map_err(|e| FixerError::Tool(format!("unparsable compose file: {e}")))?;

        let Some(services) = doc
            .get_mut("services")
            .and_then(Value::as_mapping_mut)
        else {
            return Ok(FixOutcome::noop(Category::Config));
        };

        let mut modified = false;
        for (name, service) in services.iter_mut() {
            let Some(service) = service.as_mapping_mut() else {
                continue;
            };
            let has_image = service.get("image").is_some_and(|v| !v.is_null());
            if has_image && !service.contains_key("healthcheck") {
                service.insert(Value::from("healthcheck"), default_healthcheck());
                tracing::debug!(service = ?name, "added stock healthcheck");
                modified = true;
            }
        }
        if !modified {
            return Ok(FixOutcome::noop(Category::Config));
        }

        let rendered = serde_yaml::to_string(&doc)
            .map_err(|e| FixerError::Tool(format!("compose serialization failed: {e}")))?;
        workspace.write(path, &rendered).await?;
        Ok(FixOutcome::applied(Category::Config, vec![path.to_path_buf()]))
    }
}
