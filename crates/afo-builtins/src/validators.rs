//! Stock safety validators
//!
//! Run on the fully fixed tree during finalization. Each check passes
//! vacuously when the file it guards is absent, matching the rule that an
//! unavailable check must not block publication.

use afo_engine::{Validator, Workspace};
use afo_model::ValidatorOutcome;
use async_trait::async_trait;
use std::path::Path;

const COMPOSE_FILES: [&str; 2] = ["docker-compose.yml", "docker-compose.yaml"];

/// Verifies the compose file still parses as YAML with a `services` map
#[derive(Debug, Default, Clone, Copy)]
pub struct ComposeSyntaxValidator;

#[async_trait]
impl Validator for ComposeSyntaxValidator {
    fn name(&self) -> &str {
        "compose-syntax"
    }

    async fn check(&self, workspace: &dyn Workspace) -> ValidatorOutcome {
        let name = self.name().to_string();
        for file in COMPOSE_FILES {
            let path = Path::new(file);
            if !workspace.exists(path).await {
                continue;
            }
            let content = match workspace.read(path).await {
                Ok(content) => content,
                Err(e) => return ValidatorOutcome::fail(name, e.to_string()),
            };
            return match serde_yaml::from_str::<serde_yaml::Value>(&content) {
                Ok(doc) if doc.get("services").is_some_and(|s| s.is_mapping()) => {
                    ValidatorOutcome::pass(name, format!("{file} parses"))
                }
                Ok(_) => ValidatorOutcome::fail(name, format!("{file} has no services map")),
                Err(e) => ValidatorOutcome::fail(name, format!("{file}: {e}")),
            };
        }
        ValidatorOutcome::pass(name, "no compose file present")
    }
}

/// Verifies root `*.json` files still parse
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSyntaxValidator;

#[async_trait]
impl Validator for JsonSyntaxValidator {
    fn name(&self) -> &str {
        "json-syntax"
    }

    async fn check(&self, workspace: &dyn Workspace) -> ValidatorOutcome {
        let name = self.name().to_string();
        let entries = match workspace.list(Path::new("")).await {
            Ok(entries) => entries,
            Err(e) => return ValidatorOutcome::fail(name, e.to_string()),
        };

        let mut checked = 0usize;
        for entry in entries {
            if entry.is_dir || entry.path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let content = match workspace.read(&entry.path).await {
                Ok(content) => content,
                Err(e) => return ValidatorOutcome::fail(name, e.to_string()),
            };
            if let Err(e) = serde_json::from_str::<serde_json::Value>(&content) {
                return ValidatorOutcome::fail(
                    name,
                    format!("{}: {e}", entry.path.display()),
                );
            }
            checked += 1;
        }
        ValidatorOutcome::pass(name, format!("{checked} json file(s) parse"))
    }
}
