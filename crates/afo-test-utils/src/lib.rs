//! Testing utilities for the AFO workspace
//!
//! Scripted capabilities, recording collaborators, and workspace fixtures.

#![allow(missing_docs)]

use afo_engine::{
    ChangePublisher, Detector, DetectorError, Fixer, FixerError, FsWorkspace, NotificationSink,
    PublishError, PublishReceipt, Validator, Workspace,
};
use afo_model::{Category, ChangeSet, FixOutcome, Issue, RunSummary, ValidatorOutcome};
use afo_policy::{CategoryRule, Policy, PolicyConfig};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Detector that returns a fixed issue list
pub struct ScriptedDetector {
    pub category: Category,
    pub issues: Vec<Issue>,
    pub calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(category: Category, issues: Vec<Issue>) -> Self {
        Self {
            category,
            issues,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    fn category(&self) -> Category {
        self.category
    }

    async fn scan(&self, _workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.issues.clone())
    }
}

/// Detector whose results change between runs (detect, then clean after fix).
///
/// First scan returns the scripted issues; every later scan reports clean.
pub struct OnceDetector {
    pub category: Category,
    pub issues: Vec<Issue>,
    scans: AtomicUsize,
}

impl OnceDetector {
    pub fn new(category: Category, issues: Vec<Issue>) -> Self {
        Self {
            category,
            issues,
            scans: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Detector for OnceDetector {
    fn category(&self) -> Category {
        self.category
    }

    async fn scan(&self, _workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
        if self.scans.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(self.issues.clone())
        } else {
            Ok(vec![Issue::clean(self.category)])
        }
    }
}

/// Detector that finds issues once, then errors on every later scan.
///
/// Models a tool that works during detection but falls over when the
/// orchestrator re-runs it after fixing.
pub struct DegradingDetector {
    pub category: Category,
    pub issues: Vec<Issue>,
    scans: AtomicUsize,
}

impl DegradingDetector {
    pub fn new(category: Category, issues: Vec<Issue>) -> Self {
        Self {
            category,
            issues,
            scans: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Detector for DegradingDetector {
    fn category(&self) -> Category {
        self.category
    }

    async fn scan(&self, _workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
        if self.scans.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(self.issues.clone())
        } else {
            Err(DetectorError::Tool("scanner exited 2".to_string()))
        }
    }
}

/// Fixer that returns a fixed outcome, optionally writing a file first
pub struct ScriptedFixer {
    pub outcome: FixOutcome,
    pub write: Option<(PathBuf, String)>,
}

impl ScriptedFixer {
    pub fn new(outcome: FixOutcome) -> Self {
        Self {
            outcome,
            write: None,
        }
    }

    pub fn with_write(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.write = Some((path.into(), contents.into()));
        self
    }
}

#[async_trait]
impl Fixer for ScriptedFixer {
    fn category(&self) -> Category {
        self.outcome.category
    }

    async fn apply(
        &self,
        workspace: &dyn Workspace,
        _policy: &Policy,
    ) -> Result<FixOutcome, FixerError> {
        if let Some((path, contents)) = &self.write {
            workspace.write(path, contents).await?;
        }
        Ok(self.outcome.clone())
    }
}

/// Validator with a fixed verdict
pub struct ScriptedValidator {
    pub name: String,
    pub outcome: ValidatorOutcome,
}

impl ScriptedValidator {
    pub fn passing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: ValidatorOutcome::pass(name, "ok"),
        }
    }

    pub fn failing(name: &str, diagnostic: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: ValidatorOutcome::fail(name, diagnostic),
        }
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, _workspace: &dyn Workspace) -> ValidatorOutcome {
        self.outcome.clone()
    }
}

/// Publisher that records every change set it receives
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<ChangeSet>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl ChangePublisher for RecordingPublisher {
    async fn publish(&self, changeset: &ChangeSet) -> Result<PublishReceipt, PublishError> {
        let receipt = PublishReceipt::new(format!("test/{}", changeset.id));
        self.published.lock().unwrap().push(changeset.clone());
        Ok(receipt)
    }
}

/// Publisher that always refuses
pub struct FailingPublisher(pub String);

#[async_trait]
impl ChangePublisher for FailingPublisher {
    async fn publish(&self, _changeset: &ChangeSet) -> Result<PublishReceipt, PublishError> {
        Err(PublishError::Unavailable(self.0.clone()))
    }
}

/// Sink that records every run summary
#[derive(Default)]
pub struct RecordingSink {
    pub summaries: Mutex<Vec<RunSummary>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, summary: &RunSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}

/// Temp-dir backed workspace. Keep the `TempDir` alive for the test's
/// duration.
pub fn temp_workspace() -> (tempfile::TempDir, Arc<dyn Workspace>) {
    let dir = tempfile::tempdir().unwrap();
    let ws: Arc<dyn Workspace> = Arc::new(FsWorkspace::new(dir.path()));
    (dir, ws)
}

/// Policy where the given categories are enabled and auto-fixable
pub fn auto_fix_policy(categories: &[Category]) -> Policy {
    let mut config = PolicyConfig::new();
    for category in categories {
        config = config.with_category(category.as_str(), CategoryRule::auto_fixable());
    }
    Policy::from_config(&config).unwrap()
}

/// A found issue with one location, for brevity in tests
pub fn issue_at(category: Category, path: &str) -> Issue {
    Issue::new(category, afo_model::Severity::Low).with_location(Path::new(path))
}
