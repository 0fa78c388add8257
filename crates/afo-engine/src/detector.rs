//! Detector capability and registry
//!
//! Detectors are read-only analyzers producing issues for one category. The
//! registry is assembled explicitly at startup through a builder; there is no
//! side-effecting registration at load time. Detectors run concurrently
//! against the same read-only workspace, and their failures are isolated: an
//! error, panic, or timeout yields a degraded issue instead of aborting the
//! run.

use crate::error::DetectorError;
use crate::workspace::Workspace;
use afo_model::{Category, Issue};
use afo_policy::Policy;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Read-only analyzer producing issues for one category
#[async_trait]
pub trait Detector: Send + Sync {
    /// Category this detector reports under
    fn category(&self) -> Category;

    /// Scan the workspace. Must be side-effect-free.
    async fn scan(&self, workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError>;
}

/// Builder assembling a [`DetectorRegistry`]
#[derive(Default)]
pub struct DetectorRegistryBuilder {
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorRegistryBuilder {
    /// Register a detector. Multiple detectors may share a category; their
    /// results are unioned.
    #[must_use]
    pub fn with(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Arc::new(detector));
        self
    }

    /// Register an already-shared detector
    #[must_use]
    pub fn with_shared(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Finalize the registry
    #[must_use]
    pub fn build(self) -> DetectorRegistry {
        DetectorRegistry {
            detectors: self.detectors,
        }
    }
}

/// Immutable set of registered detectors
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorRegistry {
    /// Start assembling a registry
    #[inline]
    #[must_use]
    pub fn builder() -> DetectorRegistryBuilder {
        DetectorRegistryBuilder::default()
    }

    /// Number of registered detectors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector enabled by policy, concurrently.
    ///
    /// Ordering across detectors is irrelevant (pure set union). A detector
    /// that errors, panics, or exceeds the policy's per-detector timeout
    /// contributes a degraded issue for its category instead of a result.
    pub async fn run_all(&self, workspace: Arc<dyn Workspace>, policy: &Policy) -> Vec<Issue> {
        self.run_filtered(workspace, policy, None).await
    }

    /// Re-run only the detectors whose category is in the given set
    /// (revalidation after fixing).
    pub async fn run_categories(
        &self,
        workspace: Arc<dyn Workspace>,
        policy: &Policy,
        categories: &BTreeSet<Category>,
    ) -> Vec<Issue> {
        self.run_filtered(workspace, policy, Some(categories)).await
    }

    async fn run_filtered(
        &self,
        workspace: Arc<dyn Workspace>,
        policy: &Policy,
        categories: Option<&BTreeSet<Category>>,
    ) -> Vec<Issue> {
        let timeout = policy.detector_timeout();
        let mut handles = Vec::new();

        for detector in &self.detectors {
            let category = detector.category();
            if !policy.is_enabled(category) {
                tracing::debug!(%category, "detector skipped: category disabled");
                continue;
            }
            if let Some(wanted) = categories {
                if !wanted.contains(&category) {
                    continue;
                }
            }

            let detector = Arc::clone(detector);
            let workspace = Arc::clone(&workspace);
            let handle = tokio::spawn(async move {
                run_one(detector, workspace.as_ref(), category, timeout).await
            });
            handles.push((category, handle));
        }

        let joined = futures::future::join_all(handles.into_iter().map(
            |(category, handle)| async move {
                match handle.await {
                    Ok(issues) => issues,
                    // Panic isolation: a crashing detector degrades like a
                    // failing one.
                    Err(e) => {
                        tracing::warn!(%category, error = %e, "detector task panicked");
                        vec![Issue::degraded(category, format!("detector panicked: {e}"))]
                    }
                }
            },
        ))
        .await;

        joined.into_iter().flatten().collect()
    }
}

async fn run_one(
    detector: Arc<dyn Detector>,
    workspace: &dyn Workspace,
    category: Category,
    timeout: Duration,
) -> Vec<Issue> {
    match tokio::time::timeout(timeout, detector.scan(workspace)).await {
        Ok(Ok(issues)) => {
            tracing::debug!(%category, found = issues.iter().filter(|i| i.found).count(), "detector finished");
            issues
        }
        Ok(Err(e)) => {
            tracing::warn!(%category, error = %e, "detector failed");
            vec![Issue::degraded(category, e.to_string())]
        }
        Err(_) => {
            tracing::warn!(%category, ?timeout, "detector timed out");
            vec![Issue::degraded(
                category,
                format!("timed out after {}s", timeout.as_secs()),
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::FsWorkspace;
    use afo_model::Severity;
    use afo_policy::{CategoryRule, PolicyConfig};

    struct FixedDetector {
        category: Category,
        issues: Vec<Issue>,
    }

    #[async_trait]
    impl Detector for FixedDetector {
        fn category(&self) -> Category {
            self.category
        }

        async fn scan(&self, _workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
            Ok(self.issues.clone())
        }
    }

    struct FailingDetector;

    #[async_trait]
    impl Detector for FailingDetector {
        fn category(&self) -> Category {
            Category::Security
        }

        async fn scan(&self, _workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
            Err(DetectorError::Tool("scanner exploded".to_string()))
        }
    }

    struct HangingDetector;

    #[async_trait]
    impl Detector for HangingDetector {
        fn category(&self) -> Category {
            Category::Lint
        }

        async fn scan(&self, _workspace: &dyn Workspace) -> Result<Vec<Issue>, DetectorError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    fn workspace() -> (tempfile::TempDir, Arc<dyn Workspace>) {
        let dir = tempfile::tempdir().unwrap();
        let ws: Arc<dyn Workspace> = Arc::new(FsWorkspace::new(dir.path()));
        (dir, ws)
    }

    #[tokio::test]
    async fn union_across_detectors() {
        let registry = DetectorRegistry::builder()
            .with(FixedDetector {
                category: Category::Docker,
                issues: vec![Issue::new(Category::Docker, Severity::Medium)],
            })
            .with(FixedDetector {
                category: Category::Config,
                issues: vec![Issue::new(Category::Config, Severity::Low)],
            })
            .build();

        let (_dir, ws) = workspace();
        let issues = registry.run_all(ws, &Policy::default()).await;
        assert_eq!(issues.len(), 2);
    }

    #[tokio::test]
    async fn failure_degrades_to_issue() {
        let registry = DetectorRegistry::builder().with(FailingDetector).build();
        let (_dir, ws) = workspace();
        let issues = registry.run_all(ws, &Policy::default()).await;

        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_degraded());
        assert_eq!(issues[0].category, Category::Security);
        assert_eq!(issues[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn timeout_degrades_to_issue() {
        let config = PolicyConfig {
            detector_timeout_secs: Some(0),
            ..PolicyConfig::default()
        };
        let policy = Policy::from_config(&config).unwrap();

        let registry = DetectorRegistry::builder().with(HangingDetector).build();
        let (_dir, ws) = workspace();
        let issues = registry.run_all(ws, &policy).await;

        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_degraded());
    }

    #[tokio::test]
    async fn disabled_category_skipped() {
        let config =
            PolicyConfig::new().with_category("docker", CategoryRule::disabled());
        let policy = Policy::from_config(&config).unwrap();

        let registry = DetectorRegistry::builder()
            .with(FixedDetector {
                category: Category::Docker,
                issues: vec![Issue::new(Category::Docker, Severity::Medium)],
            })
            .build();

        let (_dir, ws) = workspace();
        let issues = registry.run_all(ws, &policy).await;
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn run_categories_filters() {
        let registry = DetectorRegistry::builder()
            .with(FixedDetector {
                category: Category::Docker,
                issues: vec![Issue::new(Category::Docker, Severity::Medium)],
            })
            .with(FixedDetector {
                category: Category::Config,
                issues: vec![Issue::new(Category::Config, Severity::Low)],
            })
            .build();

        let (_dir, ws) = workspace();
        let wanted: BTreeSet<Category> = [Category::Config].into_iter().collect();
        let issues = registry.run_categories(ws, &Policy::default(), &wanted).await;

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, Category::Config);
    }
}
