//! End-to-end orchestrator scenarios over scripted capabilities.
//!
//! These tests pin the run state machine's terminal semantics:
//! - fixes that apply and validate are published with review items attached,
//! - runs that change nothing are rejected, never published,
//! - validation failures discard the change set with full diagnostics.

use afo_engine::{
    DetectorRegistry, EngineError, FixerRegistry, NotificationSink, Orchestrator, RunFailure,
    RunOutcome, ValidatorChain, NO_FIXER_AVAILABLE,
};
use afo_model::{Category, FixOutcome, Issue, ReviewReason, Severity};
use afo_policy::{CategoryRule, Policy, PolicyConfig};
use afo_test_utils::{
    auto_fix_policy, DegradingDetector, FailingPublisher, OnceDetector, RecordingPublisher,
    RecordingSink, ScriptedDetector, ScriptedFixer, ScriptedValidator, temp_workspace,
};
use std::sync::Arc;

fn orchestrator(
    policy: Policy,
    detectors: DetectorRegistry,
    fixers: FixerRegistry,
    validators: ValidatorChain,
    publisher: Arc<RecordingPublisher>,
) -> Orchestrator {
    Orchestrator::new(Arc::new(policy), detectors, fixers, validators, publisher)
}

/// A formatting issue is fixed and published; a high-severity security issue
/// rides along as a review item.
#[tokio::test]
async fn fixable_and_review_issues_publish_with_review_attached() {
    let (_dir, ws) = temp_workspace();

    let config = PolicyConfig::new()
        .with_category("formatting", CategoryRule::auto_fixable())
        .with_category("security", CategoryRule::auto_fixable())
        .with_review_threshold(Severity::High);
    let policy = Policy::from_config(&config).unwrap();

    let detectors = DetectorRegistry::builder()
        .with(OnceDetector::new(
            Category::Formatting,
            vec![Issue::new(Category::Formatting, Severity::Low)],
        ))
        .with(ScriptedDetector::new(
            Category::Security,
            vec![Issue::new(Category::Security, Severity::High)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(
            ScriptedFixer::new(FixOutcome::applied(
                Category::Formatting,
                vec!["src/app.py".into()],
            ))
            .with_write("src/app.py", "formatted\n"),
        )
        .build()
        .unwrap();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        policy,
        detectors,
        fixers,
        ValidatorChain::new().with(ScriptedValidator::passing("syntax")),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(Arc::clone(&ws)).await.unwrap();
    let RunOutcome::Published { receipt, changeset } = outcome else {
        panic!("expected published, got {outcome:?}");
    };

    assert!(receipt.identifier.starts_with("test/"));
    assert_eq!(publisher.published_count(), 1);
    assert_eq!(
        changeset.changed_paths(),
        vec![std::path::PathBuf::from("src/app.py")]
    );
    assert_eq!(changeset.unresolved.len(), 1);
    assert_eq!(changeset.unresolved[0].issue.category, Category::Security);
    assert_eq!(
        changeset.unresolved[0].reason,
        ReviewReason::SeverityForcesReview
    );
}

/// A failing fixer leaves no diff: the run is rejected and the issue is
/// retained with the failure reason.
#[tokio::test]
async fn fix_failure_rejects_with_empty_diff() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::Lint,
            vec![Issue::new(Category::Lint, Severity::Medium)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(ScriptedFixer::new(FixOutcome::failed(
            Category::Lint,
            "autofix crashed",
        )))
        .build()
        .unwrap();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        auto_fix_policy(&[Category::Lint]),
        detectors,
        fixers,
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(ws).await.unwrap();
    let RunOutcome::Rejected { unresolved, .. } = outcome else {
        panic!("expected rejected, got {outcome:?}");
    };

    assert_eq!(publisher.published_count(), 0);
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].reason, ReviewReason::FixFailed);
}

/// A validator failure after a successful fix fails the run with the full
/// report; nothing reaches the publisher.
#[tokio::test]
async fn validation_failure_discards_change_set() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(OnceDetector::new(
            Category::Config,
            vec![Issue::new(Category::Config, Severity::Medium)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(
            ScriptedFixer::new(FixOutcome::applied(
                Category::Config,
                vec!["docker-compose.yml".into()],
            ))
            .with_write("docker-compose.yml", "services: {}\n"),
        )
        .build()
        .unwrap();
    let validators = ValidatorChain::new()
        .with(ScriptedValidator::passing("json-syntax"))
        .with(ScriptedValidator::failing("compose-syntax", "bad yaml"));

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        auto_fix_policy(&[Category::Config]),
        detectors,
        fixers,
        validators,
        Arc::clone(&publisher),
    );

    let outcome = orch.run(ws).await.unwrap();
    let RunOutcome::Failed {
        failure: RunFailure::Validation { report },
    } = outcome
    else {
        panic!("expected validation failure, got {outcome:?}");
    };

    assert_eq!(publisher.published_count(), 0);
    // Every validator ran; the chain never short-circuits
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failures().len(), 1);
}

/// A clean workspace produces a rejected run, never an empty publication.
#[tokio::test]
async fn zero_issues_is_rejected() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::Docker,
            vec![Issue::clean(Category::Docker)],
        ))
        .build();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        auto_fix_policy(&[Category::Docker]),
        detectors,
        FixerRegistry::builder().build().unwrap(),
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(ws).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Rejected { .. }));
    assert_eq!(publisher.published_count(), 0);
}

/// Issues in a detect-only category are never dispatched to a fixer.
#[tokio::test]
async fn detect_only_category_goes_to_review() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::Security,
            vec![Issue::new(Category::Security, Severity::Medium)],
        ))
        .build();
    // A fixer exists, but policy keeps the category detect-only
    let fixers = FixerRegistry::builder()
        .with(ScriptedFixer::new(FixOutcome::applied(
            Category::Security,
            vec!["auth.py".into()],
        )))
        .build()
        .unwrap();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        Policy::default(),
        detectors,
        fixers,
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(ws).await.unwrap();
    let RunOutcome::Rejected { unresolved, .. } = outcome else {
        panic!("expected rejected, got {outcome:?}");
    };
    assert_eq!(unresolved[0].reason, ReviewReason::AutoFixDisabled);
}

/// A detector may surface findings outside its own category; when that
/// category is disabled, the finding is retained for review and its fixer is
/// never dispatched.
#[tokio::test]
async fn disabled_category_issue_stays_unresolved() {
    let (_dir, ws) = temp_workspace();

    // Lint scanner that also trips over a disabled security category
    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::Lint,
            vec![Issue::new(Category::Security, Severity::Medium)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(
            ScriptedFixer::new(FixOutcome::applied(
                Category::Security,
                vec!["auth.py".into()],
            ))
            .with_write("auth.py", "patched\n"),
        )
        .build()
        .unwrap();

    let config = PolicyConfig::new()
        .with_category("lint", CategoryRule::auto_fixable())
        .with_category("security", CategoryRule::disabled());
    let policy = Policy::from_config(&config).unwrap();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        policy,
        detectors,
        fixers,
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(Arc::clone(&ws)).await.unwrap();
    let RunOutcome::Rejected { unresolved, .. } = outcome else {
        panic!("expected rejected, got {outcome:?}");
    };
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].issue.category, Category::Security);
    assert_eq!(unresolved[0].reason, ReviewReason::CategoryDisabled);
    // The registered fixer never ran
    assert!(!ws.exists(std::path::Path::new("auth.py")).await);
}

/// An auto-fixable category without a registered fixer stays unresolved with
/// the "no fixer" reason.
#[tokio::test]
async fn missing_fixer_retains_issue() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::ImportOrder,
            vec![Issue::new(Category::ImportOrder, Severity::Low)],
        ))
        .build();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        auto_fix_policy(&[Category::ImportOrder]),
        detectors,
        FixerRegistry::builder().build().unwrap(),
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(ws).await.unwrap();
    let RunOutcome::Rejected { unresolved, .. } = outcome else {
        panic!("expected rejected, got {outcome:?}");
    };
    assert_eq!(unresolved[0].reason, ReviewReason::NoFixerAvailable);
    // The failed outcome text matches the registry's sentinel
    assert_eq!(NO_FIXER_AVAILABLE, "no fixer available");
}

/// A fix that does not survive revalidation is retained as unverified, and
/// the run still publishes the diff that was produced.
#[tokio::test]
async fn persisting_issue_after_fix_is_unverified() {
    let (_dir, ws) = temp_workspace();

    // Always reports the issue, before and after fixing
    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::Dependency,
            vec![Issue::new(Category::Dependency, Severity::Medium)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(
            ScriptedFixer::new(FixOutcome::applied(
                Category::Dependency,
                vec!["requirements.txt".into()],
            ))
            .with_write("requirements.txt", "flask==2.0\n"),
        )
        .build()
        .unwrap();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        auto_fix_policy(&[Category::Dependency]),
        detectors,
        fixers,
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(ws).await.unwrap();
    let RunOutcome::Published { changeset, .. } = outcome else {
        panic!("expected published, got {outcome:?}");
    };
    assert_eq!(changeset.unresolved.len(), 1);
    assert_eq!(changeset.unresolved[0].reason, ReviewReason::FixUnverified);
}

/// A detector that fails during revalidation is reported as degraded, kept
/// distinct from a fix that demonstrably did not stick.
#[tokio::test]
async fn failed_recheck_is_reported_degraded() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(DegradingDetector::new(
            Category::Formatting,
            vec![Issue::new(Category::Formatting, Severity::Low)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(
            ScriptedFixer::new(FixOutcome::applied(
                Category::Formatting,
                vec!["src/app.py".into()],
            ))
            .with_write("src/app.py", "formatted\n"),
        )
        .build()
        .unwrap();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        auto_fix_policy(&[Category::Formatting]),
        detectors,
        fixers,
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );

    let outcome = orch.run(ws).await.unwrap();
    let RunOutcome::Published { changeset, .. } = outcome else {
        panic!("expected published, got {outcome:?}");
    };
    assert_eq!(changeset.unresolved.len(), 1);
    assert!(changeset.unresolved[0].issue.is_degraded());
    assert_eq!(
        changeset.unresolved[0].reason,
        ReviewReason::DetectorDegraded
    );
}

/// An unreachable publisher fails the run with the underlying reason.
#[tokio::test]
async fn publisher_failure_fails_run() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(OnceDetector::new(
            Category::Docker,
            vec![Issue::new(Category::Docker, Severity::Medium)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(
            ScriptedFixer::new(FixOutcome::applied(
                Category::Docker,
                vec![".dockerignore".into()],
            ))
            .with_write(".dockerignore", ".git\n"),
        )
        .build()
        .unwrap();

    let orch = Orchestrator::new(
        Arc::new(auto_fix_policy(&[Category::Docker])),
        detectors,
        fixers,
        ValidatorChain::new(),
        Arc::new(FailingPublisher("review queue down".to_string())),
    );

    let outcome = orch.run(ws).await.unwrap();
    let RunOutcome::Failed {
        failure: RunFailure::Publish { reason },
    } = outcome
    else {
        panic!("expected publish failure, got {outcome:?}");
    };
    assert!(reason.contains("review queue down"));
}

/// Cancellation before the run starts aborts without touching the publisher.
#[tokio::test]
async fn cancelled_run_aborts() {
    let (_dir, ws) = temp_workspace();

    let publisher = RecordingPublisher::new();
    let orch = orchestrator(
        Policy::default(),
        DetectorRegistry::builder().build(),
        FixerRegistry::builder().build().unwrap(),
        ValidatorChain::new(),
        Arc::clone(&publisher),
    );
    orch.cancel_token().cancel();

    let err = orch.run(ws).await.unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(publisher.published_count(), 0);
}

/// Detect-only partitions issues without running fixers or validators.
#[tokio::test]
async fn detect_only_leaves_workspace_untouched() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::Docker,
            vec![Issue::new(Category::Docker, Severity::Medium)],
        ))
        .with(ScriptedDetector::new(
            Category::Security,
            vec![Issue::new(Category::Security, Severity::Critical)],
        ))
        .build();
    let fixers = FixerRegistry::builder()
        .with(
            ScriptedFixer::new(FixOutcome::applied(
                Category::Docker,
                vec![".dockerignore".into()],
            ))
            .with_write(".dockerignore", ".git\n"),
        )
        .build()
        .unwrap();

    let orch = orchestrator(
        auto_fix_policy(&[Category::Docker, Category::Security]),
        detectors,
        fixers,
        ValidatorChain::new(),
        RecordingPublisher::new(),
    );

    let report = orch.detect_only(Arc::clone(&ws)).await.unwrap();
    assert_eq!(report.total(), 2);
    assert_eq!(report.auto_fixable[&Category::Docker].len(), 1);
    // Critical severity forces review under the default threshold
    assert_eq!(report.review[0].reason, ReviewReason::SeverityForcesReview);
    // The fixer never ran
    assert!(!ws.exists(std::path::Path::new(".dockerignore")).await);
}

/// Run summaries reach the notification sink at terminal outcomes.
#[tokio::test]
async fn sink_receives_summary() {
    let (_dir, ws) = temp_workspace();

    let detectors = DetectorRegistry::builder()
        .with(ScriptedDetector::new(
            Category::Lint,
            vec![Issue::new(Category::Lint, Severity::Medium)],
        ))
        .build();

    let sink = RecordingSink::new();
    let orch = orchestrator(
        Policy::default(),
        detectors,
        FixerRegistry::builder().build().unwrap(),
        ValidatorChain::new(),
        RecordingPublisher::new(),
    )
    .with_notification_sink(sink.clone() as Arc<dyn NotificationSink>);

    orch.run(ws).await.unwrap();

    let summaries = sink.summaries.lock().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].outcome, "rejected");
    assert_eq!(summaries[0].total_issues(), 1);
}
