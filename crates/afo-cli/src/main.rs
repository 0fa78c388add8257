//! `afo` binary: run the auto-fix pipeline against a workspace.

use afo_builtins::{stock_detectors, stock_fixers, stock_validators};
use afo_engine::{
    ChangePublisher, DryRunPublisher, FsWorkspace, Orchestrator, PublishError, PublishReceipt,
    RunOutcome, TracingSink, Workspace,
};
use afo_model::ChangeSet;
use afo_policy::Policy;
use async_trait::async_trait;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;

const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_CONFIG: i32 = 2;

/// Publisher that drops the change set as a JSON file for review tooling
struct FilePublisher {
    out_dir: PathBuf,
}

#[async_trait]
impl ChangePublisher for FilePublisher {
    async fn publish(&self, changeset: &ChangeSet) -> Result<PublishReceipt, PublishError> {
        let body = serde_json::to_string_pretty(changeset)
            .map_err(|e| PublishError::Rejected(e.to_string()))?;
        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;
        let path = self.out_dir.join(format!("changeset-{}.json", changeset.id));
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;
        Ok(PublishReceipt::new(path.display().to_string()))
    }
}

fn cli() -> Command {
    let workspace_arg = Arg::new("workspace")
        .long("workspace")
        .default_value(".")
        .help("Root of the tree to analyze and fix");
    let config_arg = Arg::new("config")
        .long("config")
        .help("Path to the TOML policy file");
    let json_arg = Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON");

    Command::new("afo")
        .version(afo_engine::VERSION)
        .about("Automated issue detection and remediation")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Execute one full orchestration pass")
                .arg(workspace_arg.clone())
                .arg(config_arg.clone())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Do not write the change-set artifact"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .default_value(".afo")
                        .help("Directory for change-set artifacts (relative to cwd)"),
                )
                .arg(json_arg.clone()),
        )
        .subcommand(
            Command::new("detect")
                .visible_alias("detect-only")
                .about("Detect and partition issues without fixing")
                .arg(workspace_arg)
                .arg(config_arg)
                .arg(json_arg),
        )
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_policy(config: Option<&String>) -> Result<Policy, i32> {
    match config {
        Some(path) => Policy::load(path).map_err(|e| {
            eprintln!("configuration error: {e}");
            EXIT_CONFIG
        }),
        None => Ok(Policy::default()),
    }
}

fn build_orchestrator(policy: Policy, publisher: Arc<dyn ChangePublisher>) -> Orchestrator {
    // The stock fixer set has one fixer per category; the builder cannot
    // report a duplicate here.
    let fixers = stock_fixers().unwrap_or_default();
    Orchestrator::new(
        Arc::new(policy),
        stock_detectors(),
        fixers,
        stock_validators(),
        publisher,
    )
    .with_notification_sink(Arc::new(TracingSink))
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Published { receipt, changeset } => {
            println!("outcome: published");
            println!("  receipt: {}", receipt.identifier);
            println!("  summary: {}", changeset.summary);
            for path in changeset.changed_paths() {
                println!("  changed: {}", path.display());
            }
            for entry in &changeset.unresolved {
                println!(
                    "  review: [{}] {}",
                    entry.issue.category,
                    entry.reason.as_str()
                );
            }
        }
        RunOutcome::Rejected { reason, unresolved } => {
            println!("outcome: rejected ({reason})");
            for entry in unresolved {
                println!(
                    "  review: [{}] {}",
                    entry.issue.category,
                    entry.reason.as_str()
                );
            }
        }
        RunOutcome::Failed { failure } => {
            println!("outcome: failed");
            println!("  {failure}");
        }
    }
}

async fn run_command(args: &clap::ArgMatches) -> i32 {
    let policy = match load_policy(args.get_one::<String>("config")) {
        Ok(policy) => policy,
        Err(code) => return code,
    };

    let root = args
        .get_one::<String>("workspace")
        .cloned()
        .unwrap_or_else(|| ".".to_string());
    let workspace: Arc<dyn Workspace> = Arc::new(FsWorkspace::new(root));

    let publisher: Arc<dyn ChangePublisher> = if args.get_flag("dry-run") {
        Arc::new(DryRunPublisher)
    } else {
        let out_dir = args
            .get_one::<String>("out")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".afo"));
        Arc::new(FilePublisher { out_dir })
    };

    let orchestrator = build_orchestrator(policy, publisher);

    // Ctrl-C cancels between phases; the in-flight fixer still completes
    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling run");
            cancel.cancel();
        }
    });

    match orchestrator.run(workspace).await {
        Ok(outcome) => {
            if args.get_flag("json") {
                match serde_json::to_string_pretty(&outcome) {
                    Ok(body) => println!("{body}"),
                    Err(e) => eprintln!("report serialization failed: {e}"),
                }
            } else {
                print_outcome(&outcome);
            }
            match outcome {
                RunOutcome::Published { .. } | RunOutcome::Rejected { .. } => EXIT_OK,
                RunOutcome::Failed { .. } => EXIT_FAILED,
            }
        }
        Err(e) => {
            eprintln!("run aborted: {e}");
            if e.is_config() {
                EXIT_CONFIG
            } else {
                EXIT_FAILED
            }
        }
    }
}

async fn detect_command(args: &clap::ArgMatches) -> i32 {
    let policy = match load_policy(args.get_one::<String>("config")) {
        Ok(policy) => policy,
        Err(code) => return code,
    };

    let root = args
        .get_one::<String>("workspace")
        .cloned()
        .unwrap_or_else(|| ".".to_string());
    let workspace: Arc<dyn Workspace> = Arc::new(FsWorkspace::new(root));
    let orchestrator = build_orchestrator(policy, Arc::new(DryRunPublisher));

    match orchestrator.detect_only(workspace).await {
        Ok(report) => {
            if args.get_flag("json") {
                match serde_json::to_string_pretty(&report) {
                    Ok(body) => println!("{body}"),
                    Err(e) => eprintln!("report serialization failed: {e}"),
                }
            } else {
                println!("{} issue(s) found", report.total());
                for (category, issues) in &report.auto_fixable {
                    println!("  auto-fixable: [{category}] {} issue(s)", issues.len());
                }
                for entry in &report.review {
                    println!(
                        "  review: [{}] {}",
                        entry.issue.category,
                        entry.reason.as_str()
                    );
                }
            }
            EXIT_OK
        }
        Err(e) => {
            eprintln!("detection aborted: {e}");
            EXIT_FAILED
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let matches = cli().get_matches();
    let code = match matches.subcommand() {
        Some(("run", args)) => run_command(args).await,
        Some(("detect", args)) => detect_command(args).await,
        _ => EXIT_CONFIG,
    };
    std::process::exit(code);
}
