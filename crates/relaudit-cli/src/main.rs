//! relaudit - release CI coverage audit
//!
//! Checks that every repository contributing images to a release declares
//! exactly one platform e2e, serial and upgrade test in its ci-operator
//! configuration.
//!
//! ## Commands
//!
//! - `audit`: Audit every repository of a release
//! - `rules`: Show the active coverage rules
//! - `locate`: Print the configuration path of one repository

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use relaudit_ci::{
    AuditGate, AuditPipeline, AuditReport, AuditSpec, FileReleaseInfo, FsConfigLoader,
    ReleaseInfoCommand, ReleaseInfoSource,
};
use relaudit_core::{ConfigLocator, RepositoryId, RuleSet};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "relaudit")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit release repositories for required CI tests", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit every repository that contributed images to a release
    Audit(AuditArgs),

    /// Show the active coverage rules and their digest
    Rules {
        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Print the configuration path for a repository URL
    Locate {
        /// Repository URL, e.g. https://github.com/openshift/oc
        repo: String,

        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Branch whose configuration file is validated
    #[arg(short, long, env = "RELAUDIT_BRANCH", default_value = "master")]
    branch: String,

    /// Checkout of the release repository holding ci-operator/config
    #[arg(long, env = "RELAUDIT_CONFIG_ROOT", default_value = "../release")]
    config_root: PathBuf,
}

#[derive(Args, Debug)]
struct RuleArgs {
    /// Additional required test-name pattern (repeatable)
    #[arg(long = "rule", value_name = "PATTERN")]
    extra_rules: Vec<String>,

    /// Do not include the standard e2e / serial / upgrade rules
    #[arg(long)]
    no_default_rules: bool,
}

impl RuleArgs {
    fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::with_extra(!self.no_default_rules, &self.extra_rules)
            .context("Invalid coverage rules")
    }
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// Release to inspect, e.g. 4.8.0-fc.9
    #[arg(
        short,
        long,
        env = "RELAUDIT_RELEASE",
        required_unless_present = "release_info_file"
    )]
    release: Option<String>,

    #[command(flatten)]
    target: TargetArgs,

    /// Release inspection executable
    #[arg(long, env = "RELAUDIT_TOOL", default_value = "oc")]
    tool: String,

    /// Timeout for the release inspection tool in seconds (0 = none)
    #[arg(long, default_value = "120")]
    tool_timeout_secs: u64,

    /// Read the release report from a file instead of running the tool
    #[arg(long)]
    release_info_file: Option<PathBuf>,

    #[command(flatten)]
    rules: RuleArgs,

    /// Number of repositories audited concurrently
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Abort the whole audit when a configuration fails to parse
    #[arg(long)]
    strict_parse: bool,

    /// Exit non-zero when any violation or repository error is found
    #[arg(long)]
    fail_on_violation: bool,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    relaudit_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Audit(args) => cmd_audit(args).await,
        Commands::Rules { rules } => cmd_rules(&rules),
        Commands::Locate { repo, target } => cmd_locate(&repo, &target),
    }
}

/// Audit a release
async fn cmd_audit(args: AuditArgs) -> Result<()> {
    let rules = args.rules.rule_set()?;

    let mut spec = AuditSpec::new(
        args.release.clone(),
        args.target.branch.clone(),
        args.target.config_root.clone(),
    )
    .with_jobs(args.jobs);
    if args.strict_parse {
        spec = spec.strict();
    }

    let source: Box<dyn ReleaseInfoSource> = match (&args.release_info_file, &args.release) {
        (Some(path), _) => Box::new(FileReleaseInfo::new(path)),
        (None, Some(release)) => Box::new(ReleaseInfoCommand::for_release(
            &args.tool,
            release,
            args.tool_timeout_secs,
        )),
        (None, None) => anyhow::bail!("Either --release or --release-info-file is required"),
    };

    let report = AuditPipeline::run(source.as_ref(), &FsConfigLoader, &spec, &rules)
        .await
        .context("Release coverage audit failed")?;

    match args.output {
        OutputFormat::Text => print_text_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if args.fail_on_violation {
        let verdict = AuditGate::evaluate(&report);
        if !verdict.passed {
            anyhow::bail!(verdict.message);
        }
        info!("{}", verdict.message);
    }

    Ok(())
}

fn print_text_report(report: &AuditReport) {
    println!("Release: {}", report.release);
    println!("Branch: {}", report.branch);
    println!("Audit ID: {}", report.audit_id);
    println!();

    for line in report.diagnostic_lines() {
        println!("{}", line);
    }

    println!();
    println!(
        "{} repositories, {} matched, {} violation(s), {} repository error(s) ({}ms)",
        report.repositories.len(),
        report.matched_count(),
        report.violation_count(),
        report.repository_error_count(),
        report.duration_ms
    );
}

/// Show the active rule set
fn cmd_rules(args: &RuleArgs) -> Result<()> {
    let rules = args.rule_set()?;
    for rule in rules.rules() {
        println!("{:<10} {}", rule.label(), rule.pattern());
    }
    println!();
    println!("Digest: {}", rules.digest());
    Ok(())
}

/// Resolve a single repository
fn cmd_locate(repo: &str, target: &TargetArgs) -> Result<()> {
    let locator = ConfigLocator::new(target.config_root.clone());
    let path = locator
        .locate(&RepositoryId::new(repo), &target.branch)
        .with_context(|| format!("Cannot locate configuration for {}", repo))?;
    println!("{}", path.display());
    Ok(())
}
