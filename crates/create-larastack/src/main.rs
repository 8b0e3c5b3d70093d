//! create-larastack-app - Apply Larastack module rules to a generated project

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use larastack_core::{ModuleSet, ProductConfig, RuleEngine, RunSummary};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "create-larastack-app")]
#[command(about = "Apply Larastack module rules to a generated project")]
#[command(version)]
pub struct Args {
    /// Log every rule and operation
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run default and project rules, then remove the rule manifest
    Apply(ModulesArgs),
    /// Remove folders and CI workflows of unselected modules only
    Prune(PruneArgs),
    /// Validate the rule manifest and list the rules that would run
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct ModulesArgs {
    /// Generated project directory
    pub directory: PathBuf,

    /// Selected modules (comma-separated: frontend,backend,mobile)
    #[arg(short, long, value_parser = parse_modules)]
    pub modules: ModuleSet,
}

#[derive(Parser, Debug)]
pub struct PruneArgs {
    #[command(flatten)]
    pub target: ModulesArgs,

    /// Only remove CI workflow files, keep module folders
    #[arg(long = "workflows-only")]
    pub workflows_only: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Generated project directory
    pub directory: PathBuf,
}

fn parse_modules(value: &str) -> std::result::Result<ModuleSet, String> {
    value.parse::<ModuleSet>().map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("larastack_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("larastack_core=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn ensure_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Project directory not found: {}", dir.display());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {} rule(s) matched, {} skipped",
        "Done".green().bold(),
        summary.rules_matched,
        summary.rules_skipped
    );
    println!(
        "  {} {} removed, {} copied, {} rewritten",
        "->".blue(),
        summary.paths_removed,
        summary.files_copied,
        summary.files_rewritten
    );
    Ok(())
}

async fn apply(engine: &RuleEngine, args: ModulesArgs, json: bool) -> Result<()> {
    ensure_directory(&args.directory)?;

    eprintln!(
        "{}",
        format!(
            "Applying {} rules for {}...",
            engine.product().display_name(),
            args.modules
        )
        .cyan()
        .bold()
    );

    let summary = engine
        .apply(&args.directory, &args.modules)
        .await
        .with_context(|| format!("Failed to apply rules in {}", args.directory.display()))?;

    print_summary(&summary, json)
}

async fn prune(engine: &RuleEngine, args: PruneArgs, json: bool) -> Result<()> {
    let target = args.target;
    ensure_directory(&target.directory)?;

    let result = if args.workflows_only {
        eprintln!("{}", "Pruning CI workflows...".cyan().bold());
        engine.prune_workflows(&target.directory, &target.modules).await
    } else {
        eprintln!("{}", "Pruning unselected modules...".cyan().bold());
        engine.prune(&target.directory, &target.modules).await
    };
    let summary =
        result.with_context(|| format!("Failed to prune {}", target.directory.display()))?;

    print_summary(&summary, json)
}

async fn check(engine: &RuleEngine, args: CheckArgs) -> Result<()> {
    ensure_directory(&args.directory)?;

    let rules = engine
        .effective_rules(&args.directory)
        .await
        .with_context(|| format!("Invalid rules in {}", args.directory.display()))?;

    println!(
        "{} {}",
        "Manifest".cyan().bold(),
        engine.product().manifest_path()
    );
    for rule in &rules {
        let kinds: Vec<&str> = rule.operations.iter().map(|op| op.kind().as_str()).collect();
        println!("  {} {} ({})", "->".blue(), rule.id, kinds.join(", ").dimmed());
    }
    println!();
    println!("{} {} rule(s) are valid", "OK".green().bold(), rules.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let engine = RuleEngine::default();

    let result = match args.command {
        Command::Apply(apply_args) => apply(&engine, apply_args, args.json).await,
        Command::Prune(prune_args) => prune(&engine, prune_args, args.json).await,
        Command::Check(check_args) => check(&engine, check_args).await,
    };

    if result.is_err() {
        eprintln!("{}", "failed".red().bold());
    }
    result
}
