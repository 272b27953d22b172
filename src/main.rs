use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use oldfolder::archive::{self, MovePlan, RunOutcome};
use oldfolder::prompt::{self, AssumeYes, Confirm, TerminalPrompt};
use oldfolder::{colors, Cli, OldFolderError, Relocator, VERSION};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Disable colors if requested
    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose);
    debug!(version = VERSION, ?cli, "starting");

    let relocator = Relocator::new(
        &cli.path,
        cli.number,
        cli.storage.as_str(),
        cli.classifier_config(),
    );

    let plan = relocator
        .prepare()
        .with_context(|| format!("Nothing was moved in {}", cli.path.display()))?;

    if plan.is_empty() {
        println!("{}", prompt::nothing_to_move(plan.time_kind));
        return Ok(());
    }

    if cli.dry_run {
        return show_dry_run(&plan, cli.json);
    }

    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompt)
    };

    let outcome = archive::finish(plan, confirm.as_mut()).map_err(|e| match e {
        OldFolderError::Move { completed, .. } => {
            anyhow::Error::new(e).context(format!(
                "Move stopped early; {completed} folder(s) already moved were left in place"
            ))
        }
        other => other.into(),
    })?;

    match outcome {
        RunOutcome::NothingToMove { time_kind } => {
            println!("{}", prompt::nothing_to_move(time_kind));
        }
        RunOutcome::Declined { .. } => {
            println!("{}", prompt::ABORTED.color(colors::WARNING));
        }
        RunOutcome::Completed { summary } => {
            println!("{}", prompt::COMPLETE.bold().color(colors::SUCCESS));
            if cli.verbose {
                for operation in &summary.moved {
                    println!("   • {}", operation.destination.display().to_string().color(colors::PATH));
                }
                if summary.cross_device > 0 {
                    println!(
                        "{} {} folder(s) were copied across devices then removed",
                        "ℹ️".cyan(),
                        summary.cross_device
                    );
                }
            }
        }
    }

    Ok(())
}

fn show_dry_run(plan: &MovePlan, json: bool) -> Result<()> {
    if json {
        let data = serde_json::to_string_pretty(plan).context("Failed to serialize move plan")?;
        println!("{data}");
        return Ok(());
    }

    println!("{} DRY RUN: Showing what would be done", "🌵".yellow());
    print!("{}", prompt::plan_listing(plan));
    println!(
        "{} {} folder(s) would be moved to {}",
        "📁".color(colors::HEADER),
        plan.operations.len(),
        plan.storage_path().display().to_string().color(colors::PATH)
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("oldfolder=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
