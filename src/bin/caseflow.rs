use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

use caseflow::config::{get_settings, Settings};
use caseflow::engine::ExecutionStatus;
use caseflow::telemetry::{init_telemetry, TelemetryConfig};
use caseflow::{attend, ConsoleInputHandler, ProcessEngine};

/// Caseflow - run a process definition against a case from the terminal
#[derive(Parser, Debug)]
#[command(name = "caseflow", about, long_about = None)]
struct Cli {
    /// Path to a caseflow.config.yaml
    #[arg(long, env = "CASEFLOW_CONFIG")]
    config: Option<String>,

    /// Directory holding process definitions
    #[arg(long)]
    definitions: Option<PathBuf>,

    /// Directory for execution journals
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Process name
    #[arg(long, default_value = "expense_approval")]
    process: String,

    /// Process version
    #[arg(long = "version", default_value = "1.0.0")]
    process_version: String,

    /// Initial case payload as JSON
    #[arg(long)]
    payload: Option<String>,

    /// Case id; generated when omitted
    #[arg(long)]
    case_id: Option<String>,

    /// Rebuild the case from its journal instead of starting it
    #[arg(long, requires = "case_id")]
    resume: bool,
}

/// Apply command-line overrides on top of the loaded settings
fn apply_overrides(cli: &Cli, mut settings: Settings) -> Result<Settings> {
    if let Some(definitions) = &cli.definitions {
        settings.engine.definitions_path = definitions.display().to_string();
    }
    if let Some(journal) = &cli.journal {
        settings.engine.journal_path = Some(journal.display().to_string());
    }
    if cli.resume && settings.engine.journal_path.is_none() {
        anyhow::bail!(
            "--resume needs a journal: pass --journal or set engine.journal_path in the config"
        );
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = get_settings(cli.config.as_deref()).context("failed to load settings")?;
    let settings = apply_overrides(&cli, settings)?;
    init_telemetry(TelemetryConfig::from(&settings.logger))?;

    let engine = ProcessEngine::from_settings(settings.engine.clone())
        .await
        .context("failed to create process engine")?;

    let case_id = cli
        .case_id
        .clone()
        .unwrap_or_else(|| format!("case-{}", Uuid::new_v4()));

    let execution = if cli.resume {
        engine
            .resume(&case_id)
            .await
            .with_context(|| format!("failed to resume case {}", case_id))?
    } else {
        let payload: Value = match &cli.payload {
            Some(raw) => serde_json::from_str(raw).context("--payload is not valid JSON")?,
            None => Value::Null,
        };
        engine.start(case_id.clone(), &cli.process, &cli.process_version, payload)
    };

    println!(
        "{} {} ({} v{})",
        "Case".bold().green(),
        case_id.bold(),
        cli.process,
        cli.process_version
    );
    println!("{}", "=".repeat(50));

    // Echo the activity stream as the case progresses
    let mut updates = execution.subscribe();
    let watcher = tokio::spawn(async move {
        let mut printed = 0usize;
        loop {
            let fresh: Vec<_> = updates
                .borrow_and_update()
                .as_ref()
                .map(|case| case.activity_stream.iter().skip(printed).cloned().collect())
                .unwrap_or_default();
            for item in fresh {
                printed += 1;
                println!(
                    "{} {}: {}",
                    format!("[{}]", item.kind).cyan(),
                    item.sender.bold(),
                    item.text
                );
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    let handler = ConsoleInputHandler::new();
    let status = attend(&execution, &handler).await?;
    watcher.abort();

    match status {
        ExecutionStatus::Completed => {
            let case = execution.result().await?;
            println!("\n{}", "Final case".bold().green());
            println!("{}", serde_json::to_string_pretty(&case)?);
            Ok(())
        }
        other => {
            println!("\n{} {}", "Case did not complete:".bold().red(), other);
            if let Some(case) = execution.get_current_state() {
                println!("{}", serde_json::to_string_pretty(&case)?);
            }
            Err(anyhow::anyhow!("case {} ended as {}", case_id, other))
        }
    }
}
