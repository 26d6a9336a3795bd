//! `flowsync train flow <name>` — retrain a flow's intents in every locale.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;

use flowsync_sync::{LocaleTraining, TrainOutcome};

use super::{GlobalOpts, Session};

#[derive(Subcommand, Debug)]
pub enum TrainCommand {
    /// Train one pulled flow.
    Flow {
        /// Flow name.
        name: String,
        /// Per-locale timeout in milliseconds (default from settings).
        #[arg(long, value_name = "MS")]
        timeout: Option<u64>,
    },
}

pub fn run(command: TrainCommand, opts: &GlobalOpts) -> Result<()> {
    let TrainCommand::Flow { name, timeout } = command;
    let session = Session::open(opts)?;
    let timeout = Duration::from_millis(timeout.unwrap_or(session.settings.train_timeout_ms));

    let results = session
        .orchestrator()
        .train(&name, timeout)
        .with_context(|| format!("train failed for '{name}'"))?;

    for result in &results {
        print_result(&name, result);
    }

    let failed = results.iter().filter(|r| !r.outcome.is_success()).count();
    if failed > 0 {
        bail!("training did not complete in {failed} locale(s)");
    }
    Ok(())
}

fn print_result(flow: &str, result: &LocaleTraining) {
    let locale = result.locale.name.yellow();
    match &result.outcome {
        TrainOutcome::Trained { elapsed, .. } => println!(
            "{} {flow} ({locale}) trained in {:.1}s",
            "[success]".green().bold(),
            elapsed.as_secs_f64()
        ),
        TrainOutcome::TimedOut { task, timeout } => println!(
            "{} {flow} ({locale}) task {task} still running after {}ms",
            "[error]".red().bold(),
            timeout.as_millis()
        ),
        TrainOutcome::Failed { reason, .. } => println!(
            "{} {flow} ({locale}) {reason}",
            "[error]".red().bold()
        ),
    }
}
