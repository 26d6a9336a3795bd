//! `flowsync push` — write local state back to the remote.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use flowsync_sync::{pipeline, Budget, FlowPushOutcome, FlowScope, LocalePushOutcome, PushReport};

use super::{GlobalOpts, Session};

#[derive(Subcommand, Debug)]
pub enum PushCommand {
    /// Push every flow in the local mirror.
    Flows,
    /// Push a single flow by name.
    Flow {
        /// Name of the flow directory under `<agent_dir>/flows`.
        name: String,
    },
}

#[derive(Tabled)]
struct PushRow {
    #[tabled(rename = "flow")]
    flow: String,
    #[tabled(rename = "locale")]
    locale: String,
    #[tabled(rename = "nodes")]
    nodes: String,
    #[tabled(rename = "intents")]
    intents: String,
    #[tabled(rename = "sentences")]
    sentences: String,
    #[tabled(rename = "skipped")]
    skipped: String,
}

impl PushRow {
    fn skipped(flow: &str, locale: &str, reason: &str) -> Self {
        Self {
            flow: flow.to_string(),
            locale: locale.to_string(),
            nodes: "-".into(),
            intents: "-".into(),
            sentences: "-".into(),
            skipped: reason.to_string(),
        }
    }
}

pub fn run(command: PushCommand, opts: &GlobalOpts) -> Result<()> {
    let scope = match command {
        PushCommand::Flows => FlowScope::All,
        PushCommand::Flow { name } => FlowScope::Flow(name),
    };

    let session = Session::open(opts)?;
    let mut sync = session.orchestrator();
    let report = pipeline::push(&mut sync, &scope, Budget::FULL).with_context(|| match &scope {
        FlowScope::All => "push failed".to_string(),
        FlowScope::Flow(name) => format!("push failed for '{name}'"),
    })?;
    print_report(&report);

    if let FlowScope::Flow(name) = &scope {
        if !report.skipped_flows().is_empty() {
            bail!("flow '{name}' has no valid local state; run `flowsync pull flow {name}` first");
        }
    }
    Ok(())
}

fn print_report(report: &PushReport) {
    if report.flows.is_empty() {
        println!("No flows in the local mirror. Run `flowsync pull flows` first.");
        return;
    }

    let mut rows = Vec::new();
    for flow in &report.flows {
        match &flow.outcome {
            FlowPushOutcome::Skipped { reason } => rows.push(PushRow::skipped(&flow.name, "-", reason)),
            FlowPushOutcome::Pushed { locales } => {
                for locale in locales {
                    match &locale.outcome {
                        LocalePushOutcome::Skipped { reason } => {
                            rows.push(PushRow::skipped(&flow.name, &locale.locale, reason))
                        }
                        LocalePushOutcome::Pushed(stats) => rows.push(PushRow {
                            flow: flow.name.clone(),
                            locale: locale.locale.clone(),
                            nodes: stats.nodes_updated.to_string(),
                            intents: stats.intents_updated.to_string(),
                            sentences: stats.sentences_updated.to_string(),
                            skipped: stats.skipped.len().to_string(),
                        }),
                    }
                }
            }
        }
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let skipped: Vec<_> = report.skipped_items().collect();
    if !skipped.is_empty() {
        println!("{}", format!("{} item(s) skipped:", skipped.len()).yellow());
        for item in skipped {
            println!("  {} {}: {}", item.kind, item.id, item.reason.bright_black());
        }
    }
}
