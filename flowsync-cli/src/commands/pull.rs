//! `flowsync pull` — replace local state with the remote.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use flowsync_sync::{pipeline, Budget, FlowScope, PullReport};

use super::{GlobalOpts, Session};

#[derive(Subcommand, Debug)]
pub enum PullCommand {
    /// Pull every flow of the project, replacing the whole mirror.
    Flows,
    /// Pull a single flow by name.
    Flow {
        /// Flow name as shown remotely.
        name: String,
    },
    /// Refetch the project locales regardless of cache age.
    Locales,
}

#[derive(Tabled)]
struct PullRow {
    #[tabled(rename = "flow")]
    flow: String,
    #[tabled(rename = "locale")]
    locale: String,
    #[tabled(rename = "nodes")]
    nodes: usize,
    #[tabled(rename = "intents")]
    intents: usize,
}

pub fn run(command: PullCommand, opts: &GlobalOpts) -> Result<()> {
    let session = Session::open(opts)?;
    let mut sync = session.orchestrator();

    let scope = match command {
        PullCommand::Locales => {
            let locales = sync
                .refresh_locales()
                .context("failed to refresh locales")?;
            println!("✓ {} locale(s) cached", locales.len());
            for locale in locales {
                println!("  {}", locale.name.yellow());
            }
            return Ok(());
        }
        PullCommand::Flows => FlowScope::All,
        PullCommand::Flow { name } => FlowScope::Flow(name),
    };

    let report = pipeline::pull(&mut sync, &scope, Budget::FULL).with_context(|| match &scope {
        FlowScope::All => "pull failed".to_string(),
        FlowScope::Flow(name) => format!("pull failed for '{name}'"),
    })?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &PullReport) {
    if report.flows.is_empty() {
        println!("No flows found remotely.");
        return;
    }

    let rows: Vec<PullRow> = report
        .flows
        .iter()
        .flat_map(|flow| {
            flow.locales.iter().map(|locale| PullRow {
                flow: flow.name.clone(),
                locale: locale.locale.clone(),
                nodes: locale.nodes,
                intents: locale.intents,
            })
        })
        .collect();

    println!("✓ pulled {} flow(s)", report.flows.len());
    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
}
