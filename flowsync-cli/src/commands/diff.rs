//! `flowsync diff flow <name>` — compare a pulled flow with the remote.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;

use flowsync_core::ChartNode;
use flowsync_sync::{DiffMode, DiffOutcome, DiffReport, FullReport, JsonChange, NodeReport};

use super::{GlobalOpts, Session};

#[derive(Subcommand, Debug)]
pub enum DiffCommand {
    /// Diff one pulled flow against the remote, per locale.
    Flow {
        /// Flow name.
        name: String,
        /// Comparison granularity: `full` or `node`.
        #[arg(long, default_value = "full")]
        mode: String,
    },
}

pub fn run(command: DiffCommand, opts: &GlobalOpts) -> Result<()> {
    let DiffCommand::Flow { name, mode } = command;
    let mode: DiffMode = match mode.parse() {
        Ok(mode) => mode,
        Err(unsupported) => {
            print!("{unsupported}");
            return Ok(());
        }
    };

    let session = Session::open(opts)?;
    let sync = session.orchestrator();
    let report = sync
        .diff(&name, mode)
        .with_context(|| format!("diff failed for '{name}'"))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &DiffReport) {
    for locale in &report.locales {
        println!(
            "{} {}",
            report.flow.bright_blue().bold(),
            format!("({})", locale.locale.name).yellow()
        );
        if locale.outcome.is_identical() {
            println!("  no differences");
            continue;
        }
        match &locale.outcome {
            DiffOutcome::Full(full) => print_full(full),
            DiffOutcome::Node(nodes) => print_nodes(nodes),
        }
    }
}

fn print_full(report: &FullReport) {
    for line in report.unified_diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{line}");
        }
    }
}

/// Color of one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Added,
    Removed,
    Modified,
}

fn print_nodes(report: &NodeReport) {
    for (tone, line) in node_lines(report) {
        match tone {
            Tone::Plain => println!("{line}"),
            Tone::Added => println!("{}", line.green()),
            Tone::Removed => println!("{}", line.red()),
            Tone::Modified => println!("{}", line.yellow()),
        }
    }
}

/// Changed nodes list their field changes; one-sided nodes are printed in
/// full so they can be copied to the other side.
fn node_lines(report: &NodeReport) -> Vec<(Tone, String)> {
    let mut lines = Vec::new();
    for node in &report.changed {
        lines.push((Tone::Plain, format!("  ~ {} {}", node.id, node.label)));
        for change in &node.changes {
            let tone = match change {
                JsonChange::Added { .. } => Tone::Added,
                JsonChange::Removed { .. } => Tone::Removed,
                JsonChange::Modified { .. } => Tone::Modified,
            };
            lines.push((tone, format!("      {change}")));
        }
    }
    for (nodes, tone, marker, side) in [
        (&report.local_only, Tone::Added, '+', "local only"),
        (&report.remote_only, Tone::Removed, '-', "remote only"),
    ] {
        for node in nodes {
            lines.push((tone, format!("  {marker} {} {} ({side})", node.id, node.label)));
            for line in node_json(node).lines() {
                lines.push((tone, format!("      {line}")));
            }
        }
    }
    lines
}

fn node_json(node: &ChartNode) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    match node.serialize(&mut ser) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("{node:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_node(value: serde_json::Value) -> ChartNode {
        serde_json::from_value(value).expect("node")
    }

    #[test]
    fn one_sided_nodes_are_printed_as_json() {
        let report = NodeReport {
            changed: Vec::new(),
            local_only: vec![chart_node(json!({
                "_id": "n3",
                "label": "Ask",
                "config": {"text": "Name?"}
            }))],
            remote_only: vec![chart_node(json!({"_id": "n4", "label": "Bye"}))],
        };

        let lines = node_lines(&report);

        assert_eq!(lines[0], (Tone::Added, "  + n3 Ask (local only)".to_string()));
        assert_eq!(lines[1], (Tone::Added, "      {".to_string()));
        assert!(lines
            .iter()
            .any(|l| *l == (Tone::Added, "              \"text\": \"Name?\"".to_string())));
        let remote_header = lines
            .iter()
            .position(|(_, l)| l == "  - n4 Bye (remote only)")
            .expect("remote header");
        assert_eq!(lines[remote_header].0, Tone::Removed);
        assert!(lines[remote_header + 1..]
            .iter()
            .all(|(tone, _)| *tone == Tone::Removed));
        assert!(lines[remote_header + 1..]
            .iter()
            .any(|(_, l)| l.contains("\"_id\": \"n4\"")));
        assert_eq!(lines.last().map(|(_, l)| l.as_str()), Some("      }"));
    }

    #[test]
    fn changed_nodes_list_field_changes_only() {
        let report = NodeReport {
            changed: vec![flowsync_sync::diff::ChangedNode {
                id: "n1".into(),
                label: "Start".into(),
                changes: vec![JsonChange::Modified {
                    path: "config.text".into(),
                    remote: json!("Hi"),
                    local: json!("Hello"),
                }],
            }],
            local_only: Vec::new(),
            remote_only: Vec::new(),
        };

        let lines = node_lines(&report);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (Tone::Plain, "  ~ n1 Start".to_string()));
        assert_eq!(lines[1].0, Tone::Modified);
    }
}
