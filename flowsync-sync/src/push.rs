//! `push`: write the local mirror back to the remote.
//!
//! The mirror is the source of truth. Per locale, the flow's name/locale
//! binding is updated first; that call is fatal on failure. Nodes, intents,
//! and sentences owned by the locale are then updated one by one, and a
//! failure on any of them is recorded as a [`SkippedItem`] without stopping
//! the traversal; an intent that fails is skipped together with its
//! sentences. Items owned by other locales are filtered out.

use std::fmt;

use serde::de::DeserializeOwned;

use flowsync_core::{Chart, Flow, HydratedIntent, Locale};

use crate::error::SyncError;
use crate::orchestrator::SyncOrchestrator;
use crate::progress::Budget;
use crate::store::validate_name;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Node,
    Intent,
    Sentence,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Node => write!(f, "node"),
            ItemKind::Intent => write!(f, "intent"),
            ItemKind::Sentence => write!(f, "sentence"),
        }
    }
}

/// An item whose update failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub kind: ItemKind,
    pub id: String,
    pub reason: String,
}

/// Counters for one pushed locale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushStats {
    pub nodes_updated: usize,
    pub intents_updated: usize,
    pub sentences_updated: usize,
    /// Items owned by another locale.
    pub filtered: usize,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalePushOutcome {
    Pushed(PushStats),
    /// The locale's chart or intents file is missing or unreadable.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalePush {
    pub locale: String,
    pub outcome: LocalePushOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowPushOutcome {
    Pushed { locales: Vec<LocalePush> },
    /// `config.json` or `locales.json` is missing or unreadable.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowPush {
    pub name: String,
    pub outcome: FlowPushOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushReport {
    pub flows: Vec<FlowPush>,
}

impl PushReport {
    /// Every item skipped because its update failed, across all flows.
    pub fn skipped_items(&self) -> impl Iterator<Item = &SkippedItem> {
        self.flows
            .iter()
            .filter_map(|flow| match &flow.outcome {
                FlowPushOutcome::Pushed { locales } => Some(locales),
                FlowPushOutcome::Skipped { .. } => None,
            })
            .flatten()
            .filter_map(|locale| match &locale.outcome {
                LocalePushOutcome::Pushed(stats) => Some(&stats.skipped),
                LocalePushOutcome::Skipped { .. } => None,
            })
            .flatten()
    }

    /// Names of flows that were skipped entirely.
    pub fn skipped_flows(&self) -> Vec<&str> {
        self.flows
            .iter()
            .filter(|flow| matches!(flow.outcome, FlowPushOutcome::Skipped { .. }))
            .map(|flow| flow.name.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// push
// ---------------------------------------------------------------------------

impl SyncOrchestrator<'_> {
    /// Push every flow directory in the mirror.
    pub fn push(&mut self, budget: Budget) -> Result<PushReport, SyncError> {
        let names = self.store.list_flow_dirs()?;
        let mut report = PushReport::default();
        if names.is_empty() {
            self.progress.consume(budget);
            return Ok(report);
        }

        let per_flow = budget.split(names.len());
        for name in &names {
            report.flows.push(self.push_flow(name, per_flow)?);
        }
        Ok(report)
    }

    /// Push one flow directory. A flow without usable local state is
    /// reported as skipped, not as an error.
    pub fn push_one(&mut self, flow_name: &str, budget: Budget) -> Result<PushReport, SyncError> {
        Ok(PushReport {
            flows: vec![self.push_flow(flow_name, budget)?],
        })
    }

    fn push_flow(&mut self, flow_name: &str, budget: Budget) -> Result<FlowPush, SyncError> {
        validate_name("flow", flow_name)?;
        let skipped = |reason: String| FlowPush {
            name: flow_name.to_string(),
            outcome: FlowPushOutcome::Skipped { reason },
        };

        let config = match self.read_required::<Flow>(&self.store.config_path(flow_name)) {
            Ok(config) => config,
            Err(reason) => {
                tracing::warn!("skipping flow {flow_name}: {reason}");
                self.progress.consume(budget);
                return Ok(skipped(reason));
            }
        };
        let locales = match self.read_required::<Vec<Locale>>(&self.store.locales_path()) {
            Ok(locales) => locales,
            Err(reason) => {
                tracing::warn!("skipping flow {flow_name}: {reason}");
                self.progress.consume(budget);
                return Ok(skipped(reason));
            }
        };

        tracing::info!("pushing flow {flow_name} ({})", config.id);
        let mut pushed = Vec::with_capacity(locales.len());
        if locales.is_empty() {
            self.progress.consume(budget);
        }
        let per_locale = budget.split(locales.len());
        for locale in &locales {
            pushed.push(self.push_locale(flow_name, &config, locale, per_locale)?);
        }

        Ok(FlowPush {
            name: flow_name.to_string(),
            outcome: FlowPushOutcome::Pushed { locales: pushed },
        })
    }

    fn push_locale(
        &mut self,
        flow_name: &str,
        config: &Flow,
        locale: &Locale,
        budget: Budget,
    ) -> Result<LocalePush, SyncError> {
        validate_name("locale", &locale.name)?;
        let chart_path = self.store.chart_path(flow_name, &locale.name);
        let intents_path = self.store.intents_path(flow_name, &locale.name);
        let files = self.read_required::<Chart>(&chart_path).and_then(|chart| {
            self.read_required::<Vec<HydratedIntent>>(&intents_path)
                .map(|intents| (chart, intents))
        });
        let (chart, intents) = match files {
            Ok(files) => files,
            Err(reason) => {
                tracing::warn!("skipping {flow_name} ({}): {reason}", locale.name);
                self.progress.consume(budget);
                return Ok(LocalePush {
                    locale: locale.name.clone(),
                    outcome: LocalePushOutcome::Skipped { reason },
                });
            }
        };

        self.transport
            .update_flow(&config.id, &config.name, &locale.id)
            .map_err(|source| SyncError::FlowUpdate {
                flow: flow_name.to_string(),
                locale: locale.id.clone(),
                source,
            })?;

        let mut stats = PushStats::default();
        let flow = &config.id;

        let node_budget = budget.half();
        if chart.nodes.is_empty() {
            self.progress.consume(node_budget);
        }
        let per_node = node_budget.split(chart.nodes.len());
        for node in &chart.nodes {
            if !node.belongs_to(&locale.id) {
                stats.filtered += 1;
            } else {
                match self.transport.update_chart_node(flow, node, &locale.id) {
                    Ok(()) => stats.nodes_updated += 1,
                    Err(err) => stats.skipped.push(SkippedItem {
                        kind: ItemKind::Node,
                        id: node.id.to_string(),
                        reason: err.to_string(),
                    }),
                }
            }
            self.progress.consume(per_node);
        }

        let intent_budget = budget.half();
        if intents.is_empty() {
            self.progress.consume(intent_budget);
        }
        let per_intent = intent_budget.split(intents.len());
        for hydrated in &intents {
            let intent = &hydrated.intent;
            if !intent.belongs_to(&locale.id) {
                stats.filtered += 1;
                self.progress.consume(per_intent);
                continue;
            }

            // A failed intent takes its sentences with it.
            if let Err(err) = self.transport.update_intent(flow, intent, &locale.id) {
                stats.skipped.push(SkippedItem {
                    kind: ItemKind::Intent,
                    id: intent.id.to_string(),
                    reason: err.to_string(),
                });
                self.progress.consume(per_intent);
                continue;
            }
            stats.intents_updated += 1;

            for sentence in &hydrated.sentences {
                if !sentence.applies_to(&locale.id) {
                    stats.filtered += 1;
                    continue;
                }
                match self
                    .transport
                    .update_sentence(flow, &intent.id, sentence, &locale.id)
                {
                    Ok(()) => stats.sentences_updated += 1,
                    Err(err) => stats.skipped.push(SkippedItem {
                        kind: ItemKind::Sentence,
                        id: sentence.id.to_string(),
                        reason: err.to_string(),
                    }),
                }
            }
            self.progress.consume(per_intent);
        }

        for item in &stats.skipped {
            tracing::warn!("skipped {} {}: {}", item.kind, item.id, item.reason);
        }
        Ok(LocalePush {
            locale: locale.name.clone(),
            outcome: LocalePushOutcome::Pushed(stats),
        })
    }

    /// Read a mirror file that push cannot do without; the error is the
    /// human-readable reason the owning flow or locale is skipped.
    fn read_required<T: DeserializeOwned>(&self, path: &std::path::Path) -> Result<T, String> {
        match self.store.read_json_opt::<T>(path) {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => Err(format!("missing {}", path.display())),
            Err(err) => Err(err.to_string()),
        }
    }
}
