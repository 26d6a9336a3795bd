//! Top-level driver for `pull`, `diff`, and `train` (`push` lives in
//! [`crate::push`]).
//!
//! A [`SyncOrchestrator`] is the context threaded through every step: the
//! transport, the local mirror, the project, and the progress counter. It
//! never terminates the process; fatal conditions come back as
//! [`SyncError`]s and the command layer decides what to do with them.

use std::time::Duration;

use flowsync_core::{Chart, Flow, HydratedIntent, Locale, ProjectId, Transport};

use crate::diff::{compare_full, compare_nodes, full_document, DiffMode, FullReport, NodeReport};
use crate::error::SyncError;
use crate::progress::{Budget, Progress};
use crate::reader::ResourceTreeReader;
use crate::store::{validate_name, LocalStore, DEFAULT_LOCALE_TTL};
use crate::train::{TrainCoordinator, TrainOutcome, DEFAULT_POLL_INTERVAL};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What a pull wrote to disk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PullReport {
    pub flows: Vec<PulledFlow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledFlow {
    pub name: String,
    pub locales: Vec<PulledLocale>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledLocale {
    pub locale: String,
    pub nodes: usize,
    pub intents: usize,
}

/// Comparison result for one locale.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    Full(FullReport),
    Node(NodeReport),
}

impl DiffOutcome {
    pub fn is_identical(&self) -> bool {
        match self {
            DiffOutcome::Full(report) => report.is_identical(),
            DiffOutcome::Node(report) => report.is_identical(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocaleDiff {
    pub locale: Locale,
    pub outcome: DiffOutcome,
}

/// Comparison result for one flow across all cached locales.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffReport {
    pub flow: String,
    pub mode: DiffMode,
    pub locales: Vec<LocaleDiff>,
}

impl DiffReport {
    pub fn differs(&self) -> bool {
        self.locales.iter().any(|l| !l.outcome.is_identical())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocaleTraining {
    pub locale: Locale,
    pub outcome: TrainOutcome,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct SyncOrchestrator<'a> {
    pub(crate) transport: &'a dyn Transport,
    pub(crate) store: LocalStore,
    pub(crate) project: ProjectId,
    pub(crate) locale_ttl: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) progress: Progress,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(transport: &'a dyn Transport, store: LocalStore, project: ProjectId) -> Self {
        Self {
            transport,
            store,
            project,
            locale_ttl: DEFAULT_LOCALE_TTL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            progress: Progress::default(),
        }
    }

    pub fn with_locale_ttl(mut self, ttl: Duration) -> Self {
        self.locale_ttl = ttl;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    // -----------------------------------------------------------------------
    // pull
    // -----------------------------------------------------------------------

    /// Replace the whole local mirror with every remote flow.
    pub fn pull(&mut self, budget: Budget) -> Result<PullReport, SyncError> {
        let flows = self.transport.list_flows(&self.project)?;
        for flow in &flows {
            validate_name("flow", &flow.name)?;
        }
        self.store.ensure_empty_dir(&self.store.flows_dir())?;

        let mut report = PullReport::default();
        if flows.is_empty() {
            self.progress.consume(budget);
            return Ok(report);
        }

        let per_flow = budget.split(flows.len());
        for flow in &flows {
            report.flows.push(self.pull_flow(flow, per_flow)?);
        }
        Ok(report)
    }

    /// Replace one flow's local mirror. Fails with
    /// [`SyncError::FlowNotFound`] if no remote flow has that name.
    pub fn pull_one(&mut self, flow_name: &str, budget: Budget) -> Result<PullReport, SyncError> {
        let flow = self
            .transport
            .list_flows(&self.project)?
            .into_iter()
            .find(|flow| flow.name == flow_name)
            .ok_or_else(|| SyncError::FlowNotFound {
                name: flow_name.to_string(),
            })?;

        Ok(PullReport {
            flows: vec![self.pull_flow(&flow, budget)?],
        })
    }

    fn pull_flow(&mut self, flow: &Flow, budget: Budget) -> Result<PulledFlow, SyncError> {
        tracing::info!("pulling flow {} ({})", flow.name, flow.id);
        validate_name("flow", &flow.name)?;
        let locales = self.locales()?;
        for locale in &locales {
            validate_name("locale", &locale.name)?;
        }

        let flow_dir = self.store.flow_dir(&flow.name);
        self.store.ensure_empty_dir(&flow_dir)?;
        self.store
            .write_json(&self.store.config_path(&flow.name), flow)?;

        let mut pulled = PulledFlow {
            name: flow.name.clone(),
            locales: Vec::new(),
        };
        if locales.is_empty() {
            self.progress.consume(budget);
            return Ok(pulled);
        }

        let reader = ResourceTreeReader::new(self.transport);
        let per_locale = budget.split(locales.len());
        for locale in &locales {
            self.store
                .ensure_empty_dir(&self.store.locale_dir(&flow.name, &locale.name))?;

            let chart =
                reader.fetch_chart(&flow.id, &locale.id, per_locale.half(), &mut self.progress)?;
            self.store
                .write_json(&self.store.chart_path(&flow.name, &locale.name), &chart)?;

            let intents = reader.fetch_intent_forest(
                &flow.id,
                &locale.id,
                per_locale.half(),
                &mut self.progress,
            )?;
            self.store
                .write_json(&self.store.intents_path(&flow.name, &locale.name), &intents)?;

            pulled.locales.push(PulledLocale {
                locale: locale.name.clone(),
                nodes: chart.nodes.len(),
                intents: intents.len(),
            });
        }
        Ok(pulled)
    }

    /// Project locales through the TTL cache.
    pub fn locales(&self) -> Result<Vec<Locale>, SyncError> {
        self.store
            .get_locales(self.transport, &self.project, self.locale_ttl)
    }

    /// Refetch project locales regardless of cache age.
    pub fn refresh_locales(&self) -> Result<Vec<Locale>, SyncError> {
        self.store.refresh_locales(self.transport, &self.project)
    }

    // -----------------------------------------------------------------------
    // diff
    // -----------------------------------------------------------------------

    /// Compare a pulled flow against the remote, locale by locale.
    ///
    /// All local state is checked before the first remote read, so a missing
    /// file stops the command without a partial report.
    pub fn diff(&self, flow_name: &str, mode: DiffMode) -> Result<DiffReport, SyncError> {
        validate_name("flow", flow_name)?;
        let locales = self
            .store
            .cached_locales()?
            .ok_or_else(|| SyncError::MissingLocales {
                path: self.store.locales_path(),
            })?;

        let flow_dir = self.store.flow_dir(flow_name);
        let config_path = self.store.config_path(flow_name);
        for locale in &locales {
            validate_name("locale", &locale.name)?;
            let chart_path = self.store.chart_path(flow_name, &locale.name);
            let missing = [&flow_dir, &config_path, &chart_path]
                .into_iter()
                .find(|path| !path.exists());
            if let Some(path) = missing {
                return Err(SyncError::MissingLocalState {
                    flow: flow_name.to_string(),
                    locale: Some(locale.name.clone()),
                    path: path.clone(),
                });
            }
        }

        let config: Flow = self
            .store
            .read_json_opt(&config_path)?
            .ok_or_else(|| SyncError::MissingLocalState {
                flow: flow_name.to_string(),
                locale: None,
                path: config_path.clone(),
            })?;
        let reader = ResourceTreeReader::new(self.transport);
        let mut scratch = Progress::default();

        let mut report = DiffReport {
            flow: flow_name.to_string(),
            mode,
            locales: Vec::new(),
        };
        for locale in locales {
            let local_chart: Chart = self
                .store
                .read_json(&self.store.chart_path(flow_name, &locale.name))?;
            let remote_chart =
                reader.fetch_chart(&config.id, &locale.id, Budget::ZERO, &mut scratch)?;

            let outcome = match mode {
                DiffMode::Node => {
                    DiffOutcome::Node(compare_nodes(&remote_chart.nodes, &local_chart.nodes))
                }
                DiffMode::Full => {
                    let local_intents: Vec<HydratedIntent> = self
                        .store
                        .read_json_opt(&self.store.intents_path(flow_name, &locale.name))?
                        .unwrap_or_default();
                    let remote_intents = reader.fetch_intent_forest(
                        &config.id,
                        &locale.id,
                        Budget::ZERO,
                        &mut scratch,
                    )?;
                    DiffOutcome::Full(compare_full(
                        &full_document(&remote_chart, &remote_intents),
                        &full_document(&local_chart, &local_intents),
                    ))
                }
            };
            report.locales.push(LocaleDiff { locale, outcome });
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // train
    // -----------------------------------------------------------------------

    /// Train a pulled flow in every project locale. A failure or timeout in
    /// one locale does not stop the others.
    pub fn train(
        &self,
        flow_name: &str,
        timeout: Duration,
    ) -> Result<Vec<LocaleTraining>, SyncError> {
        validate_name("flow", flow_name)?;
        let config_path = self.store.config_path(flow_name);
        let config: Flow = self
            .store
            .read_json_opt(&config_path)?
            .ok_or_else(|| SyncError::MissingLocalState {
                flow: flow_name.to_string(),
                locale: None,
                path: config_path.clone(),
            })?;

        let coordinator =
            TrainCoordinator::new(self.transport).with_poll_interval(self.poll_interval);
        Ok(self
            .locales()?
            .into_iter()
            .map(|locale| {
                let outcome = coordinator.train(&config.id, &locale.id, timeout);
                LocaleTraining { locale, outcome }
            })
            .collect())
    }
}
