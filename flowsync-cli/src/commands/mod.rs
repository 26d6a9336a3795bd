//! Command handlers and the wiring they share.

pub mod diff;
pub mod pull;
pub mod push;
pub mod train;

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use flowsync_core::{config, Settings};
use flowsync_sync::{Budget, LocalStore, Progress, ProgressSink, SyncOrchestrator};

use crate::http::HttpTransport;

/// Options accepted by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub agent_dir: Option<PathBuf>,
}

/// Resolved settings plus the transport built from them.
pub struct Session {
    pub settings: Settings,
    transport: HttpTransport,
}

impl Session {
    pub fn open(opts: &GlobalOpts) -> Result<Self> {
        let mut settings = config::load().context(
            "failed to load settings; create ~/.flowsync/config.yaml or set FLOWSYNC_* variables",
        )?;
        if let Some(dir) = &opts.agent_dir {
            settings.agent_dir = dir.clone();
        }
        tracing::debug!("agent dir: {}", settings.agent_dir.display());
        let transport = HttpTransport::from_settings(&settings);
        Ok(Self {
            settings,
            transport,
        })
    }

    /// An orchestrator over the configured mirror, with a progress line on
    /// stderr when it is a terminal.
    pub fn orchestrator(&self) -> SyncOrchestrator<'_> {
        let progress = if std::io::stderr().is_terminal() {
            Progress::with_sink(Budget::FULL, Box::new(ProgressLine))
        } else {
            Progress::default()
        };
        SyncOrchestrator::new(
            &self.transport,
            LocalStore::new(&self.settings.agent_dir),
            self.settings.project_id.clone(),
        )
        .with_locale_ttl(Duration::from_secs(self.settings.locale_cache_ttl_secs))
        .with_poll_interval(Duration::from_millis(self.settings.train_poll_interval_ms))
        .with_progress(progress)
    }
}

/// Single-line percentage, rewritten in place.
struct ProgressLine;

impl ProgressSink for ProgressLine {
    fn on_progress(&mut self, consumed: f64, total: f64) {
        let pct = if total > 0.0 { consumed / total * 100.0 } else { 100.0 };
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{pct:5.1}%");
        if total - consumed < 1e-9 {
            let _ = write!(err, "\r      \r");
        }
        let _ = err.flush();
    }
}
