//! flowsync core library — domain types, the remote transport seam, settings.
//!
//! - [`types`] — id newtypes, flows, charts, intents, tasks
//! - [`transport`] — the [`Transport`] trait the sync engine drives
//! - [`config`] — load / save `~/.flowsync/config.yaml`
//! - [`error`] — [`TransportError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use config::Settings;
pub use error::{ConfigError, TransportError};
pub use transport::Transport;
pub use types::{
    Chart, ChartNode, Flow, FlowId, HydratedIntent, Intent, IntentId, Locale, LocaleId, NodeId,
    ProjectId, Sentence, SentenceId, TaskHandle, TaskId, TaskStatus,
};
