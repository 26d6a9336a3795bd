//! # flowsync-sync
//!
//! Synchronisation and diff engine for the local flow mirror.
//!
//! Build a [`SyncOrchestrator`] around a [`Transport`](flowsync_core::Transport)
//! and a [`LocalStore`], then call [`pull`](SyncOrchestrator::pull),
//! [`push`](SyncOrchestrator::push), [`diff`](SyncOrchestrator::diff), or
//! [`train`](SyncOrchestrator::train).

pub mod diff;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod push;
pub mod reader;
pub mod store;
pub mod train;

pub use diff::{DiffMode, FullReport, JsonChange, NodeReport, UnsupportedMode};
pub use error::SyncError;
pub use orchestrator::{
    DiffOutcome, DiffReport, LocaleDiff, LocaleTraining, PullReport, PulledFlow, PulledLocale,
    SyncOrchestrator,
};
pub use pipeline::FlowScope;
pub use progress::{Budget, Progress, ProgressSink};
pub use push::{
    FlowPush, FlowPushOutcome, ItemKind, LocalePush, LocalePushOutcome, PushReport, PushStats,
    SkippedItem,
};
pub use reader::ResourceTreeReader;
pub use store::LocalStore;
pub use train::{TrainCoordinator, TrainOutcome};
