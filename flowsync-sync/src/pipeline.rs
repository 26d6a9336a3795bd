//! Scope dispatch shared by the `pull` and `push` commands.

use crate::orchestrator::{PullReport, SyncOrchestrator};
use crate::progress::Budget;
use crate::push::PushReport;
use crate::SyncError;

/// Which flows a pull or push covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowScope {
    /// Every flow (remote flows for pull, mirrored flow directories for push).
    All,
    /// A single named flow.
    Flow(String),
}

/// Run a pull for `scope`, spending `budget` of the orchestrator's progress.
pub fn pull(
    orchestrator: &mut SyncOrchestrator<'_>,
    scope: &FlowScope,
    budget: Budget,
) -> Result<PullReport, SyncError> {
    match scope {
        FlowScope::All => orchestrator.pull(budget),
        FlowScope::Flow(name) => orchestrator.pull_one(name, budget),
    }
}

/// Run a push for `scope`, spending `budget` of the orchestrator's progress.
pub fn push(
    orchestrator: &mut SyncOrchestrator<'_>,
    scope: &FlowScope,
    budget: Budget,
) -> Result<PushReport, SyncError> {
    match scope {
        FlowScope::All => orchestrator.push(budget),
        FlowScope::Flow(name) => orchestrator.push_one(name, budget),
    }
}
