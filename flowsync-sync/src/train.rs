//! Intent training: submit a job, then poll its task until it finishes or
//! the caller's timeout elapses.

use std::thread;
use std::time::{Duration, Instant};

use flowsync_core::{FlowId, LocaleId, TaskId, TaskStatus, Transport};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How one locale's training ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainOutcome {
    Trained { task: TaskId, elapsed: Duration },
    TimedOut { task: TaskId, timeout: Duration },
    Failed { task: Option<TaskId>, reason: String },
}

impl TrainOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrainOutcome::Trained { .. })
    }
}

/// Submits training jobs and waits for them.
pub struct TrainCoordinator<'a> {
    transport: &'a dyn Transport,
    poll_interval: Duration,
}

impl<'a> TrainCoordinator<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Train the intents of `flow` in `locale`. Never returns an error: every
    /// failure is an outcome for this locale only.
    pub fn train(&self, flow: &FlowId, locale: &LocaleId, timeout: Duration) -> TrainOutcome {
        let started = Instant::now();
        let mut task = match self.transport.train_intents(flow, locale) {
            Ok(task) => task,
            Err(err) => {
                return TrainOutcome::Failed {
                    task: None,
                    reason: err.to_string(),
                }
            }
        };
        tracing::info!("training {flow} ({locale}) as task {}", task.id);

        loop {
            match task.status {
                TaskStatus::Done => {
                    return TrainOutcome::Trained {
                        task: task.id,
                        elapsed: started.elapsed(),
                    }
                }
                TaskStatus::Error | TaskStatus::Cancelled => {
                    return TrainOutcome::Failed {
                        reason: format!("task ended with status {}", task.status),
                        task: Some(task.id),
                    }
                }
                TaskStatus::Queued | TaskStatus::Active | TaskStatus::Unknown => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                tracing::warn!("task {} still {} after {timeout:?}", task.id, task.status);
                return TrainOutcome::TimedOut {
                    task: task.id,
                    timeout,
                };
            }
            thread::sleep(self.poll_interval.min(timeout - elapsed));

            task = match self.transport.read_task(&task.id) {
                Ok(next) => next,
                Err(err) => {
                    return TrainOutcome::Failed {
                        task: Some(task.id),
                        reason: err.to_string(),
                    }
                }
            };
        }
    }
}
