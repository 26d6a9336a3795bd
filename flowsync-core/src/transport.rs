//! The remote management service, seen as a blocking request/response
//! collaborator.
//!
//! Every call completes before the next one is issued; implementations need
//! not be thread-safe.

use crate::error::TransportError;
use crate::types::{
    Chart, ChartNode, Flow, FlowId, Intent, IntentId, Locale, LocaleId, NodeId, ProjectId,
    Sentence, SentenceId, TaskHandle, TaskId,
};

/// Operations the sync engine needs from the remote service.
pub trait Transport {
    fn list_flows(&self, project: &ProjectId) -> Result<Vec<Flow>, TransportError>;

    fn list_locales(&self, project: &ProjectId) -> Result<Vec<Locale>, TransportError>;

    /// Read the node index of a flow chart. Nodes come back without `config`.
    fn read_chart(&self, flow: &FlowId, locale: &LocaleId) -> Result<Chart, TransportError>;

    /// Read one node including its `config`.
    fn read_chart_node(
        &self,
        node: &NodeId,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<ChartNode, TransportError>;

    /// List intent ids directly under `parent`, or the root intents when
    /// `parent` is `None`.
    fn list_intents(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        parent: Option<&IntentId>,
    ) -> Result<Vec<IntentId>, TransportError>;

    fn read_intent(
        &self,
        intent: &IntentId,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<Intent, TransportError>;

    fn list_sentences(
        &self,
        flow: &FlowId,
        intent: &IntentId,
        locale: &LocaleId,
    ) -> Result<Vec<SentenceId>, TransportError>;

    fn read_sentence(
        &self,
        flow: &FlowId,
        intent: &IntentId,
        sentence: &SentenceId,
    ) -> Result<Sentence, TransportError>;

    /// Update a flow's name and bind it to `locale`.
    fn update_flow(
        &self,
        flow: &FlowId,
        name: &str,
        locale: &LocaleId,
    ) -> Result<(), TransportError>;

    /// Update the mutable fields of a chart node.
    fn update_chart_node(
        &self,
        flow: &FlowId,
        node: &ChartNode,
        locale: &LocaleId,
    ) -> Result<(), TransportError>;

    /// Update the mutable fields of an intent.
    fn update_intent(
        &self,
        flow: &FlowId,
        intent: &Intent,
        locale: &LocaleId,
    ) -> Result<(), TransportError>;

    /// Update a sentence's text and slots.
    fn update_sentence(
        &self,
        flow: &FlowId,
        intent: &IntentId,
        sentence: &Sentence,
        locale: &LocaleId,
    ) -> Result<(), TransportError>;

    /// Submit an intent training job.
    fn train_intents(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<TaskHandle, TransportError>;

    fn read_task(&self, task: &TaskId) -> Result<TaskHandle, TransportError>;
}
