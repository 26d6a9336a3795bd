//! Materialises remote charts and intent forests.
//!
//! The chart index omits node configuration, so every node is read again.
//! Intent forests are walked depth-first with an explicit stack, so nesting
//! depth is bounded by memory rather than by the call stack.

use flowsync_core::{
    Chart, FlowId, HydratedIntent, Intent, IntentId, LocaleId, Sentence, Transport, TransportError,
};

use crate::progress::{Budget, Progress};

/// Reads remote resource trees through a [`Transport`].
pub struct ResourceTreeReader<'a> {
    transport: &'a dyn Transport,
}

/// An intent whose children are still being walked.
struct OpenIntent {
    intent: Intent,
    children: std::vec::IntoIter<IntentId>,
}

impl<'a> ResourceTreeReader<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Fetch a chart and fill in every node's `config`, keeping node order.
    ///
    /// `budget` is split evenly across the nodes; an empty chart consumes it
    /// in one step.
    pub fn fetch_chart(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        budget: Budget,
        progress: &mut Progress,
    ) -> Result<Chart, TransportError> {
        let mut chart = self.transport.read_chart(flow, locale)?;
        tracing::debug!("chart of {flow} ({locale}): {} nodes", chart.nodes.len());

        if chart.nodes.is_empty() {
            progress.consume(budget);
            return Ok(chart);
        }

        let per_node = budget.split(chart.nodes.len());
        for node in &mut chart.nodes {
            let full = self.transport.read_chart_node(&node.id, flow, locale)?;
            node.config = full.config;
            progress.consume(per_node);
        }
        Ok(chart)
    }

    /// Fetch every intent of a flow in one locale, flattened.
    ///
    /// Each intent appears exactly once, after all of its descendants, with
    /// its sentences populated. `budget` is split across the root intents;
    /// descendants are paid for by their root.
    pub fn fetch_intent_forest(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        budget: Budget,
        progress: &mut Progress,
    ) -> Result<Vec<HydratedIntent>, TransportError> {
        let roots = self.transport.list_intents(flow, locale, None)?;
        if roots.is_empty() {
            progress.consume(budget);
            return Ok(vec![]);
        }

        let per_root = budget.split(roots.len());
        let mut intents = Vec::new();
        for root in roots {
            intents.extend(self.fetch_intent_tree(flow, locale, root)?);
            progress.consume(per_root);
        }
        Ok(intents)
    }

    /// Walk one root intent and its descendants in post-order.
    fn fetch_intent_tree(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        root: IntentId,
    ) -> Result<Vec<HydratedIntent>, TransportError> {
        let mut out = Vec::new();
        let mut stack = vec![self.open_intent(flow, locale, &root)?];

        while let Some(top) = stack.last_mut() {
            if let Some(child) = top.children.next() {
                let opened = self.open_intent(flow, locale, &child)?;
                stack.push(opened);
                continue;
            }
            let Some(done) = stack.pop() else { break };
            let sentences = self.fetch_sentences(flow, locale, &done.intent.id)?;
            out.push(HydratedIntent {
                intent: done.intent,
                sentences,
            });
        }
        Ok(out)
    }

    fn open_intent(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        id: &IntentId,
    ) -> Result<OpenIntent, TransportError> {
        let intent = self.transport.read_intent(id, flow, locale)?;
        let children = self.transport.list_intents(flow, locale, Some(id))?;
        tracing::debug!("intent {id}: {} children", children.len());
        Ok(OpenIntent {
            intent,
            children: children.into_iter(),
        })
    }

    fn fetch_sentences(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        intent: &IntentId,
    ) -> Result<Vec<Sentence>, TransportError> {
        self.transport
            .list_sentences(flow, intent, locale)?
            .iter()
            .map(|sentence| self.transport.read_sentence(flow, intent, sentence))
            .collect()
    }
}
