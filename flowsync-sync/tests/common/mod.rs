//! In-memory remote used by the engine tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::{json, Value};

use flowsync_core::{
    Chart, ChartNode, Flow, FlowId, Intent, IntentId, Locale, LocaleId, NodeId, ProjectId,
    Sentence, SentenceId, TaskHandle, TaskId, TaskStatus, Transport, TransportError,
};

pub const PROJECT: &str = "proj-1";

/// A scripted remote service with a call log and injectable failures.
#[derive(Default)]
pub struct FakeRemote {
    pub flows: Vec<Flow>,
    pub locales: Vec<Locale>,
    /// Full nodes (with config); `read_chart` strips the config.
    pub charts: HashMap<(FlowId, LocaleId), Vec<ChartNode>>,
    pub intents: HashMap<FlowId, Vec<Intent>>,
    pub sentences: HashMap<IntentId, Vec<Sentence>>,
    /// Ids (node/intent/sentence) whose update calls fail.
    pub failing_updates: HashSet<String>,
    pub fail_flow_update: bool,
    /// Statuses returned by successive polls of each locale's training task.
    pub train_script: HashMap<LocaleId, Vec<TaskStatus>>,
    pub failing_train: HashSet<LocaleId>,
    polls: RefCell<HashMap<TaskId, VecDeque<TaskStatus>>>,
    calls: RefCell<Vec<String>>,
}

impl FakeRemote {
    pub fn project() -> ProjectId {
        ProjectId::from(PROJECT)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    /// Flow "Greeting" in locale "en-US": two nodes and one intent "hello"
    /// with two sentences.
    pub fn greeting() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut remote = Self::default();
        let flow = flow("f-greet", "Greeting");
        let en = locale("loc-en", "en-US");
        remote.charts.insert(
            (flow.id.clone(), en.id.clone()),
            vec![
                node("n1", "Start", "loc-en", json!({"text": "Welcome"})),
                node("n2", "Say", "loc-en", json!({"text": "Hello!"})),
            ],
        );
        remote.add_intent(&flow.id, intent("i-hello", "hello", None, "loc-en"));
        remote.sentences.insert(
            IntentId::from("i-hello"),
            vec![
                sentence("s1", "hi", Some("loc-en")),
                sentence("s2", "hello there", Some("loc-en")),
            ],
        );
        remote.flows.push(flow);
        remote.locales.push(en);
        remote
    }

    pub fn add_intent(&mut self, flow: &FlowId, intent: Intent) {
        self.intents.entry(flow.clone()).or_default().push(intent);
    }

    fn flow_node(&self, flow: &FlowId, locale: &LocaleId, node: &NodeId) -> Option<&ChartNode> {
        self.charts
            .get(&(flow.clone(), locale.clone()))?
            .iter()
            .find(|n| &n.id == node)
    }

    fn update(&self, call: String, id: &str) -> Result<(), TransportError> {
        self.record(call);
        if self.failing_updates.contains(id) {
            return Err(TransportError::Status {
                status: 500,
                message: format!("cannot update {id}"),
            });
        }
        Ok(())
    }
}

impl Transport for FakeRemote {
    fn list_flows(&self, _project: &ProjectId) -> Result<Vec<Flow>, TransportError> {
        self.record("list_flows".into());
        Ok(self.flows.clone())
    }

    fn list_locales(&self, _project: &ProjectId) -> Result<Vec<Locale>, TransportError> {
        self.record("list_locales".into());
        Ok(self.locales.clone())
    }

    fn read_chart(&self, flow: &FlowId, locale: &LocaleId) -> Result<Chart, TransportError> {
        self.record(format!("read_chart:{flow}:{locale}"));
        let nodes = self
            .charts
            .get(&(flow.clone(), locale.clone()))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|mut node| {
                node.config = None;
                node
            })
            .collect();
        Ok(Chart {
            nodes,
            extra: Default::default(),
        })
    }

    fn read_chart_node(
        &self,
        node: &NodeId,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<ChartNode, TransportError> {
        self.record(format!("read_chart_node:{node}"));
        self.flow_node(flow, locale, node)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(node.to_string()))
    }

    fn list_intents(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        parent: Option<&IntentId>,
    ) -> Result<Vec<IntentId>, TransportError> {
        self.record(format!(
            "list_intents:{}",
            parent.map(|p| p.as_str()).unwrap_or("-")
        ));
        Ok(self
            .intents
            .get(flow)
            .map(|all| {
                all.iter()
                    .filter(|i| i.belongs_to(locale) && i.parent_id.as_ref() == parent)
                    .map(|i| i.id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn read_intent(
        &self,
        intent: &IntentId,
        flow: &FlowId,
        _locale: &LocaleId,
    ) -> Result<Intent, TransportError> {
        self.record(format!("read_intent:{intent}"));
        self.intents
            .get(flow)
            .and_then(|all| all.iter().find(|i| &i.id == intent))
            .cloned()
            .ok_or_else(|| TransportError::NotFound(intent.to_string()))
    }

    fn list_sentences(
        &self,
        _flow: &FlowId,
        intent: &IntentId,
        _locale: &LocaleId,
    ) -> Result<Vec<SentenceId>, TransportError> {
        self.record(format!("list_sentences:{intent}"));
        Ok(self
            .sentences
            .get(intent)
            .map(|all| all.iter().map(|s| s.id.clone()).collect())
            .unwrap_or_default())
    }

    fn read_sentence(
        &self,
        _flow: &FlowId,
        intent: &IntentId,
        sentence: &SentenceId,
    ) -> Result<Sentence, TransportError> {
        self.record(format!("read_sentence:{sentence}"));
        self.sentences
            .get(intent)
            .and_then(|all| all.iter().find(|s| &s.id == sentence))
            .cloned()
            .ok_or_else(|| TransportError::NotFound(sentence.to_string()))
    }

    fn update_flow(
        &self,
        flow: &FlowId,
        name: &str,
        locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.record(format!("update_flow:{flow}:{name}:{locale}"));
        if self.fail_flow_update {
            return Err(TransportError::Connection("connection reset".into()));
        }
        Ok(())
    }

    fn update_chart_node(
        &self,
        _flow: &FlowId,
        node: &ChartNode,
        _locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.update(format!("update_chart_node:{}", node.id), node.id.as_str())
    }

    fn update_intent(
        &self,
        _flow: &FlowId,
        intent: &Intent,
        _locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.update(format!("update_intent:{}", intent.id), intent.id.as_str())
    }

    fn update_sentence(
        &self,
        _flow: &FlowId,
        _intent: &IntentId,
        sentence: &Sentence,
        _locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.update(
            format!("update_sentence:{}", sentence.id),
            sentence.id.as_str(),
        )
    }

    fn train_intents(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<TaskHandle, TransportError> {
        self.record(format!("train_intents:{flow}:{locale}"));
        if self.failing_train.contains(locale) {
            return Err(TransportError::Status {
                status: 503,
                message: "trainer unavailable".into(),
            });
        }
        let id = TaskId::from(format!("task-{locale}"));
        let mut script: VecDeque<TaskStatus> = self
            .train_script
            .get(locale)
            .cloned()
            .unwrap_or_else(|| vec![TaskStatus::Done])
            .into();
        let first = script.pop_front().unwrap_or(TaskStatus::Done);
        self.polls.borrow_mut().insert(id.clone(), script);
        Ok(task(id, first))
    }

    fn read_task(&self, id: &TaskId) -> Result<TaskHandle, TransportError> {
        self.record(format!("read_task:{id}"));
        let mut polls = self.polls.borrow_mut();
        let script = polls
            .get_mut(id)
            .ok_or_else(|| TransportError::NotFound(id.to_string()))?;
        // The last scripted status repeats forever.
        let status = if script.len() > 1 {
            script.pop_front().unwrap_or(TaskStatus::Active)
        } else {
            script.front().copied().unwrap_or(TaskStatus::Active)
        };
        Ok(task(id.clone(), status))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("fixture")
}

pub fn flow(id: &str, name: &str) -> Flow {
    from_json(json!({"_id": id, "name": name, "projectId": PROJECT}))
}

pub fn locale(id: &str, name: &str) -> Locale {
    from_json(json!({"_id": id, "name": name}))
}

pub fn node(id: &str, label: &str, locale: &str, config: Value) -> ChartNode {
    from_json(json!({
        "_id": id,
        "label": label,
        "type": "say",
        "config": config,
        "localeReference": locale
    }))
}

pub fn intent(id: &str, name: &str, parent: Option<&str>, locale: &str) -> Intent {
    let mut raw = json!({"_id": id, "name": name, "localeReference": locale});
    if let Some(parent) = parent {
        raw["parentId"] = json!(parent);
    }
    from_json(raw)
}

pub fn sentence(id: &str, text: &str, locale: Option<&str>) -> Sentence {
    let mut raw = json!({"_id": id, "text": text, "slots": []});
    if let Some(locale) = locale {
        raw["localeReference"] = json!(locale);
    }
    from_json(raw)
}

fn task(id: TaskId, status: TaskStatus) -> TaskHandle {
    TaskHandle {
        id,
        status,
        extra: Default::default(),
    }
}
