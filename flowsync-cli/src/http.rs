//! Blocking HTTP implementation of [`Transport`] for the management API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use flowsync_core::{
    Chart, ChartNode, Flow, FlowId, Intent, IntentId, Locale, LocaleId, NodeId, ProjectId,
    Sentence, SentenceId, Settings, TaskHandle, TaskId, Transport, TransportError,
};

const API_PREFIX: &str = "/v2.0";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Paged list wrapper returned by every index endpoint.
#[derive(Deserialize)]
struct IndexPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Entry of an id-only index.
#[derive(Deserialize)]
struct IdRef<T> {
    #[serde(rename = "_id")]
    id: T,
}

pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.base_url.clone(), settings.api_key.clone())
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{API_PREFIX}{path}", self.base_url);
        let request = self.agent.request(method, &url);
        match &self.api_key {
            Some(key) => request.set("X-API-Key", key),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        let request = query
            .iter()
            .fold(self.request("GET", path), |req, (k, v)| req.query(k, v));
        tracing::debug!("GET {path}");
        decode(path, request.call())
    }

    fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TransportError> {
        self.get::<IndexPage<T>>(path, query).map(|page| page.items)
    }

    fn patch(&self, path: &str, body: Value) -> Result<(), TransportError> {
        tracing::debug!("PATCH {path}");
        self.request("PATCH", path)
            .send_json(body)
            .map(|_| ())
            .map_err(|err| map_error(path, err))
    }
}

fn decode<T: DeserializeOwned>(
    path: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, TransportError> {
    result
        .map_err(|err| map_error(path, err))?
        .into_json()
        .map_err(|err| TransportError::Decode(format!("{path}: {err}")))
}

fn map_error(path: &str, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(404, _) => TransportError::NotFound(path.to_string()),
        ureq::Error::Status(status, response) => TransportError::Status {
            status,
            message: response
                .into_string()
                .unwrap_or_else(|_| format!("{path} failed")),
        },
        ureq::Error::Transport(transport) => TransportError::Connection(transport.to_string()),
    }
}

impl Transport for HttpTransport {
    fn list_flows(&self, project: &ProjectId) -> Result<Vec<Flow>, TransportError> {
        self.list("/flows", &[("projectId", project.as_str())])
    }

    fn list_locales(&self, project: &ProjectId) -> Result<Vec<Locale>, TransportError> {
        self.list("/locales", &[("projectId", project.as_str())])
    }

    fn read_chart(&self, flow: &FlowId, locale: &LocaleId) -> Result<Chart, TransportError> {
        self.get(
            &format!("/flows/{flow}/chart"),
            &[("resourceType", "flow"), ("preferredLocaleId", locale.as_str())],
        )
    }

    fn read_chart_node(
        &self,
        node: &NodeId,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<ChartNode, TransportError> {
        self.get(
            &format!("/flows/{flow}/chart/nodes/{node}"),
            &[("resourceType", "flow"), ("preferredLocaleId", locale.as_str())],
        )
    }

    fn list_intents(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
        parent: Option<&IntentId>,
    ) -> Result<Vec<IntentId>, TransportError> {
        let mut query = vec![("preferredLocaleId", locale.as_str())];
        if let Some(parent) = parent {
            query.push(("parent", parent.as_str()));
        }
        let refs: Vec<IdRef<IntentId>> = self.list(&format!("/flows/{flow}/intents"), &query)?;
        Ok(refs.into_iter().map(|r| r.id).collect())
    }

    fn read_intent(
        &self,
        intent: &IntentId,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<Intent, TransportError> {
        self.get(
            &format!("/flows/{flow}/intents/{intent}"),
            &[("preferredLocaleId", locale.as_str())],
        )
    }

    fn list_sentences(
        &self,
        flow: &FlowId,
        intent: &IntentId,
        locale: &LocaleId,
    ) -> Result<Vec<SentenceId>, TransportError> {
        let refs: Vec<IdRef<SentenceId>> = self.list(
            &format!("/flows/{flow}/intents/{intent}/sentences"),
            &[("preferredLocaleId", locale.as_str())],
        )?;
        Ok(refs.into_iter().map(|r| r.id).collect())
    }

    fn read_sentence(
        &self,
        flow: &FlowId,
        intent: &IntentId,
        sentence: &SentenceId,
    ) -> Result<Sentence, TransportError> {
        self.get(
            &format!("/flows/{flow}/intents/{intent}/sentences/{sentence}"),
            &[],
        )
    }

    fn update_flow(
        &self,
        flow: &FlowId,
        name: &str,
        locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.patch(
            &format!("/flows/{flow}"),
            json!({ "name": name, "localeId": locale }),
        )
    }

    fn update_chart_node(
        &self,
        flow: &FlowId,
        node: &ChartNode,
        locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.patch(
            &format!("/flows/{flow}/chart/nodes/{}", node.id),
            json!({
                "label": node.label,
                "comment": node.comment,
                "config": node.config,
                "isDisabled": node.is_disabled,
                "isEntryPoint": node.is_entry_point,
                "localeId": locale,
            }),
        )
    }

    fn update_intent(
        &self,
        flow: &FlowId,
        intent: &Intent,
        locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.patch(
            &format!("/flows/{flow}/intents/{}", intent.id),
            json!({
                "name": intent.name,
                "tags": intent.tags,
                "isDisabled": intent.is_disabled,
                "confirmationSentences": intent.confirmation_sentences,
                "condition": intent.condition,
                "rules": intent.rules,
                "childFeatures": intent.child_features,
                "localeId": locale,
            }),
        )
    }

    fn update_sentence(
        &self,
        flow: &FlowId,
        intent: &IntentId,
        sentence: &Sentence,
        locale: &LocaleId,
    ) -> Result<(), TransportError> {
        self.patch(
            &format!("/flows/{flow}/intents/{intent}/sentences/{}", sentence.id),
            json!({
                "text": sentence.text,
                "slots": sentence.slots,
                "localeId": locale,
            }),
        )
    }

    fn train_intents(
        &self,
        flow: &FlowId,
        locale: &LocaleId,
    ) -> Result<TaskHandle, TransportError> {
        let path = format!("/flows/{flow}/intents/train");
        tracing::debug!("POST {path}");
        decode(
            &path,
            self.request("POST", &path)
                .send_json(json!({ "localeId": locale })),
        )
    }

    fn read_task(&self, task: &TaskId) -> Result<TaskHandle, TransportError> {
        self.get(&format!("/tasks/{task}"), &[])
    }
}
