//! Domain types for flows, charts, and intents.
//!
//! Field names follow the remote service's JSON (`_id`, camelCase), so the
//! same structs are used for transport payloads and for the on-disk mirror.
//! Fields this crate does not interpret are carried through `extra` so a
//! pull/push round trip never drops data.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Read an explicit `null` as the field's default, the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

id_newtype!(
    /// Identifier of the project (agent) that owns flows and locales.
    ProjectId
);
id_newtype!(FlowId);
id_newtype!(LocaleId);
id_newtype!(NodeId);
id_newtype!(IntentId);
id_newtype!(SentenceId);
id_newtype!(
    /// Handle of an asynchronous remote job.
    TaskId
);

// ---------------------------------------------------------------------------
// Flows and locales
// ---------------------------------------------------------------------------

/// A flow as listed by the remote service. Written verbatim to `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(rename = "_id")]
    pub id: FlowId,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A project-wide language/region variant. Cached in `locales.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    #[serde(rename = "_id")]
    pub id: LocaleId,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// One element of a flow chart.
///
/// `config` is absent in the chart index and filled in by a per-node read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartNode {
    #[serde(rename = "_id")]
    pub id: NodeId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_disabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_entry_point: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_reference: Option<LocaleId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChartNode {
    /// Whether this node is owned by `locale`. Nodes without a locale
    /// reference belong to no locale.
    pub fn belongs_to(&self, locale: &LocaleId) -> bool {
        self.locale_reference.as_ref() == Some(locale)
    }
}

/// The node graph of one flow in one locale. Written to `chart.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<ChartNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Intents and sentences
// ---------------------------------------------------------------------------

/// An intent as returned by a single read, before its sentences are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    #[serde(rename = "_id")]
    pub id: IntentId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<IntentId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_disabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmation_sentences: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub condition: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub child_features: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_reference: Option<LocaleId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Intent {
    pub fn belongs_to(&self, locale: &LocaleId) -> bool {
        self.locale_reference.as_ref() == Some(locale)
    }
}

/// An intent together with all of its sentences. Entries of `intents.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydratedIntent {
    #[serde(flatten)]
    pub intent: Intent,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentences: Vec<Sentence>,
}

impl HydratedIntent {
    pub fn id(&self) -> &IntentId {
        &self.intent.id
    }
}

/// A labelled training example belonging to one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    #[serde(rename = "_id")]
    pub id: SentenceId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slots: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_reference: Option<LocaleId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sentence {
    /// Sentences without their own locale reference inherit their intent's.
    pub fn applies_to(&self, locale: &LocaleId) -> bool {
        self.locale_reference.as_ref().map_or(true, |l| l == locale)
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Lifecycle state of a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Queued,
    Active,
    Done,
    Error,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Whether the task has stopped running, successfully or not.
    pub fn is_finished(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Active => write!(f, "active"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Error => write!(f, "error"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
            TaskStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// An asynchronous remote job, as returned on submission and on each poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHandle {
    #[serde(rename = "_id")]
    pub id: TaskId,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
