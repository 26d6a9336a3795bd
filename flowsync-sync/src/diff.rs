//! Structural comparison of local and remote resource trees.
//!
//! Deltas are always rendered from the remote side to the local side:
//! `Added` means present only locally, `Removed` means present only remotely.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};
use similar::TextDiff;

use flowsync_core::{Chart, ChartNode, HydratedIntent, NodeId};

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Granularity of a flow comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// Whole chart and intent forest as one document.
    #[default]
    Full,
    /// Chart nodes matched by id.
    Node,
}

impl DiffMode {
    pub const SUPPORTED: [&'static str; 2] = ["full", "node"];
}

/// Returned when a mode string is neither `full` nor `node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMode(pub String);

impl fmt::Display for UnsupportedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selected mode '{}' not supported. Supported modes:", self.0)?;
        writeln!(f)?;
        for mode in DiffMode::SUPPORTED {
            writeln!(f, "- {mode}")?;
        }
        Ok(())
    }
}

impl std::error::Error for UnsupportedMode {}

impl FromStr for DiffMode {
    type Err = UnsupportedMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "node" => Ok(Self::Node),
            other => Err(UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffMode::Full => write!(f, "full"),
            DiffMode::Node => write!(f, "node"),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON delta
// ---------------------------------------------------------------------------

/// One field-level difference between two JSON documents.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonChange {
    /// Present only on the local side.
    Added { path: String, value: Value },
    /// Present only on the remote side.
    Removed { path: String, value: Value },
    /// Present on both sides with different values.
    Modified {
        path: String,
        remote: Value,
        local: Value,
    },
}

impl JsonChange {
    pub fn path(&self) -> &str {
        match self {
            JsonChange::Added { path, .. }
            | JsonChange::Removed { path, .. }
            | JsonChange::Modified { path, .. } => path,
        }
    }
}

impl fmt::Display for JsonChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = |path: &str| if path.is_empty() { "(root)".to_string() } else { path.to_string() };
        match self {
            JsonChange::Added { path, value } => write!(f, "+ {}: {value}", shown(path)),
            JsonChange::Removed { path, value } => write!(f, "- {}: {value}", shown(path)),
            JsonChange::Modified {
                path,
                remote,
                local,
            } => write!(f, "~ {}: {remote} -> {local}", shown(path)),
        }
    }
}

/// Recursively compare `remote` against `local`.
///
/// Objects are compared key by key, arrays index by index, everything else
/// by value.
pub fn json_delta(remote: &Value, local: &Value) -> Vec<JsonChange> {
    let mut changes = Vec::new();
    delta_into(remote, local, String::new(), &mut changes);
    changes
}

fn delta_into(remote: &Value, local: &Value, path: String, changes: &mut Vec<JsonChange>) {
    match (remote, local) {
        (Value::Object(r), Value::Object(l)) => {
            for (key, r_val) in r {
                let child = join_key(&path, key);
                match l.get(key) {
                    Some(l_val) => delta_into(r_val, l_val, child, changes),
                    None => changes.push(JsonChange::Removed {
                        path: child,
                        value: r_val.clone(),
                    }),
                }
            }
            for (key, l_val) in l {
                if !r.contains_key(key) {
                    changes.push(JsonChange::Added {
                        path: join_key(&path, key),
                        value: l_val.clone(),
                    });
                }
            }
        }
        (Value::Array(r), Value::Array(l)) => {
            for i in 0..r.len().max(l.len()) {
                let child = format!("{path}[{i}]");
                match (r.get(i), l.get(i)) {
                    (Some(r_val), Some(l_val)) => delta_into(r_val, l_val, child, changes),
                    (Some(r_val), None) => changes.push(JsonChange::Removed {
                        path: child,
                        value: r_val.clone(),
                    }),
                    (None, Some(l_val)) => changes.push(JsonChange::Added {
                        path: child,
                        value: l_val.clone(),
                    }),
                    (None, None) => {}
                }
            }
        }
        _ => {
            if remote != local {
                changes.push(JsonChange::Modified {
                    path,
                    remote: remote.clone(),
                    local: local.clone(),
                });
            }
        }
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

// ---------------------------------------------------------------------------
// Full mode
// ---------------------------------------------------------------------------

/// Result of a whole-document comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct FullReport {
    pub changes: Vec<JsonChange>,
    /// Unified diff of the two pretty-printed documents; empty when identical.
    pub unified_diff: String,
}

impl FullReport {
    pub fn is_identical(&self) -> bool {
        self.changes.is_empty()
    }
}

/// The document compared in full mode. Intents are keyed by id, so the order
/// in which the forest was flattened never shows up as a difference.
pub fn full_document(chart: &Chart, intents: &[HydratedIntent]) -> Value {
    let keyed: Map<String, Value> = intents
        .iter()
        .map(|intent| (intent.id().to_string(), json!(intent)))
        .collect();
    json!({
        "chart": chart,
        "intents": keyed,
    })
}

pub fn compare_full(remote: &Value, local: &Value) -> FullReport {
    let changes = json_delta(remote, local);
    if changes.is_empty() {
        return FullReport {
            changes,
            unified_diff: String::new(),
        };
    }

    let remote_text = pretty(remote);
    let local_text = pretty(local);
    let unified_diff = TextDiff::from_lines(&remote_text, &local_text)
        .unified_diff()
        .header("remote", "local")
        .context_radius(3)
        .to_string();

    FullReport {
        changes,
        unified_diff,
    }
}

fn pretty(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    text.push('\n');
    text
}

// ---------------------------------------------------------------------------
// Node mode
// ---------------------------------------------------------------------------

/// A node present on both sides whose content differs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedNode {
    pub id: NodeId,
    /// Label on the local side.
    pub label: String,
    pub changes: Vec<JsonChange>,
}

/// Result of an id-matched node comparison.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeReport {
    pub changed: Vec<ChangedNode>,
    pub local_only: Vec<ChartNode>,
    pub remote_only: Vec<ChartNode>,
}

impl NodeReport {
    pub fn is_identical(&self) -> bool {
        self.changed.is_empty() && self.local_only.is_empty() && self.remote_only.is_empty()
    }

    /// Every node id reported in any of the three categories.
    pub fn differing_ids(&self) -> BTreeSet<NodeId> {
        self.changed
            .iter()
            .map(|c| c.id.clone())
            .chain(self.local_only.iter().map(|n| n.id.clone()))
            .chain(self.remote_only.iter().map(|n| n.id.clone()))
            .collect()
    }
}

/// Match nodes by id and classify each as changed, local-only, or
/// remote-only. Entries follow the order of the side they were found on.
pub fn compare_nodes(remote: &[ChartNode], local: &[ChartNode]) -> NodeReport {
    let remote_by_id: HashMap<&NodeId, &ChartNode> = remote.iter().map(|n| (&n.id, n)).collect();
    let local_by_id: HashMap<&NodeId, &ChartNode> = local.iter().map(|n| (&n.id, n)).collect();

    let mut report = NodeReport::default();

    let mut seen = HashSet::new();
    for node in local {
        if !seen.insert(&node.id) {
            continue;
        }
        let local_node = local_by_id[&node.id];
        match remote_by_id.get(&node.id) {
            Some(remote_node) => {
                if remote_node != &local_node {
                    report.changed.push(ChangedNode {
                        id: node.id.clone(),
                        label: local_node.label.clone(),
                        changes: json_delta(&json!(remote_node), &json!(local_node)),
                    });
                }
            }
            None => report.local_only.push(local_node.clone()),
        }
    }

    let mut seen = HashSet::new();
    for node in remote {
        if seen.insert(&node.id) && !local_by_id.contains_key(&node.id) {
            report.remote_only.push(remote_by_id[&node.id].clone());
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
