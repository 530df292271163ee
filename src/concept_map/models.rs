//! Data models for concept maps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder label given to every new edge
pub const DEFAULT_EDGE_LABEL: &str = "related to";

/// Renderer node type for keyword nodes
pub const KEYWORD_NODE_TYPE: &str = "custom";

/// Renderer edge type for labelled edges
pub const EDGE_TYPE: &str = "editable";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Join key back to notes' confirmed keywords
    #[serde(default)]
    pub label: String,
    /// Full text of free-text nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn label(&self) -> &str {
        &self.data.label
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Mirror of `data.label` read by older renderers
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
        self.data.label = label.to_string();
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMap {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ConceptMap {
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.nodes.iter().any(|n| n.data.label == label)
    }

    pub fn summary(&self) -> MapSummary {
        MapSummary {
            id: self.id.clone(),
            name: self.title.clone(),
        }
    }
}

/// Entry in the map listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSummary {
    pub id: String,
    pub name: String,
}
