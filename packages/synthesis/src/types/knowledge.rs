//! Cross-document knowledge map types.

use serde::{Deserialize, Serialize};

/// A fact traced back to its source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicFact {
    pub fact: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub source_title: String,
}

/// One topic spanning an owner's documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub facts: Vec<TopicFact>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    #[serde(default)]
    pub source_ids: Vec<String>,
    /// 1..=10, from coverage breadth and depth
    #[serde(default = "default_importance")]
    pub importance: u8,
}

fn default_importance() -> u8 {
    5
}

/// A directed relationship between two topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConnection {
    #[serde(rename = "from")]
    pub from_topic: String,
    #[serde(rename = "to")]
    pub to_topic: String,
    pub relationship: String,
}

/// The knowledge map for one owner.
///
/// `version` strictly increases on every successful rebuild persisted
/// for the owner; `source_count` records how many documents the map
/// was built from, which drives the staleness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeMap {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub connections: Vec<TopicConnection>,
    #[serde(default)]
    pub source_count: usize,
    #[serde(default)]
    pub version: u32,
}

impl KnowledgeMap {
    /// Whether the map carries any topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Sort topics by importance, highest first. Ties keep their
    /// existing relative order so reduction output stays deterministic.
    pub fn sort_topics(&mut self) {
        self.topics.sort_by(|a, b| b.importance.cmp(&a.importance));
    }
}

/// A knowledge map together with read-path staleness information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStatus {
    pub map: KnowledgeMap,
    /// Live document count for the owner at read time
    pub current_source_count: usize,
    /// True when documents were added since the last build
    pub is_stale: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> KnowledgeMap {
        KnowledgeMap {
            topics: vec![
                Topic {
                    name: "Async Rust".into(),
                    description: "Futures, executors, pinning.".into(),
                    facts: vec![TopicFact {
                        fact: "Futures are inert until polled.".into(),
                        source_id: "doc-1".into(),
                        source_title: "Async in depth".into(),
                    }],
                    related_topics: vec!["Tokio".into()],
                    source_ids: vec!["doc-1".into()],
                    importance: 7,
                },
                Topic {
                    name: "Tokio".into(),
                    description: "The async runtime.".into(),
                    facts: vec![],
                    related_topics: vec![],
                    source_ids: vec!["doc-2".into()],
                    importance: 9,
                },
            ],
            connections: vec![TopicConnection {
                from_topic: "Tokio".into(),
                to_topic: "Async Rust".into(),
                relationship: "implements".into(),
            }],
            source_count: 2,
            version: 3,
        }
    }

    #[test]
    fn map_round_trips_value_equal() {
        let map = sample_map();
        let json = serde_json::to_string(&map).unwrap();
        let back: KnowledgeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }

    #[test]
    fn connection_uses_from_to_wire_names() {
        let json = serde_json::to_value(&sample_map().connections[0]).unwrap();
        assert_eq!(json["from"], "Tokio");
        assert_eq!(json["to"], "Async Rust");
    }

    #[test]
    fn sort_topics_orders_by_importance_desc() {
        let mut map = sample_map();
        map.sort_topics();
        assert_eq!(map.topics[0].name, "Tokio");
        assert_eq!(map.topics[1].name, "Async Rust");
    }

    #[test]
    fn parses_sparse_ai_output() {
        let map: KnowledgeMap =
            serde_json::from_str(r#"{"topics": [{"name": "X"}]}"#).unwrap();
        assert_eq!(map.topics[0].importance, 5);
        assert!(map.connections.is_empty());
        assert_eq!(map.version, 0);
    }
}
