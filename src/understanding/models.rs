//! Knowledge graph data model.

use crate::repair::{fields, Repair};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// A theme discussed in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,
    /// 1..=10
    pub importance: u8,
    pub related_content: Vec<String>,
}

/// A named thing (person, organization, concept, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub mentions: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

/// A directed edge between two topics or entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    /// 1..=10
    pub strength: u8,
}

/// Structured understanding of one content package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraph {
    pub id: String,
    pub topics: Vec<Topic>,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub sources: Vec<String>,
}

impl KnowledgeGraph {
    pub fn new(
        topics: Vec<Topic>,
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            id: format!("kg-{}", uuid::Uuid::new_v4()),
            topics,
            entities,
            relationships,
            sources,
        }
    }

    /// Topics by descending importance; ties keep their original order.
    pub fn topics_by_importance(&self) -> Vec<&Topic> {
        let mut topics: Vec<&Topic> = self.topics.iter().collect();
        topics.sort_by(|a, b| b.importance.cmp(&a.importance));
        topics
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && self.entities.is_empty()
    }
}

impl Repair for Topic {
    fn repair(value: &Value, index: usize) -> Self {
        let n = index + 1;
        Self {
            id: fields::string_or(value, &["id"], format!("topic-{}", n)),
            name: fields::string_or(value, &["name", "title"], format!("Topic {}", n)),
            description: fields::string_or(value, &["description"], ""),
            importance: fields::score(value, &["importance"]),
            related_content: fields::string_list(value, &["relatedContent", "related_content"])
                .unwrap_or_default(),
        }
    }
}

impl Repair for Entity {
    fn repair(value: &Value, index: usize) -> Self {
        let n = index + 1;
        let name = fields::string_or(value, &["name"], format!("Entity {}", n));
        Self {
            id: fields::string_or(value, &["id"], format!("entity-{}", n)),
            kind: fields::string_or(value, &["type", "kind", "entityType", "entity_type"], "other"),
            mentions: fields::string_list(value, &["mentions"]).unwrap_or_else(|| vec![name.clone()]),
            attributes: fields::string_map(value, &["attributes"]),
            name,
        }
    }
}

impl Repair for Relationship {
    fn repair(value: &Value, index: usize) -> Self {
        Self {
            id: fields::string_or(value, &["id"], format!("rel-{}", index + 1)),
            source_id: fields::string_or(value, &["sourceId", "source_id", "source"], ""),
            target_id: fields::string_or(value, &["targetId", "target_id", "target"], ""),
            relationship_type: fields::string_or(
                value,
                &["relationshipType", "relationship_type", "type"],
                "related to",
            ),
            strength: fields::score(value, &["strength"]),
        }
    }
}

/// Keep only relationships whose endpoints are known topic or entity ids.
pub fn filter_relationships(
    relationships: Vec<Relationship>,
    topics: &[Topic],
    entities: &[Entity],
) -> (Vec<Relationship>, usize) {
    let known: HashSet<&str> = topics
        .iter()
        .map(|t| t.id.as_str())
        .chain(entities.iter().map(|e| e.id.as_str()))
        .collect();

    let before = relationships.len();
    let kept: Vec<Relationship> = relationships
        .into_iter()
        .filter(|r| known.contains(r.source_id.as_str()) && known.contains(r.target_id.as_str()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::repair_records;

    fn topic(id: &str, importance: u8) -> Topic {
        Topic {
            id: id.to_string(),
            name: format!("Name {}", id),
            description: "desc".to_string(),
            importance,
            related_content: vec!["quote".to_string()],
        }
    }

    #[test]
    fn test_topic_defaults() {
        let topics: Vec<Topic> =
            repair_records(r#"[{"name": " Memory safety ", "importance": "12"}, {"importance": null}]"#).unwrap();
        assert_eq!(topics[0].id, "topic-1");
        assert_eq!(topics[0].name, "Memory safety");
        assert_eq!(topics[0].importance, 10);
        assert!(topics[0].related_content.is_empty());
        assert_eq!(topics[1].name, "Topic 2");
        assert_eq!(topics[1].importance, 5);
    }

    #[test]
    fn test_entity_mentions_default_to_name() {
        let entities: Vec<Entity> =
            repair_records(r#"[{"id": "e1", "name": "Mozilla", "type": "organization", "mentions": "many"}]"#)
                .unwrap();
        assert_eq!(entities[0].mentions, vec!["Mozilla"]);
        assert_eq!(entities[0].kind, "organization");
    }

    #[test]
    fn test_relationship_snake_case_keys() {
        let rels: Vec<Relationship> = repair_records(
            r#"{"relationships": [{"source_id": "t1", "target_id": "e1", "relationship_type": "supports", "strength": 3}]}"#,
        )
        .unwrap();
        assert_eq!(rels[0].id, "rel-1");
        assert_eq!(rels[0].source_id, "t1");
        assert_eq!(rels[0].relationship_type, "supports");
        assert_eq!(rels[0].strength, 3);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let topics = vec![topic("t1", 9), topic("t2", 1)];
        let entities = vec![Entity {
            id: "e1".to_string(),
            name: "Ferris".to_string(),
            kind: "mascot".to_string(),
            mentions: vec![],
            attributes: BTreeMap::from([("color".to_string(), "orange".to_string())]),
        }];
        let rels = vec![Relationship {
            id: "r1".to_string(),
            source_id: "t1".to_string(),
            target_id: "e1".to_string(),
            relationship_type: "features".to_string(),
            strength: 10,
        }];

        let again: Vec<Topic> = repair_records(&serde_json::to_string(&topics).unwrap()).unwrap();
        assert_eq!(again, topics);
        let again: Vec<Entity> = repair_records(&serde_json::to_string(&entities).unwrap()).unwrap();
        assert_eq!(again, entities);
        let again: Vec<Relationship> = repair_records(&serde_json::to_string(&rels).unwrap()).unwrap();
        assert_eq!(again, rels);
    }

    #[test]
    fn test_filter_relationships() {
        let topics = vec![topic("t1", 5)];
        let entities = vec![Entity::repair(&serde_json::json!({"id": "e1", "name": "X"}), 0)];
        let rels: Vec<Relationship> = repair_records(
            r#"[
                {"sourceId": "t1", "targetId": "e1"},
                {"sourceId": "t1", "targetId": "ghost"},
                {"targetId": "e1"}
            ]"#,
        )
        .unwrap();

        let (kept, dropped) = filter_relationships(rels, &topics, &entities);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 2);
        assert!(kept.iter().all(|r| r.source_id == "t1" && r.target_id == "e1"));
    }

    #[test]
    fn test_topics_by_importance_is_stable() {
        let graph = KnowledgeGraph::new(
            vec![topic("a", 5), topic("b", 8), topic("c", 5), topic("d", 8)],
            vec![],
            vec![],
            vec![],
        );
        let order: Vec<&str> = graph.topics_by_importance().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        assert!(graph.id.starts_with("kg-"));
    }
}
