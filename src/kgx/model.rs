use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::KgError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KgxNode {
    pub id: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub xref: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub synonym: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub provided_by: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub in_taxon: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KgxEdge {
    #[serde(default)]
    pub id: Option<String>,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub knowledge_level: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub primary_knowledge_source: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub aggregator_knowledge_source: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl KgxNode {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: vec![category.into()],
            ..Self::default()
        }
    }

    pub fn to_record(&self) -> Result<BTreeMap<String, Value>, KgError> {
        to_record(self)
    }

    pub fn from_record(record: Map<String, Value>) -> Result<Self, KgError> {
        let node: KgxNode = serde_json::from_value(Value::Object(record))
            .map_err(|err| KgError::JsonLines(err.to_string()))?;
        if node.id.trim().is_empty() {
            return Err(KgError::JsonLines("node without id".to_string()));
        }
        Ok(node)
    }

    pub fn absorb(&mut self, other: KgxNode) {
        union_into(&mut self.category, other.category);
        override_scalar(&mut self.name, other.name);
        override_scalar(&mut self.description, other.description);
        union_into(&mut self.xref, other.xref);
        union_into(&mut self.synonym, other.synonym);
        union_into(&mut self.provided_by, other.provided_by);
        union_into(&mut self.in_taxon, other.in_taxon);
        merge_extra(&mut self.extra, other.extra);
    }
}

impl KgxEdge {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            ..Self::default()
        }
    }

    pub fn to_record(&self) -> Result<BTreeMap<String, Value>, KgError> {
        to_record(self)
    }

    pub fn from_record(record: Map<String, Value>) -> Result<Self, KgError> {
        let edge: KgxEdge = serde_json::from_value(Value::Object(record))
            .map_err(|err| KgError::JsonLines(err.to_string()))?;
        Ok(edge)
    }

    pub fn absorb(&mut self, other: KgxEdge) {
        if self.id.is_none() {
            self.id = other.id;
        }
        union_into(&mut self.category, other.category);
        override_scalar(&mut self.relation, other.relation);
        override_scalar(&mut self.knowledge_level, other.knowledge_level);
        override_scalar(&mut self.agent_type, other.agent_type);
        override_scalar(&mut self.primary_knowledge_source, other.primary_knowledge_source);
        union_into(
            &mut self.aggregator_knowledge_source,
            other.aggregator_knowledge_source,
        );
        merge_extra(&mut self.extra, other.extra);
    }
}

fn to_record<T: Serialize>(value: &T) -> Result<BTreeMap<String, Value>, KgError> {
    let value = serde_json::to_value(value).map_err(|err| KgError::JsonLines(err.to_string()))?;
    let Value::Object(map) = value else {
        return Err(KgError::JsonLines("graph element is not an object".to_string()));
    };
    Ok(map
        .into_iter()
        .filter(|(_, value)| !is_empty_value(value))
        .collect())
}

pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub(crate) fn union_into<T: PartialEq>(target: &mut Vec<T>, incoming: Vec<T>) {
    for item in incoming {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn override_scalar(target: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        if !value.trim().is_empty() {
            *target = Some(value);
        }
    }
}

fn merge_extra(target: &mut BTreeMap<String, Value>, incoming: BTreeMap<String, Value>) {
    for (key, value) in incoming {
        if is_empty_value(&value) {
            continue;
        }
        match (target.get_mut(&key), value) {
            (Some(Value::Array(existing)), Value::Array(items)) => union_into(existing, items),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) if value.trim().is_empty() => Vec::new(),
        OneOrMany::One(value) => value.split('|').map(str::to_string).collect(),
        OneOrMany::Many(values) => values,
        OneOrMany::Missing(()) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn record_omits_empty_attributes() {
        let mut node = KgxNode::new("NCBITaxon:408", "biolink:OrganismTaxon");
        node.name = Some(String::new());
        node.extra.insert("note".to_string(), Value::Null);
        node.extra.insert("rank".to_string(), json!("species"));

        let record = node.to_record().unwrap();
        let keys = record.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, vec!["category", "id", "rank"]);
    }

    #[test]
    fn absorb_unions_lists_and_overrides_scalars() {
        let mut first = KgxNode::new("X:1", "biolink:ChemicalEntity");
        first.name = Some("old".to_string());
        first.xref = vec!["A:1".to_string(), "B:2".to_string()];
        first
            .extra
            .insert("tags".to_string(), json!(["a", {"k": 1}]));

        let mut second = KgxNode::new("X:1", "biolink:ChemicalEntity");
        second.name = Some("new".to_string());
        second.description = None;
        second.xref = vec!["B:2".to_string(), "C:3".to_string()];
        second
            .extra
            .insert("tags".to_string(), json!([{"k": 1}, "b"]));

        first.absorb(second);
        assert_eq!(first.name.as_deref(), Some("new"));
        assert_eq!(first.category, vec!["biolink:ChemicalEntity"]);
        assert_eq!(first.xref, vec!["A:1", "B:2", "C:3"]);
        assert_eq!(first.extra["tags"], json!(["a", {"k": 1}, "b"]));
    }

    #[test]
    fn empty_scalar_does_not_override() {
        let mut first = KgxNode::new("X:1", "biolink:NamedThing");
        first.name = Some("kept".to_string());
        let mut second = KgxNode::new("X:1", "biolink:NamedThing");
        second.name = Some("  ".to_string());
        first.absorb(second);
        assert_eq!(first.name.as_deref(), Some("kept"));
    }

    #[test]
    fn edge_knowledge_source_is_a_single_value() {
        let record = json!({
            "subject": "bacdive:1",
            "predicate": "biolink:subclass_of",
            "object": "NCBITaxon:408",
            "primary_knowledge_source": "infores:bacdive",
            "aggregator_knowledge_source": "infores:kg-microbe"
        });
        let Value::Object(map) = record else { unreachable!() };
        let mut edge = KgxEdge::from_record(map).unwrap();
        assert_eq!(edge.primary_knowledge_source.as_deref(), Some("infores:bacdive"));
        assert_eq!(edge.aggregator_knowledge_source, vec!["infores:kg-microbe"]);

        let mut other = edge.clone();
        other.primary_knowledge_source = Some("infores:mediadive".to_string());
        edge.absorb(other);
        assert_eq!(edge.primary_knowledge_source.as_deref(), Some("infores:mediadive"));
        assert_eq!(
            edge.to_record().unwrap()["primary_knowledge_source"],
            json!("infores:mediadive")
        );
    }

    #[test]
    fn from_record_collects_unknown_keys() {
        let record = json!({
            "id": "DSM:88",
            "category": "biolink:ChemicalMixture",
            "media_type": "complex"
        });
        let Value::Object(map) = record else { unreachable!() };
        let node = KgxNode::from_record(map).unwrap();
        assert_eq!(node.category, vec!["biolink:ChemicalMixture"]);
        assert_eq!(node.extra["media_type"], json!("complex"));
    }
}
