use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use camino::Utf8PathBuf;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::KgError;
use crate::fs_util;
use crate::kgx::model::{KgxEdge, KgxNode};

pub const EDGE_ID_PREFIX: &str = "urn:sha256:";

pub fn generate_edge_id(subject: &str, predicate: &str, object: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update(b"|");
    hasher.update(predicate.as_bytes());
    hasher.update(b"|");
    hasher.update(object.as_bytes());
    format!("{EDGE_ID_PREFIX}{:x}", hasher.finalize())
}

pub fn deduplicate_nodes(nodes: Vec<KgxNode>) -> Vec<KgxNode> {
    let mut index = HashMap::<String, usize>::new();
    let mut merged: Vec<KgxNode> = Vec::new();
    for node in nodes {
        match index.get(&node.id) {
            Some(&slot) => merged[slot].absorb(node),
            None => {
                index.insert(node.id.clone(), merged.len());
                merged.push(node);
            }
        }
    }
    merged
}

pub fn assign_edge_ids(edges: &mut [KgxEdge]) -> usize {
    let mut assigned = 0;
    for edge in edges.iter_mut() {
        let missing = edge.id.as_deref().map(str::trim).unwrap_or("").is_empty();
        if missing {
            edge.id = Some(generate_edge_id(&edge.subject, &edge.predicate, &edge.object));
            assigned += 1;
        }
    }
    assigned
}

pub fn deduplicate_edges(mut edges: Vec<KgxEdge>) -> Vec<KgxEdge> {
    assign_edge_ids(&mut edges);
    let mut index = HashMap::<String, usize>::new();
    let mut merged: Vec<KgxEdge> = Vec::new();
    for edge in edges {
        let id = edge.id.clone().unwrap_or_default();
        match index.get(&id) {
            Some(&slot) => merged[slot].absorb(edge),
            None => {
                index.insert(id, merged.len());
                merged.push(edge);
            }
        }
    }
    merged
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteSummary {
    pub nodes_in: usize,
    pub nodes_out: usize,
    pub edges_in: usize,
    pub edges_out: usize,
    pub edge_ids_assigned: usize,
    pub nodes_path: String,
    pub edges_path: String,
}

#[derive(Debug, Clone)]
pub struct KgxWriter {
    output_dir: Utf8PathBuf,
    graph_name: String,
}

impl KgxWriter {
    pub fn new(output_dir: impl Into<Utf8PathBuf>, graph_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            graph_name: graph_name.into(),
        }
    }

    pub fn nodes_path(&self) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}_nodes.jsonl", self.graph_name))
    }

    pub fn edges_path(&self) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}_edges.jsonl", self.graph_name))
    }

    pub fn write(
        &self,
        nodes: Vec<KgxNode>,
        mut edges: Vec<KgxEdge>,
    ) -> Result<WriteSummary, KgError> {
        let nodes_in = nodes.len();
        let edges_in = edges.len();
        let edge_ids_assigned = assign_edge_ids(&mut edges);
        let nodes = deduplicate_nodes(nodes);
        let edges = deduplicate_edges(edges);

        let node_lines = render_lines(nodes.iter().map(KgxNode::to_record))?;
        let edge_lines = render_lines(edges.iter().map(KgxEdge::to_record))?;

        let nodes_path = self.nodes_path();
        let edges_path = self.edges_path();
        fs_util::write_atomic(nodes_path.as_std_path(), node_lines.as_bytes())?;
        fs_util::write_atomic(edges_path.as_std_path(), edge_lines.as_bytes())?;
        tracing::info!(
            nodes = nodes.len(),
            edges = edges.len(),
            "wrote {} and {}",
            nodes_path,
            edges_path
        );

        Ok(WriteSummary {
            nodes_in,
            nodes_out: nodes.len(),
            edges_in,
            edges_out: edges.len(),
            edge_ids_assigned,
            nodes_path: nodes_path.to_string(),
            edges_path: edges_path.to_string(),
        })
    }
}

fn render_lines<I>(records: I) -> Result<String, KgError>
where
    I: Iterator<Item = Result<std::collections::BTreeMap<String, Value>, KgError>>,
{
    let mut out = String::new();
    for record in records {
        let line =
            serde_json::to_string(&record?).map_err(|err| KgError::JsonLines(err.to_string()))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

pub fn read_nodes_jsonl(path: &Path) -> Result<Vec<KgxNode>, KgError> {
    read_jsonl(path, KgxNode::from_record)
}

pub fn read_edges_jsonl(path: &Path) -> Result<Vec<KgxEdge>, KgError> {
    read_jsonl(path, KgxEdge::from_record)
}

fn read_jsonl<T, F>(path: &Path, parse: F) -> Result<Vec<T>, KgError>
where
    F: Fn(serde_json::Map<String, Value>) -> Result<T, KgError>,
{
    let reader = fs_util::open_text(path)?;
    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| KgError::Filesystem(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let value: Value = serde_json::from_str(&line)
            .map_err(|err| KgError::JsonLines(format!("{}:{line_no}: {err}", path.display())))?;
        let Value::Object(map) = value else {
            return Err(KgError::JsonLines(format!(
                "{}:{line_no}: expected a JSON object",
                path.display()
            )));
        };
        let item = parse(map).map_err(|err| {
            KgError::JsonLines(format!("{}:{line_no}: {err}", path.display()))
        })?;
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_id_is_stable_and_prefixed() {
        let first = generate_edge_id("DSM:88", "biolink:has_part", "CHEBI:17234");
        let second = generate_edge_id("DSM:88", "biolink:has_part", "CHEBI:17234");
        assert_eq!(first, second);
        assert!(first.starts_with(EDGE_ID_PREFIX));
        assert_eq!(first.len(), EDGE_ID_PREFIX.len() + 64);
    }

    #[test]
    fn edge_id_changes_with_each_position() {
        let base = generate_edge_id("a", "p", "b");
        assert_ne!(base, generate_edge_id("x", "p", "b"));
        assert_ne!(base, generate_edge_id("a", "q", "b"));
        assert_ne!(base, generate_edge_id("a", "p", "c"));
        assert_ne!(base, generate_edge_id("b", "p", "a"));
    }

    #[test]
    fn existing_edge_ids_are_kept() {
        let mut edges = vec![KgxEdge::new("a", "p", "b"), KgxEdge::new("a", "p", "c")];
        edges[0].id = Some("a--p--b".to_string());
        assert_eq!(assign_edge_ids(&mut edges), 1);
        assert_eq!(edges[0].id.as_deref(), Some("a--p--b"));
        assert_eq!(
            edges[1].id.as_deref(),
            Some(generate_edge_id("a", "p", "c").as_str())
        );
    }

    #[test]
    fn nodes_keep_first_seen_order() {
        let nodes = vec![
            KgxNode::new("B:1", "biolink:NamedThing"),
            KgxNode::new("A:1", "biolink:NamedThing"),
            KgxNode::new("B:1", "biolink:OrganismTaxon"),
        ];
        let merged = deduplicate_nodes(nodes);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "B:1");
        assert_eq!(
            merged[0].category,
            vec!["biolink:NamedThing", "biolink:OrganismTaxon"]
        );
    }
}
