use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::error::KgError;
use crate::fs_util;
use crate::kgx::{self, KgxEdge, KgxNode};
use crate::strains::models::StrainRecord;

pub const STRAIN_NODE_COLUMNS: &[&str] = &[
    "id",
    "category",
    "name",
    "xref",
    "synonym",
    "in_taxon",
    "has_taxonomic_rank",
    "strain_designation",
    "culture_collection_ids",
    "genome_accession",
    "provided_by",
];

pub const EDGE_COLUMNS: &[&str] = &[
    "id",
    "subject",
    "predicate",
    "object",
    "relation",
    "knowledge_level",
    "agent_type",
    "primary_knowledge_source",
];

pub fn strain_edge_id(subject: &str, predicate: &str, object: &str) -> String {
    format!("{subject}--{predicate}--{object}")
}

pub fn taxonomy_edge(record: &StrainRecord) -> Option<KgxEdge> {
    let subject = record.determine_canonical_id();
    let object = record.species_curie()?;
    if object == subject {
        return None;
    }
    let mut edge = KgxEdge::new(subject, kgx::PREDICATE_SUBCLASS_OF, object);
    edge.id = Some(strain_edge_id(&edge.subject, &edge.predicate, &edge.object));
    edge.relation = Some(kgx::RELATION_SUBCLASS_OF.to_string());
    edge.knowledge_level = Some(kgx::KNOWLEDGE_ASSERTION.to_string());
    edge.agent_type = Some(kgx::MANUAL_AGENT.to_string());
    edge.primary_knowledge_source = Some(kgx::PROVIDED_BY.to_string());
    Some(edge)
}

pub fn edge_row(edge: &KgxEdge) -> BTreeMap<String, String> {
    let mut row = BTreeMap::new();
    let columns = [
        ("id", edge.id.clone()),
        ("subject", Some(edge.subject.clone())),
        ("predicate", Some(edge.predicate.clone())),
        ("object", Some(edge.object.clone())),
        ("relation", edge.relation.clone()),
        ("knowledge_level", edge.knowledge_level.clone()),
        ("agent_type", edge.agent_type.clone()),
        ("primary_knowledge_source", edge.primary_knowledge_source.clone()),
    ];
    for (column, value) in columns {
        if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
            row.insert(column.to_string(), value);
        }
    }
    row
}

#[derive(Debug, Clone, Serialize)]
pub struct StrainExportSummary {
    pub nodes: usize,
    pub edges: usize,
    pub nodes_path: String,
    pub edges_path: String,
}

fn tsv_cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

fn render_tsv<'a, I>(columns: &[&str], rows: I) -> String
where
    I: Iterator<Item = &'a BTreeMap<String, String>>,
{
    let mut out = columns.join("\t");
    out.push('\n');
    for row in rows {
        let cells = columns
            .iter()
            .map(|column| row.get(*column).map(|value| tsv_cell(value)).unwrap_or_default())
            .collect::<Vec<_>>();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

pub fn write_strain_tsv(
    records: &[StrainRecord],
    nodes_path: &Path,
    edges_path: &Path,
) -> Result<StrainExportSummary, KgError> {
    let mut seen_nodes = HashSet::new();
    let mut node_rows = Vec::with_capacity(records.len());
    for record in records {
        let row = record.to_kgx_node();
        let id = row.get("id").cloned().unwrap_or_default();
        if seen_nodes.insert(id.clone()) {
            node_rows.push(row);
        } else {
            tracing::debug!(id = %id, "duplicate strain node skipped in TSV export");
        }
    }

    let mut seen_edges = HashSet::new();
    let edge_rows = records
        .iter()
        .filter_map(taxonomy_edge)
        .filter(|edge| seen_edges.insert(edge.id.clone()))
        .map(|edge| edge_row(&edge))
        .collect::<Vec<_>>();

    fs_util::write_atomic(
        nodes_path,
        render_tsv(STRAIN_NODE_COLUMNS, node_rows.iter()).as_bytes(),
    )?;
    fs_util::write_atomic(
        edges_path,
        render_tsv(EDGE_COLUMNS, edge_rows.iter()).as_bytes(),
    )?;

    Ok(StrainExportSummary {
        nodes: node_rows.len(),
        edges: edge_rows.len(),
        nodes_path: nodes_path.display().to_string(),
        edges_path: edges_path.display().to_string(),
    })
}

pub fn strain_graph(records: &[StrainRecord]) -> (Vec<KgxNode>, Vec<KgxEdge>) {
    let nodes = records
        .iter()
        .map(StrainRecord::to_kgx_graph_node)
        .collect();
    let edges = records.iter().filter_map(taxonomy_edge).collect();
    (nodes, edges)
}
