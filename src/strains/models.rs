use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    BACDIVE_PREFIX, NCBI_TAXON_PREFIX, STRAIN_PREFIX, TaxonomicRank, normalize_collection_id,
    slug, taxon_curie, taxon_number,
};
use crate::kgx::{self, KgxNode};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrainRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub scientific_name: Option<String>,
    pub strain_designation: Option<String>,
    pub ncbi_taxon_id: Option<String>,
    pub species_taxon_id: Option<String>,
    pub parent_taxon_id: Option<String>,
    pub has_taxonomic_rank: Option<TaxonomicRank>,
    #[serde(default)]
    pub culture_collection_ids: Vec<String>,
    pub primary_collection_id: Option<String>,
    pub bacdive_id: Option<String>,
    pub genome_accession: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub xrefs: Vec<String>,
    pub source_sheet: Option<String>,
    pub source_row: Option<usize>,
}

pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl StrainRecord {
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = present(&self.name) {
            return Some(name.to_string());
        }
        match (
            present(&self.scientific_name),
            present(&self.strain_designation),
        ) {
            (Some(binomial), Some(designation)) => Some(format!("{binomial} {designation}")),
            (Some(binomial), None) => Some(binomial.to_string()),
            _ => None,
        }
    }

    pub fn name_key(&self) -> Option<String> {
        self.display_name().map(|name| {
            name.split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        })
    }

    pub fn bacdive_local_id(&self) -> Option<&str> {
        let raw = present(&self.bacdive_id)?;
        let local = match raw.split_once(':') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case(BACDIVE_PREFIX) => rest.trim(),
            _ => raw,
        };
        (!local.is_empty()).then_some(local)
    }

    /// The NCBI taxon number when it names this strain rather than its species.
    ///
    /// An absent species taxon counts as different from the strain's own taxon.
    pub fn strain_specific_taxon(&self) -> Option<&str> {
        let taxon = present(&self.ncbi_taxon_id).and_then(taxon_number)?;
        let species = present(&self.species_taxon_id).and_then(taxon_number);
        (species != Some(taxon)).then_some(taxon)
    }

    pub fn determine_canonical_id(&self) -> String {
        if let Some(bacdive) = self.bacdive_local_id() {
            return format!("{BACDIVE_PREFIX}:{bacdive}");
        }
        if let Some(taxon) = self.strain_specific_taxon() {
            return format!("{NCBI_TAXON_PREFIX}:{taxon}");
        }
        if let Some(collection) =
            present(&self.primary_collection_id).and_then(normalize_collection_id)
        {
            return collection;
        }
        if let Some(designation) = present(&self.strain_designation) {
            let designation = slug(designation);
            if !designation.is_empty() {
                return match present(&self.scientific_name).map(slug) {
                    Some(binomial) if !binomial.is_empty() => {
                        format!("{STRAIN_PREFIX}:{binomial}_{designation}")
                    }
                    _ => format!("{STRAIN_PREFIX}:{designation}"),
                };
            }
        }
        let sheet = present(&self.source_sheet)
            .map(slug)
            .filter(|sheet| !sheet.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        format!("{STRAIN_PREFIX}:{sheet}_row{}", self.source_row.unwrap_or(0))
    }

    pub fn normalized_collection_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        let candidates = present(&self.primary_collection_id)
            .into_iter()
            .chain(self.culture_collection_ids.iter().map(String::as_str));
        for raw in candidates {
            if let Some(id) = normalize_collection_id(raw) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    pub fn species_curie(&self) -> Option<String> {
        present(&self.species_taxon_id).and_then(taxon_curie)
    }

    pub fn collect_xrefs(&self) -> Vec<String> {
        let canonical = self.determine_canonical_id();
        let mut xrefs = BTreeSet::new();
        for xref in &self.xrefs {
            let xref = xref.trim();
            if !xref.is_empty() {
                xrefs.insert(xref.to_string());
            }
        }
        xrefs.extend(self.normalized_collection_ids());

        let taxon = present(&self.ncbi_taxon_id).and_then(taxon_number);
        let species = present(&self.species_taxon_id).and_then(taxon_number);
        if let Some(species) = species {
            if Some(species) != taxon {
                xrefs.insert(format!("{NCBI_TAXON_PREFIX}:{species}"));
            }
        }
        if let Some(taxon) = taxon {
            xrefs.insert(format!("{NCBI_TAXON_PREFIX}:{taxon}"));
        }
        if let Some(bacdive) = self.bacdive_local_id() {
            xrefs.insert(format!("{BACDIVE_PREFIX}:{bacdive}"));
        }
        if let Some(accession) = present(&self.genome_accession) {
            xrefs.insert(format!("assembly:{accession}"));
        }
        xrefs.remove(&canonical);
        xrefs.into_iter().collect()
    }

    pub fn to_kgx_node(&self) -> BTreeMap<String, String> {
        let mut row = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
                row.insert(key.to_string(), value);
            }
        };
        put("id", Some(self.determine_canonical_id()));
        put("category", Some(kgx::CATEGORY_ORGANISM_TAXON.to_string()));
        put("name", self.display_name());
        put("xref", Some(self.collect_xrefs().join("|")));
        put("synonym", Some(self.synonyms.join("|")));
        put("in_taxon", self.species_curie());
        put(
            "has_taxonomic_rank",
            self.has_taxonomic_rank.map(|rank| rank.to_string()),
        );
        put(
            "strain_designation",
            present(&self.strain_designation).map(str::to_string),
        );
        put(
            "culture_collection_ids",
            Some(self.normalized_collection_ids().join("|")),
        );
        put(
            "genome_accession",
            present(&self.genome_accession).map(str::to_string),
        );
        put("provided_by", Some(kgx::PROVIDED_BY.to_string()));
        row
    }

    pub fn to_kgx_graph_node(&self) -> KgxNode {
        let mut node = KgxNode::new(self.determine_canonical_id(), kgx::CATEGORY_ORGANISM_TAXON);
        node.name = self.display_name();
        node.xref = self.collect_xrefs();
        node.synonym = self.synonyms.clone();
        node.in_taxon = self.species_curie().into_iter().collect();
        node.provided_by = vec![kgx::PROVIDED_BY.to_string()];
        if let Some(rank) = self.has_taxonomic_rank {
            node.extra.insert(
                "has_taxonomic_rank".to_string(),
                Value::String(rank.to_string()),
            );
        }
        if let Some(designation) = present(&self.strain_designation) {
            node.extra.insert(
                "strain_designation".to_string(),
                Value::String(designation.to_string()),
            );
        }
        let collections = self.normalized_collection_ids();
        if !collections.is_empty() {
            node.extra.insert(
                "culture_collection_ids".to_string(),
                Value::Array(collections.into_iter().map(Value::String).collect()),
            );
        }
        if let Some(accession) = present(&self.genome_accession) {
            node.extra.insert(
                "genome_accession".to_string(),
                Value::String(accession.to_string()),
            );
        }
        node
    }
}

fn fill(target: &mut Option<String>, source: &Option<String>) -> bool {
    if present(target).is_none() {
        if let Some(value) = present(source) {
            *target = Some(value.to_string());
            return true;
        }
    }
    false
}

fn union(target: &mut Vec<String>, source: &[String]) -> bool {
    let mut changed = false;
    for item in source {
        let item = item.trim();
        if !item.is_empty() && !target.iter().any(|existing| existing == item) {
            target.push(item.to_string());
            changed = true;
        }
    }
    changed
}

/// Folds `source` into `target` without losing anything already in `target`.
///
/// Only empty scalars are filled; list fields are unioned. A differing display name of
/// `source` is kept as a synonym. Returns whether `target` changed.
pub fn merge_records(target: &mut StrainRecord, source: &StrainRecord) -> bool {
    let mut changed = false;

    let target_name = target.name_key();
    if let (Some(target_key), Some(source_name)) = (target_name, source.display_name()) {
        let source_key = source.name_key().unwrap_or_default();
        let known = target
            .synonyms
            .iter()
            .any(|synonym| synonym.eq_ignore_ascii_case(&source_name));
        if source_key != target_key && !known {
            changed |= union(&mut target.synonyms, &[source_name]);
        }
    }

    changed |= fill(&mut target.id, &source.id);
    changed |= fill(&mut target.name, &source.name);
    changed |= fill(&mut target.scientific_name, &source.scientific_name);
    changed |= fill(&mut target.strain_designation, &source.strain_designation);
    changed |= fill(&mut target.ncbi_taxon_id, &source.ncbi_taxon_id);
    changed |= fill(&mut target.species_taxon_id, &source.species_taxon_id);
    changed |= fill(&mut target.parent_taxon_id, &source.parent_taxon_id);
    changed |= fill(&mut target.primary_collection_id, &source.primary_collection_id);
    changed |= fill(&mut target.bacdive_id, &source.bacdive_id);
    changed |= fill(&mut target.genome_accession, &source.genome_accession);
    changed |= fill(&mut target.source_sheet, &source.source_sheet);
    if target.has_taxonomic_rank.is_none() && source.has_taxonomic_rank.is_some() {
        target.has_taxonomic_rank = source.has_taxonomic_rank;
        changed = true;
    }
    if target.source_row.is_none() && source.source_row.is_some() {
        target.source_row = source.source_row;
        changed = true;
    }

    changed |= union(&mut target.culture_collection_ids, &source.culture_collection_ids);
    changed |= union(&mut target.synonyms, &source.synonyms);
    changed |= union(&mut target.xrefs, &source.xrefs);

    if present(&target.primary_collection_id).is_none() {
        if let Some(first) = target.culture_collection_ids.first().cloned() {
            target.primary_collection_id = Some(first);
            changed = true;
        }
    }
    changed
}
