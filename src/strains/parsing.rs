use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use crate::domain::{
    SourceKind, SourceSpecifier, normalize_collection_id, taxon_curie, taxon_number,
};
use crate::error::KgError;
use crate::fs_util;
use crate::strains::models::StrainRecord;

#[derive(Debug, Clone)]
pub struct TsvRow {
    /// 1-indexed line number including the header, so the first data row is 2.
    pub row: usize,
    cells: HashMap<String, String>,
}

impl TsvRow {
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.cells
                .get(*alias)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        })
    }

    pub fn get_list(&self, aliases: &[&str]) -> Vec<String> {
        self.get(aliases)
            .map(|value| {
                value
                    .split(';')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Reads a headed TSV file. A missing file yields `Ok(None)`.
pub fn read_tsv(path: &Path) -> Result<Option<Vec<TsvRow>>, KgError> {
    if !path.exists() {
        tracing::warn!("input file not found, skipping: {}", path.display());
        return Ok(None);
    }
    let reader = fs_util::open_text(path)?;
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(|err| KgError::Filesystem(err.to_string()))?,
        None => return Ok(Some(Vec::new())),
    };
    let headers = header.split('\t').map(normalize_header).collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line.map_err(|err| KgError::Filesystem(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let mut cells = HashMap::new();
        for (column, value) in headers.iter().zip(line.trim_end_matches('\r').split('\t')) {
            if !column.is_empty() && !value.trim().is_empty() {
                cells.entry(column.clone()).or_insert_with(|| value.to_string());
            }
        }
        rows.push(TsvRow {
            row: index + 2,
            cells,
        });
    }
    Ok(Some(rows))
}

pub fn split_scientific_name(text: &str) -> (Option<String>, Option<String>) {
    let tokens = text.split_whitespace().collect::<Vec<_>>();
    match tokens.len() {
        0 => (None, None),
        1 => (Some(tokens[0].to_string()), None),
        2 => (Some(tokens.join(" ")), None),
        _ => (Some(tokens[..2].join(" ")), Some(tokens[2..].join(" "))),
    }
}

fn sheet_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let without_gz = file_name.strip_suffix(".gz").unwrap_or(&file_name);
    match without_gz.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => without_gz.to_string(),
    }
}

fn collection_ids(raw: Vec<String>) -> Vec<String> {
    let mut ids = Vec::new();
    for value in raw {
        let id = normalize_collection_id(&value).unwrap_or(value);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn ncbi_curie(value: Option<&str>) -> Option<String> {
    value.map(|raw| taxon_curie(raw).unwrap_or_else(|| raw.to_string()))
}

fn taxon_local(value: Option<&str>) -> Option<String> {
    value.map(|raw| taxon_number(raw).unwrap_or(raw).to_string())
}

const STRAIN_ID: &[&str] = &["strain_id", "id"];
const NAME: &[&str] = &["name", "strain_name"];
const SCIENTIFIC_NAME: &[&str] = &["scientific_name", "organism", "species", "species_name"];
const DESIGNATION: &[&str] = &["strain_designation", "designation"];
const NCBI_TAXON: &[&str] = &["ncbi_taxon_id", "ncbitaxon_id", "ncbi_taxid", "taxon_id"];
const SPECIES_TAXON: &[&str] = &["species_taxon_id", "species_taxid"];
const PARENT_TAXON: &[&str] = &["parent_taxon_id", "parent_taxid"];
const RANK: &[&str] = &["has_taxonomic_rank", "taxonomic_rank", "rank"];
const COLLECTIONS: &[&str] = &[
    "culture_collection_ids",
    "culture_collection_id",
    "culture_collection",
    "collection_ids",
];
const BACDIVE_ID: &[&str] = &["bacdive_id", "bacdive"];
const GENOME: &[&str] = &["genome_accession", "assembly_accession", "genome"];
const SYNONYMS: &[&str] = &["synonyms", "synonym"];
const XREFS: &[&str] = &["xrefs", "xref"];
const GROWTH_STRAIN: &[&str] = &["strain", "organism", "strain_name", "name"];

fn apply_name_fields(
    record: &mut StrainRecord,
    scientific: Option<&str>,
    designation: Option<&str>,
) {
    match (scientific, designation) {
        (Some(scientific), Some(designation)) => {
            record.scientific_name = Some(scientific.to_string());
            record.strain_designation = Some(designation.to_string());
        }
        (Some(scientific), None) => {
            let (binomial, designation) = split_scientific_name(scientific);
            record.scientific_name = binomial;
            record.strain_designation = designation;
        }
        (None, designation) => {
            record.strain_designation = designation.map(str::to_string);
        }
    }
}

fn finish_collections(record: &mut StrainRecord, raw: Vec<String>) {
    record.culture_collection_ids = collection_ids(raw);
    record.primary_collection_id = record.culture_collection_ids.first().cloned();
}

pub fn parse_strain_table(path: &Path) -> Result<Vec<StrainRecord>, KgError> {
    let Some(rows) = read_tsv(path)? else {
        return Ok(Vec::new());
    };
    let sheet = sheet_name(path);
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut record = StrainRecord {
            id: row.get(STRAIN_ID).map(str::to_string),
            name: row.get(NAME).map(str::to_string),
            ncbi_taxon_id: ncbi_curie(row.get(NCBI_TAXON)),
            species_taxon_id: taxon_local(row.get(SPECIES_TAXON)),
            parent_taxon_id: taxon_local(row.get(PARENT_TAXON)),
            has_taxonomic_rank: row.get(RANK).and_then(|rank| rank.parse().ok()),
            bacdive_id: row.get(BACDIVE_ID).map(str::to_string),
            genome_accession: row.get(GENOME).map(str::to_string),
            synonyms: row.get_list(SYNONYMS),
            xrefs: row.get_list(XREFS),
            source_sheet: Some(sheet.clone()),
            source_row: Some(row.row),
            ..StrainRecord::default()
        };
        apply_name_fields(&mut record, row.get(SCIENTIFIC_NAME), row.get(DESIGNATION));
        finish_collections(&mut record, row.get_list(COLLECTIONS));
        if record.display_name().is_none()
            && record.ncbi_taxon_id.is_none()
            && record.culture_collection_ids.is_empty()
            && record.bacdive_id.is_none()
        {
            tracing::debug!(sheet = %sheet, row = row.row, "skipping empty strain row");
            continue;
        }
        records.push(record);
    }
    tracing::info!(sheet = %sheet, records = records.len(), "parsed strain table");
    Ok(records)
}

pub fn parse_bacdive_table(path: &Path) -> Result<Vec<StrainRecord>, KgError> {
    let Some(rows) = read_tsv(path)? else {
        return Ok(Vec::new());
    };
    let sheet = sheet_name(path);
    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for row in rows {
        let Some(raw_id) = row.get(BACDIVE_ID) else {
            tracing::debug!(sheet = %sheet, row = row.row, "row without BacDive id");
            continue;
        };
        let local = raw_id
            .split_once(':')
            .map(|(_, local)| local.trim())
            .unwrap_or(raw_id);
        if local.is_empty() || !local.chars().all(|ch| ch.is_ascii_digit()) {
            tracing::debug!(sheet = %sheet, row = row.row, "non-numeric BacDive id {raw_id}");
            continue;
        }
        if !seen.insert(local.to_string()) {
            tracing::debug!(sheet = %sheet, row = row.row, "duplicate BacDive id {local}");
            continue;
        }
        let mut record = StrainRecord {
            bacdive_id: Some(local.to_string()),
            ncbi_taxon_id: ncbi_curie(row.get(NCBI_TAXON)),
            species_taxon_id: taxon_local(row.get(SPECIES_TAXON)),
            genome_accession: row.get(GENOME).map(str::to_string),
            synonyms: row.get_list(SYNONYMS),
            source_sheet: Some(sheet.clone()),
            source_row: Some(row.row),
            ..StrainRecord::default()
        };
        apply_name_fields(&mut record, row.get(SCIENTIFIC_NAME), row.get(DESIGNATION));
        finish_collections(&mut record, row.get_list(COLLECTIONS));
        records.push(record);
    }
    tracing::info!(sheet = %sheet, records = records.len(), "parsed BacDive table");
    Ok(records)
}

pub fn parse_growth_table(path: &Path) -> Result<Vec<StrainRecord>, KgError> {
    let Some(rows) = read_tsv(path)? else {
        return Ok(Vec::new());
    };
    let sheet = sheet_name(path);
    let mut records = Vec::new();
    for row in rows {
        let collections = row.get_list(COLLECTIONS);
        let strain = row.get(GROWTH_STRAIN);
        if strain.is_none() && collections.is_empty() {
            continue;
        }
        let mut record = StrainRecord {
            name: strain.map(str::to_string),
            ncbi_taxon_id: ncbi_curie(row.get(NCBI_TAXON)),
            source_sheet: Some(sheet.clone()),
            source_row: Some(row.row),
            ..StrainRecord::default()
        };
        if let Some(strain) = strain {
            let (binomial, designation) = split_scientific_name(strain);
            record.scientific_name = binomial;
            record.strain_designation = designation;
        }
        finish_collections(&mut record, collections);
        records.push(record);
    }
    tracing::info!(sheet = %sheet, records = records.len(), "parsed growth table");
    Ok(records)
}

pub fn parse_source(source: &SourceSpecifier) -> Result<Vec<StrainRecord>, KgError> {
    let path = source.path.as_std_path();
    match source.kind {
        SourceKind::Strains => parse_strain_table(path),
        SourceKind::Bacdive => parse_bacdive_table(path),
        SourceKind::Growth => parse_growth_table(path),
    }
}
