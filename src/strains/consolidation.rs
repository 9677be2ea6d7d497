use std::collections::HashMap;

use serde::Serialize;

use crate::domain::normalize_collection_id;
use crate::strains::models::{StrainRecord, merge_records, present};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationSummary {
    pub input: usize,
    pub output: usize,
    pub merged: usize,
    pub cross_merged: usize,
}

pub fn consolidation_key(record: &StrainRecord) -> String {
    if let Some(taxon) = record.strain_specific_taxon() {
        return format!("ncbi:{taxon}");
    }
    if let Some(collection) = present(&record.primary_collection_id) {
        let collection =
            normalize_collection_id(collection).unwrap_or_else(|| collection.to_string());
        return format!("cc:{collection}");
    }
    if let Some(name) = record.name_key() {
        return format!("name:{name}");
    }
    format!(
        "row:{}:{}",
        present(&record.source_sheet).unwrap_or("unknown"),
        record.source_row.unwrap_or(0)
    )
}

#[derive(Default)]
struct Consolidator {
    slots: Vec<Option<StrainRecord>>,
    primary: Vec<String>,
    keys: HashMap<String, usize>,
    names: HashMap<String, String>,
    summary: ConsolidationSummary,
}

impl Consolidator {
    fn slot_for_name(&self, name: &str) -> Option<usize> {
        self.names
            .get(name)
            .and_then(|key| self.keys.get(key))
            .copied()
    }

    fn add(&mut self, record: StrainRecord) {
        self.summary.input += 1;
        let key = consolidation_key(&record);
        let name = record.name_key();

        let matched = self
            .keys
            .get(&key)
            .copied()
            .or_else(|| name.as_deref().and_then(|name| self.slot_for_name(name)));

        let Some(slot) = matched else {
            self.keys.insert(key.clone(), self.slots.len());
            if let Some(name) = name {
                self.names.entry(name).or_insert_with(|| key.clone());
            }
            self.primary.push(key);
            self.slots.push(Some(record));
            return;
        };

        if let Some(target) = self.slots[slot].as_mut() {
            merge_records(target, &record);
        }
        self.summary.merged += 1;
        self.keys.entry(key).or_insert(slot);

        if let Some(name) = name {
            match self.slot_for_name(&name) {
                None => {
                    self.names.insert(name, self.primary[slot].clone());
                }
                Some(other) if other != slot => self.cross_merge(slot, other, &name),
                Some(_) => {}
            }
        }
        self.register_current_keys(slot);
    }

    fn cross_merge(&mut self, slot: usize, stale: usize, name: &str) {
        let Some(absorbed) = self.slots[stale].take() else {
            return;
        };
        tracing::debug!(
            strain = %name,
            kept = %self.primary[slot],
            retired = %self.primary[stale],
            "two consolidated records describe one strain, merging"
        );
        if let Some(target) = self.slots[slot].as_mut() {
            merge_records(target, &absorbed);
        }
        for value in self.keys.values_mut() {
            if *value == stale {
                *value = slot;
            }
        }
        self.summary.cross_merged += 1;
    }

    fn register_current_keys(&mut self, slot: usize) {
        loop {
            let Some(record) = self.slots[slot].as_ref() else {
                return;
            };
            let current = consolidation_key(record);
            let name = record.name_key();
            let key_owner = self.keys.get(&current).copied();
            let name_owner = name.as_deref().and_then(|name| self.slot_for_name(name));

            // A merge can give the record a key or name another slot already owns.
            if let Some(other) = key_owner.filter(|&other| other != slot) {
                self.cross_merge(slot, other, &current);
                continue;
            }
            if let (Some(other), Some(name)) = (name_owner, name.as_deref()) {
                if other != slot {
                    self.cross_merge(slot, other, name);
                    continue;
                }
            }

            self.keys.insert(current, slot);
            if let Some(name) = name {
                let primary = self.primary[slot].clone();
                self.names.entry(name).or_insert(primary);
            }
            return;
        }
    }

    fn finish(self) -> (Vec<StrainRecord>, ConsolidationSummary) {
        let records = self.slots.into_iter().flatten().collect::<Vec<_>>();
        let summary = ConsolidationSummary {
            output: records.len(),
            ..self.summary
        };
        (records, summary)
    }
}

/// Merges records from all sources that describe the same strain.
///
/// Lookup is by primary key, then by lower-cased name. This is not a union-find:
/// chains that only connect through a third field (synonyms, for instance) are not
/// followed.
pub fn consolidate_strains(records: Vec<StrainRecord>) -> Vec<StrainRecord> {
    consolidate_strains_with_summary(records).0
}

pub fn consolidate_strains_with_summary(
    records: Vec<StrainRecord>,
) -> (Vec<StrainRecord>, ConsolidationSummary) {
    let mut consolidator = Consolidator::default();
    for record in records {
        consolidator.add(record);
    }
    let (records, summary) = consolidator.finish();
    tracing::info!(
        input = summary.input,
        output = summary.output,
        merged = summary.merged,
        cross_merged = summary.cross_merged,
        "consolidated strains"
    );
    (records, summary)
}

pub fn deduplicate_by_canonical_id(records: Vec<StrainRecord>) -> Vec<StrainRecord> {
    let mut index = HashMap::<String, usize>::new();
    let mut out: Vec<StrainRecord> = Vec::with_capacity(records.len());
    for record in records {
        let canonical = record.determine_canonical_id();
        match index.get(&canonical) {
            Some(&slot) => {
                merge_records(&mut out[slot], &record);
            }
            None => {
                index.insert(canonical, out.len());
                out.push(record);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_priority() {
        let mut record = StrainRecord {
            name: Some("Foo  Bar 1".to_string()),
            source_sheet: Some("s".to_string()),
            source_row: Some(3),
            ..StrainRecord::default()
        };
        assert_eq!(consolidation_key(&record), "name:foo bar 1");
        record.primary_collection_id = Some("DSM 5".to_string());
        assert_eq!(consolidation_key(&record), "cc:DSM:5");
        record.ncbi_taxon_id = Some("NCBITaxon:9".to_string());
        assert_eq!(consolidation_key(&record), "ncbi:9");
        record.species_taxon_id = Some("9".to_string());
        assert_eq!(consolidation_key(&record), "cc:DSM:5");

        let bare = StrainRecord {
            source_sheet: Some("s".to_string()),
            source_row: Some(3),
            ..StrainRecord::default()
        };
        assert_eq!(consolidation_key(&bare), "row:s:3");
    }

    #[test]
    fn name_bridges_id_keyed_and_name_keyed_records() {
        let by_name = StrainRecord {
            name: Some("Paracoccus denitrificans PD1222".to_string()),
            source_row: Some(2),
            ..StrainRecord::default()
        };
        let by_collection = StrainRecord {
            name: Some("Paracoccus denitrificans X".to_string()),
            primary_collection_id: Some("DSM:413".to_string()),
            culture_collection_ids: vec!["DSM:413".to_string()],
            ..StrainRecord::default()
        };
        // Keyed by collection and carrying both names: matches the second record by
        // key, then finds the first through its name.
        let bridge = StrainRecord {
            name: Some("paracoccus denitrificans pd1222".to_string()),
            primary_collection_id: Some("DSM 413".to_string()),
            ..StrainRecord::default()
        };

        let (merged, summary) =
            consolidate_strains_with_summary(vec![by_name, by_collection, bridge]);
        assert_eq!(merged.len(), 1);
        assert_eq!(summary.cross_merged, 1);
        assert_eq!(merged[0].name.as_deref(), Some("Paracoccus denitrificans X"));
        assert!(
            merged[0]
                .synonyms
                .iter()
                .any(|synonym| synonym.eq_ignore_ascii_case("Paracoccus denitrificans PD1222"))
        );
    }

    #[test]
    fn synonym_chains_are_not_followed() {
        let first = StrainRecord {
            name: Some("alpha".to_string()),
            synonyms: vec!["beta".to_string()],
            ..StrainRecord::default()
        };
        let second = StrainRecord {
            name: Some("beta".to_string()),
            ..StrainRecord::default()
        };
        assert_eq!(consolidate_strains(vec![first, second]).len(), 2);
    }

    #[test]
    fn canonical_dedup_merges_groups() {
        let records = vec![
            StrainRecord {
                bacdive_id: Some("1".to_string()),
                synonyms: vec!["a".to_string()],
                ..StrainRecord::default()
            },
            StrainRecord {
                name: Some("other".to_string()),
                ..StrainRecord::default()
            },
            StrainRecord {
                bacdive_id: Some("bacdive:1".to_string()),
                genome_accession: Some("GCA_1.1".to_string()),
                ..StrainRecord::default()
            },
        ];
        let out = deduplicate_by_canonical_id(records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].genome_accession.as_deref(), Some("GCA_1.1"));
        assert_eq!(out[0].bacdive_id.as_deref(), Some("1"));
    }
}
