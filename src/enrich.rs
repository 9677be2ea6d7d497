use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::domain::taxon_number;
use crate::ncbi::TaxonomyClient;
use crate::strains::models::{StrainRecord, present};

#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    pub delay: Duration,
    pub limit: Option<usize>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(350),
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    pub lookups: usize,
    pub enriched: usize,
    pub not_found: usize,
    pub failed: usize,
}

fn needs_lookup(record: &StrainRecord) -> bool {
    present(&record.ncbi_taxon_id).and_then(taxon_number).is_some()
        && (present(&record.species_taxon_id).is_none()
            || present(&record.parent_taxon_id).is_none()
            || record.has_taxonomic_rank.is_none())
}

/// Fills blank taxonomy fields from the taxonomy service, one call at a time.
///
/// Calls are separated by `options.delay` and stop after `options.limit` lookups.
/// Failed lookups are logged and counted; they never abort the pass.
pub fn enrich_taxonomy<T: TaxonomyClient>(
    records: &mut [StrainRecord],
    client: &T,
    options: EnrichOptions,
) -> EnrichSummary {
    let mut summary = EnrichSummary::default();
    for record in records.iter_mut() {
        if options.limit.is_some_and(|limit| summary.lookups >= limit) {
            tracing::info!(limit = summary.lookups, "enrichment lookup limit reached");
            break;
        }
        if !needs_lookup(record) {
            continue;
        }
        let Some(taxon) = present(&record.ncbi_taxon_id)
            .and_then(taxon_number)
            .map(str::to_string)
        else {
            continue;
        };

        if summary.lookups > 0 && !options.delay.is_zero() {
            thread::sleep(options.delay);
        }
        summary.lookups += 1;

        match client.fetch_taxon(&taxon) {
            Ok(Some(info)) => {
                let mut changed = false;
                if present(&record.species_taxon_id).is_none() {
                    if let Some(species) = info.species_taxon_id {
                        record.species_taxon_id = Some(species);
                        changed = true;
                    }
                }
                if present(&record.parent_taxon_id).is_none() {
                    if let Some(parent) = info.parent_taxon_id {
                        record.parent_taxon_id = Some(parent);
                        changed = true;
                    }
                }
                if record.has_taxonomic_rank.is_none() && info.rank.is_some() {
                    record.has_taxonomic_rank = info.rank;
                    changed = true;
                }
                if present(&record.scientific_name).is_none() {
                    if let Some(name) = info.scientific_name {
                        record.scientific_name = Some(name);
                        changed = true;
                    }
                }
                if changed {
                    summary.enriched += 1;
                }
            }
            Ok(None) => {
                tracing::debug!(taxon = %taxon, "taxon not found");
                summary.not_found += 1;
            }
            Err(err) => {
                tracing::warn!(taxon = %taxon, "taxonomy lookup failed: {err}");
                summary.failed += 1;
            }
        }
    }
    summary
}
