use serde::Serialize;

use crate::domain::{TaxonomicRank, taxon_number};
use crate::strains::models::{StrainRecord, present};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InferenceSummary {
    pub ranks: usize,
    pub species_from_bacdive: usize,
    pub species_from_self: usize,
}

pub fn infer_taxonomic_ranks(records: &mut [StrainRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if record.has_taxonomic_rank.is_some() {
            continue;
        }
        let is_strain = present(&record.strain_designation).is_some()
            || present(&record.bacdive_id).is_some();
        record.has_taxonomic_rank = Some(if is_strain {
            TaxonomicRank::Strain
        } else {
            TaxonomicRank::Species
        });
        changed += 1;
    }
    changed
}

pub fn infer_species_from_bacdive(records: &mut [StrainRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if record.has_taxonomic_rank != Some(TaxonomicRank::Strain)
            || present(&record.bacdive_id).is_none()
            || present(&record.species_taxon_id).is_some()
        {
            continue;
        }
        if let Some(taxon) = present(&record.ncbi_taxon_id).and_then(taxon_number) {
            record.species_taxon_id = Some(taxon.to_string());
            changed += 1;
        }
    }
    changed
}

pub fn infer_species_from_self(records: &mut [StrainRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if record.has_taxonomic_rank != Some(TaxonomicRank::Species)
            || present(&record.species_taxon_id).is_some()
        {
            continue;
        }
        if let Some(taxon) = present(&record.ncbi_taxon_id).and_then(taxon_number) {
            record.species_taxon_id = Some(taxon.to_string());
            changed += 1;
        }
    }
    changed
}

pub fn run_inference(records: &mut [StrainRecord]) -> InferenceSummary {
    let summary = InferenceSummary {
        ranks: infer_taxonomic_ranks(records),
        species_from_bacdive: infer_species_from_bacdive(records),
        species_from_self: infer_species_from_self(records),
    };
    tracing::info!(
        ranks = summary.ranks,
        species_from_bacdive = summary.species_from_bacdive,
        species_from_self = summary.species_from_self,
        "inference complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designation_implies_strain_rank() {
        let mut records = vec![StrainRecord {
            strain_designation: Some("AM1".to_string()),
            ..StrainRecord::default()
        }];
        assert_eq!(infer_taxonomic_ranks(&mut records), 1);
        assert_eq!(records[0].has_taxonomic_rank, Some(TaxonomicRank::Strain));
    }

    #[test]
    fn bare_taxon_is_species_and_existing_rank_is_kept() {
        let mut records = vec![
            StrainRecord {
                ncbi_taxon_id: Some("NCBITaxon:408".to_string()),
                ..StrainRecord::default()
            },
            StrainRecord {
                has_taxonomic_rank: Some(TaxonomicRank::Genus),
                bacdive_id: Some("1".to_string()),
                ..StrainRecord::default()
            },
        ];
        assert_eq!(infer_taxonomic_ranks(&mut records), 1);
        assert_eq!(records[0].has_taxonomic_rank, Some(TaxonomicRank::Species));
        assert_eq!(records[1].has_taxonomic_rank, Some(TaxonomicRank::Genus));
        assert_eq!(infer_taxonomic_ranks(&mut records), 0);
    }

    #[test]
    fn bacdive_strain_takes_species_from_taxon() {
        let mut records = vec![StrainRecord {
            has_taxonomic_rank: Some(TaxonomicRank::Strain),
            bacdive_id: Some("12345".to_string()),
            ncbi_taxon_id: Some("NCBITaxon:408".to_string()),
            ..StrainRecord::default()
        }];
        assert_eq!(infer_species_from_bacdive(&mut records), 1);
        assert_eq!(records[0].species_taxon_id.as_deref(), Some("408"));
        assert_eq!(infer_species_from_bacdive(&mut records), 0);
    }

    #[test]
    fn species_links_to_itself() {
        let mut records = vec![
            StrainRecord {
                has_taxonomic_rank: Some(TaxonomicRank::Species),
                ncbi_taxon_id: Some("NCBITaxon:382".to_string()),
                ..StrainRecord::default()
            },
            StrainRecord {
                has_taxonomic_rank: Some(TaxonomicRank::Strain),
                ncbi_taxon_id: Some("NCBITaxon:1286640".to_string()),
                ..StrainRecord::default()
            },
        ];
        assert_eq!(infer_species_from_self(&mut records), 1);
        assert_eq!(records[0].species_taxon_id.as_deref(), Some("382"));
        assert_eq!(records[1].species_taxon_id, None);
    }

    #[test]
    fn passes_run_in_order() {
        let mut records = vec![
            StrainRecord {
                bacdive_id: Some("7".to_string()),
                ncbi_taxon_id: Some("NCBITaxon:408".to_string()),
                ..StrainRecord::default()
            },
            StrainRecord {
                ncbi_taxon_id: Some("382".to_string()),
                ..StrainRecord::default()
            },
        ];
        let summary = run_inference(&mut records);
        assert_eq!(
            summary,
            InferenceSummary {
                ranks: 2,
                species_from_bacdive: 1,
                species_from_self: 1,
            }
        );
        assert_eq!(run_inference(&mut records), InferenceSummary::default());
    }
}
