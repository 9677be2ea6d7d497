use culture_kg::strains::StrainRecord;

fn assorted_records() -> Vec<StrainRecord> {
    vec![
        StrainRecord::default(),
        StrainRecord {
            bacdive_id: Some("12345".to_string()),
            ncbi_taxon_id: Some("NCBITaxon:1286640".to_string()),
            primary_collection_id: Some("DSM 1981".to_string()),
            ..StrainRecord::default()
        },
        StrainRecord {
            ncbi_taxon_id: Some("NCBITaxon:1286640".to_string()),
            species_taxon_id: Some("382".to_string()),
            ..StrainRecord::default()
        },
        StrainRecord {
            ncbi_taxon_id: Some("NCBITaxon:382".to_string()),
            species_taxon_id: Some("382".to_string()),
            primary_collection_id: Some("dsmz:1981".to_string()),
            ..StrainRecord::default()
        },
        StrainRecord {
            scientific_name: Some("Methylorubrum extorquens".to_string()),
            strain_designation: Some("AM1".to_string()),
            ..StrainRecord::default()
        },
        StrainRecord {
            strain_designation: Some("   ".to_string()),
            source_sheet: Some("Growth Preferences".to_string()),
            source_row: Some(14),
            ..StrainRecord::default()
        },
    ]
}

#[test]
fn canonical_id_is_deterministic_and_non_empty() {
    for record in assorted_records() {
        let first = record.determine_canonical_id();
        assert!(!first.is_empty());
        assert_eq!(first, record.clone().determine_canonical_id());
    }
}

#[test]
fn bacdive_wins_over_everything() {
    for record in assorted_records() {
        let record = StrainRecord {
            bacdive_id: Some("777".to_string()),
            ..record
        };
        assert_eq!(record.determine_canonical_id(), "bacdive:777");
    }
}

#[test]
fn strain_level_taxon_is_used_when_it_differs_from_species() {
    let record = StrainRecord {
        ncbi_taxon_id: Some("NCBITaxon:1286640".to_string()),
        species_taxon_id: Some("NCBITaxon:382".to_string()),
        primary_collection_id: Some("DSM:1981".to_string()),
        ..StrainRecord::default()
    };
    assert_eq!(record.determine_canonical_id(), "NCBITaxon:1286640");
}

#[test]
fn fallback_chain() {
    let ids = assorted_records()
        .iter()
        .map(StrainRecord::determine_canonical_id)
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec![
            "kgmicrobe.strain:unknown_row0",
            "bacdive:12345",
            "NCBITaxon:1286640",
            "DSM:1981",
            "kgmicrobe.strain:methylorubrum_extorquens_am1",
            "kgmicrobe.strain:growth_preferences_row14",
        ]
    );
}

#[test]
fn xrefs_exclude_the_canonical_id() {
    let record = StrainRecord {
        bacdive_id: Some("12345".to_string()),
        ncbi_taxon_id: Some("NCBITaxon:408".to_string()),
        species_taxon_id: Some("408".to_string()),
        culture_collection_ids: vec!["DSM 1338".to_string()],
        genome_accession: Some("GCF_000022685.1".to_string()),
        ..StrainRecord::default()
    };
    assert_eq!(
        record.collect_xrefs(),
        vec![
            "DSM:1338".to_string(),
            "NCBITaxon:408".to_string(),
            "assembly:GCF_000022685.1".to_string(),
        ]
    );
}
