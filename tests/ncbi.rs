use culture_kg::domain::TaxonomicRank;
use culture_kg::ncbi::extract_taxon_info;

#[test]
fn extract_strain_report() {
    let content = std::fs::read_to_string("tests/fixtures/ncbi_taxon_1286640.json").unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let info = extract_taxon_info(&value).unwrap();

    assert_eq!(info.taxon_id, "1286640");
    assert_eq!(
        info.scientific_name.as_deref(),
        Some("Sinorhizobium meliloti 2011")
    );
    assert_eq!(info.rank, Some(TaxonomicRank::Strain));
    assert_eq!(info.species_taxon_id.as_deref(), Some("382"));
    assert_eq!(info.parent_taxon_id.as_deref(), Some("382"));
}

#[test]
fn unknown_rank_is_dropped() {
    let value = serde_json::json!({
        "reports": [{ "taxonomy": { "tax_id": "2", "rank": "no rank" } }]
    });
    let info = extract_taxon_info(&value).unwrap();
    assert_eq!(info.taxon_id, "2");
    assert_eq!(info.rank, None);
    assert_eq!(info.species_taxon_id, None);
}
