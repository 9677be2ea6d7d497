use std::time::Duration;

use assert_matches::assert_matches;

use culture_kg::config::{Config, ConfigLoader, SourceEntry};
use culture_kg::domain::SourceKind;
use culture_kg::error::KgError;

#[test]
fn load_fixture_config() {
    let resolved = ConfigLoader::resolve(Some("tests/fixtures/culture-kg.json")).unwrap();
    assert_eq!(resolved.schema_version, 1);
    let kinds = resolved
        .sources
        .iter()
        .map(|source| source.kind)
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![SourceKind::Strains, SourceKind::Bacdive, SourceKind::Growth]
    );
    assert_eq!(resolved.sources[1].path.as_str(), "tests/fixtures/bacdive.tsv");
    assert_eq!(
        resolved.media_ingredients.as_ref().map(|path| path.as_str()),
        Some("tests/fixtures/media.tsv")
    );
    assert_eq!(resolved.output_dir.as_str(), "output");
    assert_eq!(resolved.graph_name, "fixture_kg");
    assert!(resolved.enrich.enabled);
    assert_eq!(resolved.enrich.options.delay, Duration::ZERO);
    assert_eq!(resolved.enrich.options.limit, Some(5));
}

#[test]
fn explicit_missing_path_is_a_read_error() {
    let err = ConfigLoader::resolve(Some("tests/fixtures/absent.json")).unwrap_err();
    assert_matches!(err, KgError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("culture-kg.json");
    std::fs::write(&path, "{ \"sources\": 3 }").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, KgError::ConfigParse(_));
}

#[test]
fn bad_shorthand_source_is_rejected() {
    let config = Config {
        sources: vec![SourceEntry::Shorthand("genomes:x.tsv".to_string())],
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, KgError::InvalidSourceSpecifier(_));
}
