use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::enrich::{EnrichSummary, enrich_taxonomy};
use crate::error::KgError;
use crate::fs_util;
use crate::kgx::{KgxWriter, WriteSummary};
use crate::media::{media_graph, parse_media_ingredients};
use crate::ncbi::TaxonomyClient;
use crate::strains::export::{StrainExportSummary, strain_graph, write_strain_tsv};
use crate::strains::parsing::parse_source;
use crate::strains::{
    ConsolidationSummary, InferenceSummary, consolidate_strains_with_summary,
    deduplicate_by_canonical_id, infer_species_from_self, run_inference,
};

pub const STRAIN_NODES_FILE: &str = "strains_nodes.tsv";
pub const STRAIN_EDGES_FILE: &str = "strains_edges.tsv";
pub const BUILD_REPORT_FILE: &str = "build_report.json";

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub output_dir: Option<Utf8PathBuf>,
    pub enrich: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub kind: String,
    pub path: String,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub generated_at: String,
    pub output_dir: String,
    pub sources: Vec<SourceResult>,
    pub parsed_records: usize,
    pub inference: InferenceSummary,
    pub consolidation: ConsolidationSummary,
    pub enrichment: Option<EnrichSummary>,
    pub species_from_self_after_enrichment: usize,
    pub strains: usize,
    pub media_rows: usize,
    pub strain_tsv: StrainExportSummary,
    pub graph: WriteSummary,
    pub report_path: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct Pipeline<T: TaxonomyClient> {
    taxonomy: T,
}

impl<T: TaxonomyClient> Pipeline<T> {
    pub fn new(taxonomy: T) -> Self {
        Self { taxonomy }
    }

    pub fn run(
        &self,
        config: &ResolvedConfig,
        options: BuildOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BuildResult, KgError> {
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output_dir.clone());

        let mut records = Vec::new();
        let mut sources = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            sink.event(ProgressEvent {
                message: format!("phase=Parse; {}:{}", source.kind, source.path),
                elapsed: None,
            });
            let parsed = parse_source(source)?;
            sources.push(SourceResult {
                kind: source.kind.to_string(),
                path: source.path.to_string(),
                records: parsed.len(),
            });
            records.extend(parsed);
        }
        let parsed_records = records.len();

        sink.event(ProgressEvent {
            message: format!("phase=Infer; {parsed_records} records"),
            elapsed: None,
        });
        let inference = run_inference(&mut records);

        sink.event(ProgressEvent {
            message: "phase=Consolidate; merging records across sources".to_string(),
            elapsed: None,
        });
        let (mut records, consolidation) = consolidate_strains_with_summary(records);

        let enrich_enabled = options.enrich.unwrap_or(config.enrich.enabled);
        let mut enrichment = None;
        let mut species_from_self_after_enrichment = 0;
        if enrich_enabled {
            let mut enrich_options = config.enrich.options;
            if options.limit.is_some() {
                enrich_options.limit = options.limit;
            }
            sink.event(ProgressEvent {
                message: "phase=Enrich; querying NCBI taxonomy".to_string(),
                elapsed: None,
            });
            let start = Instant::now();
            let summary = enrich_taxonomy(&mut records, &self.taxonomy, enrich_options);
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Enrich; lookups={} enriched={} failed={}",
                    summary.lookups, summary.enriched, summary.failed
                ),
                elapsed: Some(start.elapsed()),
            });
            species_from_self_after_enrichment = infer_species_from_self(&mut records);
            enrichment = Some(summary);
        }

        let records = deduplicate_by_canonical_id(records);

        sink.event(ProgressEvent {
            message: format!("phase=Export; {} strains to {output_dir}", records.len()),
            elapsed: None,
        });
        let strain_tsv = write_strain_tsv(
            &records,
            output_dir.join(STRAIN_NODES_FILE).as_std_path(),
            output_dir.join(STRAIN_EDGES_FILE).as_std_path(),
        )?;

        let (mut nodes, mut edges) = strain_graph(&records);
        let mut media_rows = 0;
        if let Some(path) = &config.media_ingredients {
            sink.event(ProgressEvent {
                message: format!("phase=Media; {path}"),
                elapsed: None,
            });
            let rows = parse_media_ingredients(path.as_std_path())?;
            media_rows = rows.len();
            let (media_nodes, media_edges) = media_graph(&rows);
            nodes.extend(media_nodes);
            edges.extend(media_edges);
        }

        let writer = KgxWriter::new(output_dir.clone(), config.graph_name.clone());
        let graph = writer.write(nodes, edges)?;

        let report_path = output_dir.join(BUILD_REPORT_FILE);
        let result = BuildResult {
            generated_at: chrono::Utc::now().to_rfc3339(),
            output_dir: output_dir.to_string(),
            sources,
            parsed_records,
            inference,
            consolidation,
            enrichment,
            species_from_self_after_enrichment,
            strains: records.len(),
            media_rows,
            strain_tsv,
            graph,
            report_path: report_path.to_string(),
        };
        let report = serde_json::to_vec_pretty(&result)
            .map_err(|err| KgError::Filesystem(err.to_string()))?;
        fs_util::write_atomic(report_path.as_std_path(), &report)?;
        sink.event(ProgressEvent {
            message: format!("phase=Done; report at {report_path}"),
            elapsed: None,
        });

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::{Config, ConfigLoader, SourceEntry};
    use crate::ncbi::TaxonInfo;

    struct NoTaxonomy;

    impl TaxonomyClient for NoTaxonomy {
        fn fetch_taxon(&self, _taxon_id: &str) -> Result<Option<TaxonInfo>, KgError> {
            panic!("enrichment is disabled");
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: RefCell<Vec<String>>,
    }

    impl ProgressSink for RecordingSink {
        fn event(&self, event: ProgressEvent) {
            self.messages.borrow_mut().push(event.message);
        }
    }

    #[test]
    fn run_without_enrichment_writes_every_artifact() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("strains.tsv");
        std::fs::write(
            &input,
            "scientific_name\tstrain_designation\tculture_collection_ids\n\
             Escherichia coli\tK-12\tDSM 498\n",
        )
        .unwrap();
        let config = ConfigLoader::resolve_config(Config {
            sources: vec![SourceEntry::Shorthand(format!(
                "strains:{}",
                input.display()
            ))],
            ..Config::default()
        })
        .unwrap();
        let output = Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap();

        let sink = RecordingSink::default();
        let result = Pipeline::new(NoTaxonomy)
            .run(
                &config,
                BuildOptions {
                    output_dir: Some(output.clone()),
                    ..BuildOptions::default()
                },
                &sink,
            )
            .unwrap();

        assert_eq!(result.strains, 1);
        assert!(result.enrichment.is_none());
        assert!(output.join(STRAIN_NODES_FILE).exists());
        assert!(output.join("culture_kg_nodes.jsonl").exists());
        assert!(output.join(BUILD_REPORT_FILE).exists());
        let messages = sink.messages.borrow();
        assert!(messages[0].starts_with("phase=Parse;"));
        assert!(messages.last().unwrap().starts_with("phase=Done;"));
    }
}
