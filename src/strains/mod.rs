pub mod consolidation;
pub mod export;
pub mod inference;
pub mod models;
pub mod parsing;

pub use consolidation::{
    ConsolidationSummary, consolidate_strains, consolidate_strains_with_summary,
    consolidation_key, deduplicate_by_canonical_id,
};
pub use inference::{
    InferenceSummary, infer_species_from_bacdive, infer_species_from_self,
    infer_taxonomic_ranks, run_inference,
};
pub use models::{StrainRecord, merge_records};
