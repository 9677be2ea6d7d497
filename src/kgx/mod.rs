pub mod model;
pub mod writer;

pub use model::{KgxEdge, KgxNode};
pub use writer::{
    EDGE_ID_PREFIX, KgxWriter, WriteSummary, assign_edge_ids, deduplicate_edges,
    deduplicate_nodes, generate_edge_id, read_edges_jsonl, read_nodes_jsonl,
};

pub const CATEGORY_ORGANISM_TAXON: &str = "biolink:OrganismTaxon";
pub const CATEGORY_CHEMICAL_MIXTURE: &str = "biolink:ChemicalMixture";
pub const CATEGORY_CHEMICAL_ENTITY: &str = "biolink:ChemicalEntity";

pub const PREDICATE_SUBCLASS_OF: &str = "biolink:subclass_of";
pub const PREDICATE_HAS_PART: &str = "biolink:has_part";

pub const RELATION_SUBCLASS_OF: &str = "rdfs:subClassOf";
pub const RELATION_HAS_PART: &str = "BFO:0000051";

pub const KNOWLEDGE_ASSERTION: &str = "knowledge_assertion";
pub const MANUAL_AGENT: &str = "manual_agent";

pub const PROVIDED_BY: &str = "infores:culture-kg";
