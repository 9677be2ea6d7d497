use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{INGREDIENT_PREFIX, slug};
use crate::error::KgError;
use crate::kgx::{self, KgxEdge, KgxNode};
use crate::strains::parsing::read_tsv;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngredientRow {
    pub media_id: String,
    pub media_name: Option<String>,
    pub ingredient_id: Option<String>,
    pub ingredient_name: Option<String>,
    pub amount: Option<String>,
    pub unit: Option<String>,
    pub row: usize,
}

impl IngredientRow {
    pub fn ingredient_node_id(&self) -> Option<String> {
        if let Some(id) = self.ingredient_id.as_deref() {
            return Some(id.to_string());
        }
        let name = slug(self.ingredient_name.as_deref()?);
        (!name.is_empty()).then(|| format!("{INGREDIENT_PREFIX}:{name}"))
    }
}

pub fn parse_media_ingredients(path: &Path) -> Result<Vec<IngredientRow>, KgError> {
    let Some(rows) = read_tsv(path)? else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(media_id) = row.get(&["media_id", "medium_id"]) else {
            tracing::debug!(row = row.row, "ingredient row without media id");
            continue;
        };
        let ingredient = IngredientRow {
            media_id: media_id.to_string(),
            media_name: row.get(&["media_name", "medium_name"]).map(str::to_string),
            ingredient_id: row
                .get(&["ingredient_id", "chebi_id", "compound_id"])
                .map(str::to_string),
            ingredient_name: row
                .get(&["ingredient_name", "ingredient", "compound"])
                .map(str::to_string),
            amount: row.get(&["amount", "concentration"]).map(str::to_string),
            unit: row.get(&["unit", "units"]).map(str::to_string),
            row: row.row,
        };
        if ingredient.ingredient_node_id().is_none() {
            tracing::debug!(row = row.row, "ingredient row without ingredient");
            continue;
        }
        out.push(ingredient);
    }
    Ok(out)
}

pub fn media_graph(rows: &[IngredientRow]) -> (Vec<KgxNode>, Vec<KgxEdge>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for row in rows {
        let Some(ingredient_id) = row.ingredient_node_id() else {
            continue;
        };

        let mut medium = KgxNode::new(row.media_id.clone(), kgx::CATEGORY_CHEMICAL_MIXTURE);
        medium.name = row.media_name.clone();
        medium.provided_by = vec![kgx::PROVIDED_BY.to_string()];
        nodes.push(medium);

        let mut ingredient = KgxNode::new(ingredient_id.clone(), kgx::CATEGORY_CHEMICAL_ENTITY);
        ingredient.name = row.ingredient_name.clone();
        ingredient.provided_by = vec![kgx::PROVIDED_BY.to_string()];
        nodes.push(ingredient);

        let mut edge = KgxEdge::new(row.media_id.clone(), kgx::PREDICATE_HAS_PART, ingredient_id);
        edge.relation = Some(kgx::RELATION_HAS_PART.to_string());
        edge.knowledge_level = Some(kgx::KNOWLEDGE_ASSERTION.to_string());
        edge.agent_type = Some(kgx::MANUAL_AGENT.to_string());
        edge.primary_knowledge_source = Some(kgx::PROVIDED_BY.to_string());
        if let Some(amount) = &row.amount {
            edge.extra
                .insert("amount".to_string(), Value::String(amount.clone()));
        }
        if let Some(unit) = &row.unit {
            edge.extra
                .insert("unit".to_string(), Value::String(unit.clone()));
        }
        edges.push(edge);
    }
    (nodes, edges)
}
