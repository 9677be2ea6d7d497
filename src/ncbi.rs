use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{TaxonomicRank, taxon_number};
use crate::error::KgError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonInfo {
    pub taxon_id: String,
    pub scientific_name: Option<String>,
    pub rank: Option<TaxonomicRank>,
    pub species_taxon_id: Option<String>,
    pub parent_taxon_id: Option<String>,
}

/// Lookup of one NCBI taxon; `Ok(None)` means the taxon does not exist.
pub trait TaxonomyClient: Send + Sync {
    fn fetch_taxon(&self, taxon_id: &str) -> Result<Option<TaxonInfo>, KgError>;
}

#[derive(Clone)]
pub struct NcbiTaxonomyClient {
    client: Client,
    base_url: String,
}

impl NcbiTaxonomyClient {
    pub fn new() -> Result<Self, KgError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("culture-kg/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KgError::NcbiHttp(err.to_string()))?,
        );
        if let Ok(api_key) = std::env::var("NCBI_API_KEY") {
            if !api_key.trim().is_empty() {
                headers.insert(
                    "api-key",
                    HeaderValue::from_str(api_key.trim())
                        .map_err(|err| KgError::NcbiHttp(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| KgError::NcbiHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: "https://api.ncbi.nlm.nih.gov/datasets/v2".to_string(),
        })
    }
}

impl TaxonomyClient for NcbiTaxonomyClient {
    fn fetch_taxon(&self, taxon_id: &str) -> Result<Option<TaxonInfo>, KgError> {
        let Some(number) = taxon_number(taxon_id) else {
            return Ok(None);
        };
        let url = format!("{}/taxonomy/taxon/{number}/dataset_report", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| KgError::NcbiHttp(err.to_string()))?;
        let status = response.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "NCBI request failed".to_string());
            return Err(KgError::NcbiStatus { status, message });
        }
        let value: Value = response
            .json()
            .map_err(|err| KgError::NcbiHttp(err.to_string()))?;
        Ok(extract_taxon_info(&value))
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

pub fn extract_taxon_info(value: &Value) -> Option<TaxonInfo> {
    let taxonomy = value
        .get("reports")?
        .as_array()?
        .iter()
        .find_map(|report| report.get("taxonomy"))?;
    let taxon_id = taxonomy.get("tax_id").and_then(id_string)?;
    let scientific_name = taxonomy
        .get("current_scientific_name")
        .and_then(|name| name.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let rank = taxonomy
        .get("rank")
        .and_then(Value::as_str)
        .and_then(|rank| rank.parse().ok());
    let species_taxon_id = taxonomy
        .get("classification")
        .and_then(|classification| classification.get("species"))
        .and_then(|species| species.get("id"))
        .and_then(id_string);
    let parent_taxon_id = taxonomy
        .get("parents")
        .and_then(Value::as_array)
        .and_then(|parents| parents.last())
        .and_then(id_string);
    Some(TaxonInfo {
        taxon_id,
        scientific_name,
        rank,
        species_taxon_id,
        parent_taxon_id,
    })
}
