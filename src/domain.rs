use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use camino::Utf8PathBuf;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KgError;

pub const NCBI_TAXON_PREFIX: &str = "NCBITaxon";
pub const BACDIVE_PREFIX: &str = "bacdive";
pub const STRAIN_PREFIX: &str = "kgmicrobe.strain";
pub const INGREDIENT_PREFIX: &str = "kgmicrobe.ingredient";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomicRank {
    Domain,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Subspecies,
    Strain,
}

impl TaxonomicRank {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomicRank::Domain => "domain",
            TaxonomicRank::Phylum => "phylum",
            TaxonomicRank::Class => "class",
            TaxonomicRank::Order => "order",
            TaxonomicRank::Family => "family",
            TaxonomicRank::Genus => "genus",
            TaxonomicRank::Species => "species",
            TaxonomicRank::Subspecies => "subspecies",
            TaxonomicRank::Strain => "strain",
        }
    }
}

impl fmt::Display for TaxonomicRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaxonomicRank {
    type Err = KgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace(['_', '-', ' '], "");
        let rank = match normalized.as_str() {
            "domain" | "superkingdom" => TaxonomicRank::Domain,
            "phylum" => TaxonomicRank::Phylum,
            "class" => TaxonomicRank::Class,
            "order" => TaxonomicRank::Order,
            "family" => TaxonomicRank::Family,
            "genus" => TaxonomicRank::Genus,
            "species" => TaxonomicRank::Species,
            "subspecies" => TaxonomicRank::Subspecies,
            "strain" | "isolate" => TaxonomicRank::Strain,
            _ => return Err(KgError::InvalidRank(value.to_string())),
        };
        Ok(rank)
    }
}

pub fn taxon_number(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let local = match trimmed.split_once(':') {
        Some((prefix, rest)) => {
            let prefix = prefix.trim().to_ascii_lowercase();
            if !matches!(prefix.as_str(), "ncbitaxon" | "taxon" | "ncbi" | "taxid") {
                return None;
            }
            rest.trim()
        }
        None => trimmed,
    };
    (!local.is_empty() && local.chars().all(|ch| ch.is_ascii_digit())).then_some(local)
}

pub fn taxon_curie(raw: &str) -> Option<String> {
    taxon_number(raw).map(|number| format!("{NCBI_TAXON_PREFIX}:{number}"))
}

const COLLECTION_REGISTRY: &[(&str, &str)] = &[
    ("atcc", "ATCC"),
    ("bccm", "BCCM"),
    ("ccm", "CCM"),
    ("ccug", "CCUG"),
    ("cect", "CECT"),
    ("cgmcc", "CGMCC"),
    ("cip", "CIP"),
    ("dsm", "DSM"),
    ("dsmz", "DSM"),
    ("icmp", "ICMP"),
    ("ifo", "NBRC"),
    ("jcm", "JCM"),
    ("kctc", "KCTC"),
    ("lmg", "LMG"),
    ("nbrc", "NBRC"),
    ("nccb", "NCCB"),
    ("ncimb", "NCIMB"),
    ("nctc", "NCTC"),
    ("nrrl", "NRRL"),
    ("pcc", "PCC"),
    ("utex", "UTEX"),
    ("vkm", "VKM"),
];

pub fn canonical_collection_prefix(prefix: &str) -> Option<&'static str> {
    let key = prefix.trim().to_ascii_lowercase();
    COLLECTION_REGISTRY
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}

static COLLECTION_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)(?:[\s:_\-]+(\S.*)|(\d.*))$")
        .expect("collection id pattern is valid")
});

/// Normalizes `DSM 1981`, `dsmz:1981` or `DSM1981` to `DSM:1981`.
///
/// Unregistered prefixes keep their upper-cased spelling; values with no prefix or no
/// local part yield `None`.
pub fn normalize_collection_id(raw: &str) -> Option<String> {
    let captures = COLLECTION_ID_RE.captures(raw.trim())?;
    let prefix = captures.get(1)?.as_str();
    let local = captures
        .get(2)
        .or_else(|| captures.get(3))?
        .as_str()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    if local.is_empty() {
        return None;
    }
    let canonical = canonical_collection_prefix(prefix)
        .map(str::to_string)
        .unwrap_or_else(|| prefix.to_ascii_uppercase());
    Some(format!("{canonical}:{local}"))
}

pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Strains,
    Bacdive,
    Growth,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Strains => write!(f, "strains"),
            SourceKind::Bacdive => write!(f, "bacdive"),
            SourceKind::Growth => write!(f, "growth"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpecifier {
    pub kind: SourceKind,
    pub path: Utf8PathBuf,
}

impl FromStr for SourceSpecifier {
    type Err = KgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (kind, rest) = trimmed
            .split_once(':')
            .ok_or_else(|| KgError::InvalidSourceSpecifier(value.to_string()))?;
        if rest.trim().is_empty() {
            return Err(KgError::InvalidSourceSpecifier(value.to_string()));
        }
        let kind = match kind.trim() {
            "strains" => SourceKind::Strains,
            "bacdive" => SourceKind::Bacdive,
            "growth" => SourceKind::Growth,
            _ => return Err(KgError::InvalidSourceSpecifier(value.to_string())),
        };
        Ok(Self {
            kind,
            path: Utf8PathBuf::from(rest.trim()),
        })
    }
}
