use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KgError {
    #[error("invalid source specifier: {0}")]
    InvalidSourceSpecifier(String),

    #[error("invalid CURIE: {0}")]
    InvalidCurie(String),

    #[error("unknown taxonomic rank: {0}")]
    InvalidRank(String),

    #[error("missing config file culture-kg.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("malformed JSON-Lines record: {0}")]
    JsonLines(String),

    #[error("NCBI request failed: {0}")]
    NcbiHttp(String),

    #[error("NCBI returned status {status}: {message}")]
    NcbiStatus { status: u16, message: String },
}
