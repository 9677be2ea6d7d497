pub mod app;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod fs_util;
pub mod kgx;
pub mod media;
pub mod ncbi;
pub mod output;
pub mod strains;
