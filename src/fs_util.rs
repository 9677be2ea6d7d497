use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::KgError;

pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, KgError> {
    let file = File::open(path)
        .map_err(|err| KgError::Filesystem(format!("open {}: {err}", path.display())))?;
    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), KgError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| KgError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".culture-kg")
        .tempfile_in(parent)
        .map_err(|err| KgError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| KgError::Filesystem(err.to_string()))?;
    temp.flush()
        .map_err(|err| KgError::Filesystem(err.to_string()))?;
    temp.persist(path)
        .map_err(|err| KgError::Filesystem(format!("persist {}: {err}", path.display())))?;
    Ok(())
}
