//! Reading of media databases
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::io::IoError;

/// One row of a media database, extra columns are ignored
#[derive(Debug, Deserialize)]
struct MediaRow {
    medium: String,
    compound: String,
}

/// Compositions of named media, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaDatabase {
    media: IndexMap<String, Vec<String>>,
}

impl MediaDatabase {
    pub fn new(media: IndexMap<String, Vec<String>>) -> Self {
        Self { media }
    }

    /// Read a tab separated media database with `medium` and `compound` columns
    ///
    /// Each row adds one compound to one medium, a compound listed twice for the same medium
    /// is kept once.
    pub fn read_tsv<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;
        let mut media: IndexMap<String, Vec<String>> = IndexMap::new();
        for row in reader.deserialize::<MediaRow>() {
            let row = row.map_err(|e| csv_error(path, e))?;
            let compounds = media.entry(row.medium).or_default();
            if !compounds.contains(&row.compound) {
                compounds.push(row.compound);
            }
        }
        log::debug!("Read {} media from {}", media.len(), path.display());
        Ok(Self { media })
    }

    /// Compounds of a medium
    pub fn get(&self, medium: &str) -> Option<&[String]> {
        self.media.get(medium).map(|c| c.as_slice())
    }

    pub fn contains(&self, medium: &str) -> bool {
        self.media.contains_key(medium)
    }

    /// Names of the media, in file order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.media.keys().map(|m| m.as_str())
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

/// Opening failures are read errors, everything else is a parse error
pub(crate) fn csv_error(path: &Path, err: csv::Error) -> IoError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => IoError::read(path, source),
            other => IoError::parse(path, format!("{:?}", other)),
        }
    } else {
        IoError::parse(path, err)
    }
}
