//! Module for reading and writing models, media and biomass compositions
use crate::metabolic_model::model::ModelError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub mod biomass;
pub mod json;
pub mod media;
pub mod penalties;

/// Errors raised while reading or writing files, each carrying the offending path
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Inconsistent model in {}: {source}", .path.display())]
    Model { path: PathBuf, source: ModelError },
}

impl IoError {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        IoError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        IoError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, message: impl ToString) -> Self {
        IoError::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Path of the file which caused the error
    pub fn path(&self) -> &Path {
        match self {
            IoError::Read { path, .. }
            | IoError::Write { path, .. }
            | IoError::Parse { path, .. }
            | IoError::Model { path, .. } => path,
        }
    }
}

/// Identifier convention used when writing a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flavor {
    /// Bare identifiers (`glc__D_e`, `EX_glc__D_e`)
    #[default]
    Cobra,
    /// SBML style prefixed identifiers (`M_glc__D_e`, `R_EX_glc__D_e`, `G_b0001`)
    Fbc2,
}

impl Flavor {
    /// Write an id in this flavor, `prefix` is the SBML prefix for the kind of element
    pub fn convert_id(&self, id: &str, prefix: &str) -> String {
        match self {
            Flavor::Cobra => id.strip_prefix(prefix).unwrap_or(id).to_string(),
            Flavor::Fbc2 if id.starts_with(prefix) => id.to_string(),
            Flavor::Fbc2 => format!("{}{}", prefix, id),
        }
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cobra" => Ok(Flavor::Cobra),
            "fbc2" => Ok(Flavor::Fbc2),
            other => Err(format!("unknown flavor `{}`", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_ids() {
        assert_eq!(Flavor::Cobra.convert_id("M_glc__D_e", "M_"), "glc__D_e");
        assert_eq!(Flavor::Cobra.convert_id("glc__D_e", "M_"), "glc__D_e");
        assert_eq!(Flavor::Fbc2.convert_id("EX_glc__D_e", "R_"), "R_EX_glc__D_e");
        assert_eq!(Flavor::Fbc2.convert_id("R_PFK", "R_"), "R_PFK");
        assert_eq!("FBC2".parse::<Flavor>(), Ok(Flavor::Fbc2));
        assert!("sbml".parse::<Flavor>().is_err());
    }

    #[test]
    fn errors_carry_path() {
        let err = IoError::parse(Path::new("media.tsv"), "missing column");
        assert_eq!(err.path(), Path::new("media.tsv"));
        assert_eq!(err.to_string(), "Unable to parse media.tsv: missing column");
    }
}
