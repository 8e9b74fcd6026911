//! Reading of reaction penalty tables
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;

use crate::io::media::csv_error;
use crate::io::IoError;

/// Read a headerless tab separated table of `reaction id`, `penalty` rows
///
/// Penalties are the activation costs used when gap-filling, they must be finite and not
/// negative. A reaction listed twice keeps its last penalty.
pub fn read_penalties<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, f64>, IoError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let mut penalties = IndexMap::new();
    for row in reader.deserialize::<(String, f64)>() {
        let (reaction, penalty) = row.map_err(|e| csv_error(path, e))?;
        if !penalty.is_finite() || penalty < 0. {
            return Err(IoError::parse(
                path,
                format!("invalid penalty {} for {}", penalty, reaction),
            ));
        }
        penalties.insert(reaction, penalty);
    }
    log::debug!("Read {} penalties from {}", penalties.len(), path.display());
    Ok(penalties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn read_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("penalties.tsv");
        fs::write(&path, "R1\t5\nR2\t0.5\nR1\t2.5\n").unwrap();
        let penalties = read_penalties(&path).unwrap();
        assert_eq!(penalties.len(), 2);
        assert_eq!(penalties["R1"], 2.5);
        assert_eq!(penalties["R2"], 0.5);
    }

    #[test]
    fn negative_penalties_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("penalties.tsv");
        fs::write(&path, "R1\t-1\n").unwrap();
        assert!(matches!(read_penalties(&path), Err(IoError::Parse { .. })));
        fs::write(&path, "R1\tcheap\n").unwrap();
        assert!(matches!(read_penalties(&path), Err(IoError::Parse { .. })));
    }
}
