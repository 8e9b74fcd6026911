//! Reading of biomass composition databases
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;

use crate::io::media::csv_error;
use crate::io::IoError;
use crate::metabolic_model::model::Model;
use crate::reconstruction::biomass::normalize_coefficients;

/// Biomass compositions keyed by biomass id, each mapping metabolite ids to coefficients
pub type BiomassDatabase = IndexMap<String, IndexMap<String, f64>>;

/// Read a tab separated biomass database
///
/// The file has `bigg_id` and `comp` columns and one `@<biomass id>` column per composition.
/// Metabolite ids are built as `M_<bigg_id>_<comp>`; when a model is given they are written the
/// way the model writes them. Entries are ordered by metabolite and compartment.
///
/// # Parameters
/// - `path`: File to read
/// - `normalize`: Rescale each composition to 1 g of biomass per unit of flux
/// - `model`: Model providing identifiers and formulas, required to normalize
pub fn read_biomass_db<P: AsRef<Path>>(
    path: P,
    normalize: bool,
    model: Option<&Model>,
) -> Result<BiomassDatabase, IoError> {
    let path = path.as_ref();
    if normalize && model.is_none() {
        return Err(IoError::parse(
            path,
            "normalizing biomass weights requires a model with metabolite formulas",
        ));
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IoError::parse(path, format!("missing column `{}`", name)))
    };
    let id_column = column("bigg_id")?;
    let comp_column = column("comp")?;
    let biomass_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| h.strip_prefix('@').map(|id| (i, id.to_string())))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let (Some(bigg_id), Some(comp)) = (record.get(id_column), record.get(comp_column)) else {
            continue;
        };
        if bigg_id.is_empty() || comp.is_empty() {
            continue;
        }
        rows.push((bigg_id.to_string(), comp.to_string(), record));
    }
    rows.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));

    let mut database = BiomassDatabase::new();
    for (column, biomass_id) in &biomass_columns {
        let mut coeffs = IndexMap::new();
        for (bigg_id, comp, record) in &rows {
            let Some(cell) = record.get(*column).filter(|c| !c.is_empty()) else {
                continue;
            };
            let coeff: f64 = cell.parse().map_err(|_| {
                IoError::parse(
                    path,
                    format!("invalid coefficient `{}` for {} in @{}", cell, bigg_id, biomass_id),
                )
            })?;
            let met_id = format!("M_{}_{}", bigg_id, comp);
            let met_id = model
                .and_then(|m| m.resolve_metabolite_id(&met_id))
                .unwrap_or(met_id);
            coeffs.insert(met_id, coeff);
        }
        database.insert(biomass_id.clone(), coeffs);
    }

    if let (true, Some(model)) = (normalize, model) {
        for (biomass_id, coeffs) in database.iter_mut() {
            normalize_coefficients(biomass_id, coeffs, model);
        }
    }
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::reconstruction::biomass::biomass_weight;
    use approx::assert_relative_eq;
    use std::fs;

    const BIOMASS_DB: &str = "bigg_id\tname\tcomp\t@gramneg\t@grampos\n\
                              h2o\tWater\tc\t-2.0\t\n\
                              glc__D\tGlucose\tc\t-1.0\t-3.0\n\
                              \tUnnamed\tc\t-5.0\t-5.0\n";

    #[test]
    fn read_compositions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biomass.tsv");
        fs::write(&path, BIOMASS_DB).unwrap();
        let db = read_biomass_db(&path, false, None).unwrap();
        assert_eq!(db.keys().collect::<Vec<_>>(), vec!["gramneg", "grampos"]);
        let gramneg = &db["gramneg"];
        // sorted by metabolite, the row without an id is dropped
        assert_eq!(
            gramneg.keys().collect::<Vec<_>>(),
            vec!["M_glc__D_c", "M_h2o_c"]
        );
        assert_eq!(gramneg["M_h2o_c"], -2.);
        assert_eq!(db["grampos"].len(), 1);
    }

    #[test]
    fn ids_follow_the_model_and_weights_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biomass.tsv");
        fs::write(&path, BIOMASS_DB).unwrap();
        let mut model = Model::new_empty();
        for (id, formula) in [("glc__D_c", "C6H12O6"), ("h2o_c", "H2O")] {
            model.add_metabolite(
                MetaboliteBuilder::default()
                    .id(id)
                    .formula(formula)
                    .build()
                    .unwrap(),
            );
        }
        let db = read_biomass_db(&path, true, Some(&model)).unwrap();
        let gramneg = &db["gramneg"];
        assert!(gramneg.contains_key("glc__D_c"));
        let weight = biomass_weight("gramneg", gramneg, &model).unwrap();
        assert_relative_eq!(weight, 1000., epsilon = 1e-6);
    }

    #[test]
    fn normalizing_needs_a_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biomass.tsv");
        fs::write(&path, BIOMASS_DB).unwrap();
        assert!(matches!(
            read_biomass_db(&path, true, None),
            Err(IoError::Parse { .. })
        ));
    }
}
