//! Construction and mass normalization of the biomass pseudo-reaction
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::formula::molecular_weight;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{Reaction, SBO_BIOMASS};
use indexmap::IndexMap;
use thiserror::Error;

/// Add a biomass reaction and make it the model's only objective
///
/// # Parameters
/// - `model`: Model to extend
/// - `stoichiometry`: Biomass composition, negative coefficients are consumed
/// - `label`: Optional label, the reaction id is `Growth_<label>` (or `Growth` without one)
///
/// # Returns
/// Id of the new reaction
pub fn add_biomass_equation(
    model: &mut Model,
    stoichiometry: &IndexMap<String, f64>,
    label: Option<&str>,
) -> Result<String, ModelError> {
    let id = match label {
        Some(label) => format!("Growth_{}", label),
        None => "Growth".to_string(),
    };
    let upper_bound = CONFIGURATION
        .read()
        .map(|c| c.upper_bound)
        .unwrap_or(1000.);
    let mut reaction = Reaction {
        id: id.clone(),
        metabolites: stoichiometry.clone(),
        name: Some("Biomass reaction".to_string()),
        gene_reaction_rule: String::new(),
        lower_bound: 0.,
        upper_bound,
        objective_coefficient: 1.,
        is_exchange: false,
        is_sink: false,
        subsystem: None,
        notes: None,
        annotation: IndexMap::new(),
    };
    reaction.set_sbo_term(SBO_BIOMASS);
    model.add_reaction(reaction)?;
    model.set_growth_reaction(&id)?;
    Ok(id)
}

/// Reasons the weight of a biomass composition can't be computed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationIssue {
    #[error("Unable to normalize {biomass}: metabolite {metabolite} is not in the model")]
    MissingMetabolite { biomass: String, metabolite: String },
    #[error("Unable to normalize {biomass} due to missing formula for {metabolite}")]
    MissingFormula { biomass: String, metabolite: String },
    #[error("Unable to normalize {biomass} due to invalid formula {formula} for {metabolite}")]
    InvalidFormula {
        biomass: String,
        metabolite: String,
        formula: String,
    },
}

/// Result of normalizing a biomass composition
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationOutcome {
    /// Coefficients were rescaled, `weight` is the weight before rescaling
    Normalized { weight: f64 },
    /// The weight couldn't be computed, coefficients are unchanged
    Skipped(NormalizationIssue),
    /// The weight is not positive, coefficients are unchanged
    NonPositiveWeight { weight: f64 },
}

/// Weight (g/mmol) of the biomass produced by one unit of flux, `-Σ coeff·mw`
///
/// Formulas listing alternatives separated by `;` contribute their mean weight.
pub fn biomass_weight(
    biomass_id: &str,
    coeffs: &IndexMap<String, f64>,
    model: &Model,
) -> Result<f64, NormalizationIssue> {
    let mut weight = 0.;
    for (met_id, coeff) in coeffs {
        let metabolite =
            model
                .metabolites
                .get(met_id)
                .ok_or_else(|| NormalizationIssue::MissingMetabolite {
                    biomass: biomass_id.to_string(),
                    metabolite: met_id.clone(),
                })?;
        let formula = metabolite
            .formula
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| NormalizationIssue::MissingFormula {
                biomass: biomass_id.to_string(),
                metabolite: met_id.clone(),
            })?;
        let alternatives = formula
            .split(';')
            .map(molecular_weight)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| NormalizationIssue::InvalidFormula {
                biomass: biomass_id.to_string(),
                metabolite: met_id.clone(),
                formula: formula.to_string(),
            })?;
        let met_weight = alternatives.iter().sum::<f64>() / alternatives.len() as f64;
        weight -= coeff * met_weight;
    }
    Ok(weight)
}

/// Rescale a biomass composition so one unit of flux produces 1 g of biomass
///
/// Coefficients are multiplied by `1000 / weight`. When the weight can't be computed or is
/// not positive a warning is logged and the coefficients are left as they are.
pub fn normalize_coefficients(
    biomass_id: &str,
    coeffs: &mut IndexMap<String, f64>,
    model: &Model,
) -> NormalizationOutcome {
    let weight = match biomass_weight(biomass_id, coeffs, model) {
        Ok(weight) => weight,
        Err(issue) => {
            log::warn!("{}", issue);
            return NormalizationOutcome::Skipped(issue);
        }
    };
    if weight <= 0. {
        log::warn!(
            "Unable to normalize {}: biomass weight {} is not positive",
            biomass_id,
            weight
        );
        return NormalizationOutcome::NonPositiveWeight { weight };
    }
    let factor = 1000. / weight;
    for coeff in coeffs.values_mut() {
        *coeff *= factor;
    }
    NormalizationOutcome::Normalized { weight }
}
