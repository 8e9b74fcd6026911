//! Constraint based analysis of metabolic models
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::problem::{Problem, ProblemError};
use indexmap::IndexMap;

pub mod fba;

/// Add one steady state (`S·v = 0`) constraint per metabolite touched by `reactions`
///
/// Flux variables must already be in the problem, using the reaction ids as variable ids.
/// Metabolites not touched by any reaction don't get a constraint.
pub(crate) fn add_mass_balance<'a>(
    problem: &mut Problem,
    reactions: impl IntoIterator<Item = &'a Reaction>,
) -> Result<(), ProblemError> {
    let mut rows: IndexMap<&str, (Vec<&str>, Vec<f64>)> = IndexMap::new();
    for reaction in reactions {
        for (met, coef) in &reaction.metabolites {
            let row = rows.entry(met.as_str()).or_default();
            row.0.push(reaction.id.as_str());
            row.1.push(*coef);
        }
    }
    for (met, (variables, coefficients)) in rows {
        problem.add_new_equality_constraint(
            &format!("mass_balance:{}", met),
            &variables,
            &coefficients,
            0.,
        )?;
    }
    Ok(())
}

/// Flux bounds of a reaction, letting an override take precedence
pub(crate) fn effective_bounds(
    reaction: &Reaction,
    overrides: Option<&IndexMap<String, (f64, f64)>>,
) -> (f64, f64) {
    overrides
        .and_then(|o| o.get(&reaction.id).copied())
        .unwrap_or((reaction.lower_bound, reaction.upper_bound))
}
