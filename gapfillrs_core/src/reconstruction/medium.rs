//! Translation of growth media into exchange reaction bounds
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

/// A set of flux bounds keyed by reaction id
///
/// Constraints are values: building them never touches a model, applying them returns the
/// bounds they replaced so they can be put back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediumConstraints {
    bounds: IndexMap<String, (f64, f64)>,
}

impl MediumConstraints {
    pub fn new(bounds: IndexMap<String, (f64, f64)>) -> Self {
        Self { bounds }
    }

    /// Bounds keyed by reaction id
    pub fn bounds(&self) -> &IndexMap<String, (f64, f64)> {
        &self.bounds
    }

    /// Bounds for one reaction
    pub fn get(&self, reaction_id: &str) -> Option<(f64, f64)> {
        self.bounds.get(reaction_id).copied()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Combine with another set of constraints, `other` wins on conflicts
    pub fn merge(&mut self, other: &MediumConstraints) {
        for (id, bounds) in &other.bounds {
            self.bounds.insert(id.clone(), *bounds);
        }
    }

    /// Write the bounds into the model
    ///
    /// Reactions missing from the model are ignored.
    ///
    /// # Returns
    /// The bounds which were replaced, applying them restores the model
    pub fn apply(&self, model: &mut Model) -> MediumConstraints {
        let mut previous = IndexMap::new();
        for (id, (lower_bound, upper_bound)) in &self.bounds {
            if let Some(reaction) = model.reactions.get_mut(id) {
                previous.insert(id.clone(), (reaction.lower_bound, reaction.upper_bound));
                reaction.lower_bound = *lower_bound;
                reaction.upper_bound = *upper_bound;
            }
        }
        MediumConstraints::new(previous)
    }

    /// Write the bounds into the model for the lifetime of the returned guard
    ///
    /// The previous bounds are restored when the guard is dropped.
    pub fn apply_scoped<'a>(&self, model: &'a mut Model) -> BoundsGuard<'a> {
        let previous = self.apply(model);
        BoundsGuard { model, previous }
    }
}

/// Restores the bounds of a model when dropped, see [`MediumConstraints::apply_scoped`]
pub struct BoundsGuard<'a> {
    model: &'a mut Model,
    previous: MediumConstraints,
}

impl Deref for BoundsGuard<'_> {
    type Target = Model;

    fn deref(&self) -> &Self::Target {
        &*self.model
    }
}

impl DerefMut for BoundsGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.model
    }
}

impl Drop for BoundsGuard<'_> {
    fn drop(&mut self) {
        self.previous.apply(&mut *self.model);
    }
}

/// Build constraints opening uptake of the listed compounds
///
/// Every exchange reaction gets lower bound `-max_uptake` when its metabolite's compound key
/// (or its full id) is listed, `0` otherwise. Upper bounds are kept.
///
/// # Parameters
/// - `model`: Model whose exchange reactions are constrained, it is not modified
/// - `compounds`: Compound keys (e.g. `glc__D`) available in the medium
/// - `max_uptake`: Uptake rate allowed for each available compound
pub fn medium_to_constraints<S: AsRef<str>>(
    model: &Model,
    compounds: &[S],
    max_uptake: f64,
) -> MediumConstraints {
    let available: HashSet<&str> = compounds.iter().map(|c| c.as_ref()).collect();
    let mut bounds = IndexMap::new();
    for reaction in model.exchange_reactions() {
        let in_medium = match reaction.boundary_metabolite() {
            Some((met_id, _)) => {
                let key = compound_key_of(model, met_id);
                available.contains(key.as_str()) || available.contains(met_id)
            }
            None => false,
        };
        let lower_bound = if in_medium { -max_uptake } else { 0. };
        bounds.insert(reaction.id.clone(), (lower_bound, reaction.upper_bound));
    }
    MediumConstraints::new(bounds)
}

/// Compound key of a metabolite, falling back to the id alone for unknown metabolites
fn compound_key_of(model: &Model, met_id: &str) -> String {
    match model.metabolites.get(met_id) {
        Some(met) => met.compound_key().to_string(),
        None => Metabolite::new(met_id).compound_key().to_string(),
    }
}

/// A named growth medium
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    /// Name of the medium, as used in the media database
    pub name: String,
    /// Compound keys of the available nutrients
    pub compounds: Vec<String>,
    /// Uptake rate allowed for every compound without an override
    pub max_uptake: f64,
    /// Uptake rates for specific compounds
    pub overrides: IndexMap<String, f64>,
}

impl Medium {
    pub fn new(name: &str, compounds: Vec<String>, max_uptake: f64) -> Self {
        Self {
            name: name.to_string(),
            compounds,
            max_uptake,
            overrides: IndexMap::new(),
        }
    }

    /// Set the uptake rate of one compound, adding it to the medium when absent
    pub fn set_uptake(&mut self, compound: &str, max_uptake: f64) {
        if !self.compounds.iter().any(|c| c == compound) {
            self.compounds.push(compound.to_string());
        }
        self.overrides.insert(compound.to_string(), max_uptake);
    }

    /// Add compounds, ignoring those already present
    pub fn extend<S: AsRef<str>>(&mut self, compounds: &[S]) {
        for compound in compounds.iter().map(|c| c.as_ref()) {
            if !self.compounds.iter().any(|c| c == compound) {
                self.compounds.push(compound.to_string());
            }
        }
    }

    /// Exchange bounds realising this medium in `model`
    pub fn to_constraints(&self, model: &Model) -> MediumConstraints {
        let mut constraints = medium_to_constraints(model, &self.compounds, self.max_uptake);
        if self.overrides.is_empty() {
            return constraints;
        }
        for reaction in model.exchange_reactions() {
            let Some((met_id, _)) = reaction.boundary_metabolite() else {
                continue;
            };
            let key = compound_key_of(model, met_id);
            if let Some(uptake) = self.overrides.get(&key).or(self.overrides.get(met_id)) {
                constraints
                    .bounds
                    .insert(reaction.id.clone(), (-uptake, reaction.upper_bound));
            }
        }
        constraints
    }
}
