//! This module provides the Model struct for representing an entire metabolic model
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

use indexmap::IndexMap;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use thiserror::Error;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model::default()
    }

    // region Adding Components
    /// Add a metabolite to the model, replacing any metabolite with the same id
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a reaction to the model
    ///
    /// Every metabolite in the reaction's stoichiometry must already be part of the model, a
    /// reaction with the same id is replaced.
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use gapfillrs_core::metabolic_model::model::Model;
    /// use gapfillrs_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction").build().unwrap();
    /// model.add_reaction(new_reaction).unwrap();
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ModelError> {
        let missing: Vec<String> = reaction
            .metabolites
            .keys()
            .filter(|m| !self.metabolites.contains_key(*m))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::MissingMetabolites {
                reaction: reaction.id,
                metabolites: missing,
            });
        }
        if reaction.lower_bound > reaction.upper_bound {
            return Err(ModelError::InvalidBounds {
                reaction: reaction.id,
                lower_bound: reaction.lower_bound,
                upper_bound: reaction.upper_bound,
            });
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
        Ok(())
    }

    /// Add a gene to the model
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }
    // endregion Adding Components

    // region Bounds
    /// Update the flux bounds of a reaction
    pub fn set_flux_bounds(
        &mut self,
        reaction_id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ModelError> {
        if lower_bound > upper_bound {
            return Err(ModelError::InvalidBounds {
                reaction: reaction_id.to_string(),
                lower_bound,
                upper_bound,
            });
        }
        match self.reactions.get_mut(reaction_id) {
            Some(rxn) => {
                rxn.lower_bound = lower_bound;
                rxn.upper_bound = upper_bound;
                Ok(())
            }
            None => Err(ModelError::ReactionNotFound(reaction_id.to_string())),
        }
    }
    // endregion Bounds

    // region Objective
    /// The reaction currently carrying the growth objective
    pub fn growth_reaction(&self) -> Option<&Reaction> {
        self.reactions.values().find(|r| r.is_growth())
    }

    /// Make `reaction_id` the only reaction in the objective
    pub fn set_growth_reaction(&mut self, reaction_id: &str) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::ReactionNotFound(reaction_id.to_string()));
        }
        for (id, rxn) in self.reactions.iter_mut() {
            rxn.objective_coefficient = if id == reaction_id { 1. } else { 0. };
        }
        Ok(())
    }
    // endregion Objective

    // region Queries
    /// Iterate over the exchange reactions of the model
    pub fn exchange_reactions(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values().filter(|r| r.is_exchange)
    }

    /// Whether the model uses SBML style identifiers (`M_glc__D_e`, `R_PFK`)
    pub fn uses_sbml_prefixes(&self) -> bool {
        self.metabolites.keys().any(|m| m.starts_with("M_"))
    }

    /// Find the id of a metabolite written with or without the `M_` prefix
    pub fn resolve_metabolite_id(&self, id: &str) -> Option<String> {
        if self.metabolites.contains_key(id) {
            return Some(id.to_string());
        }
        let alternative = match id.strip_prefix("M_") {
            Some(bare) => bare.to_string(),
            None => format!("M_{}", id),
        };
        self.metabolites
            .contains_key(&alternative)
            .then_some(alternative)
    }

    /// Build the sparse stoichiometric matrix (metabolites x reactions)
    ///
    /// # Returns
    /// A tuple of the matrix, the metabolite ids (rows) and the reaction ids (columns)
    pub fn stoichiometric_matrix(&self) -> (CscMatrix<f64>, Vec<String>, Vec<String>) {
        let mut coo = CooMatrix::new(self.metabolites.len(), self.reactions.len());
        for (col, rxn) in self.reactions.values().enumerate() {
            for (met, coef) in &rxn.metabolites {
                if let Some(row) = self.metabolites.get_index_of(met) {
                    coo.push(row, col, *coef);
                }
            }
        }
        (
            CscMatrix::from(&coo),
            self.metabolites.keys().cloned().collect(),
            self.reactions.keys().cloned().collect(),
        )
    }
    // endregion Queries
}

/// Errors raised when a model would become inconsistent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A reaction references metabolites which are not part of the model
    #[error("Reaction {reaction} references metabolites missing from the model: {}", .metabolites.join(", "))]
    MissingMetabolites {
        reaction: String,
        metabolites: Vec<String>,
    },
    /// Lower bound above upper bound
    #[error("Invalid bounds for {reaction}: lower bound {lower_bound} > upper bound {upper_bound}")]
    InvalidBounds {
        reaction: String,
        lower_bound: f64,
        upper_bound: f64,
    },
    /// Tried to access a reaction that doesn't exist
    #[error("Reaction {0} is not in the model")]
    ReactionNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn setup_model() -> Model {
        let mut model = Model::new_empty();
        model.add_metabolite(Metabolite::new("a_c"));
        model.add_metabolite(Metabolite::new("b_c"));
        let mut stoich = IndexMap::new();
        stoich.insert("a_c".to_string(), -1.);
        stoich.insert("b_c".to_string(), 1.);
        model
            .add_reaction(
                ReactionBuilder::default()
                    .id("A2B")
                    .metabolites(stoich)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let mut stoich = IndexMap::new();
        stoich.insert("b_c".to_string(), -2.);
        model
            .add_reaction(
                ReactionBuilder::default()
                    .id("Growth")
                    .metabolites(stoich)
                    .lower_bound(0.)
                    .objective_coefficient(1.)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        model
    }

    #[test]
    fn add_reaction_with_missing_metabolite() {
        let mut model = setup_model();
        let mut stoich = IndexMap::new();
        stoich.insert("a_c".to_string(), -1.);
        stoich.insert("z_c".to_string(), 1.);
        let res = model.add_reaction(
            ReactionBuilder::default()
                .id("A2Z")
                .metabolites(stoich)
                .build()
                .unwrap(),
        );
        match res {
            Err(ModelError::MissingMetabolites {
                reaction,
                metabolites,
            }) => {
                assert_eq!(reaction, "A2Z");
                assert_eq!(metabolites, vec!["z_c".to_string()]);
            }
            _ => panic!("Missing metabolite not caught"),
        }
        assert!(!model.reactions.contains_key("A2Z"));
    }

    #[test]
    fn growth_reaction_is_unique() {
        let mut model = setup_model();
        assert_eq!(model.growth_reaction().unwrap().id, "Growth");
        model.set_growth_reaction("A2B").unwrap();
        assert_eq!(model.growth_reaction().unwrap().id, "A2B");
        assert_eq!(model.reactions["Growth"].objective_coefficient, 0.);
        assert_eq!(
            model.set_growth_reaction("nope"),
            Err(ModelError::ReactionNotFound("nope".to_string()))
        );
    }

    #[test]
    fn flux_bounds() {
        let mut model = setup_model();
        model.set_flux_bounds("A2B", -5., 5.).unwrap();
        assert_eq!(model.reactions["A2B"].lower_bound, -5.);
        assert!(model.set_flux_bounds("A2B", 5., -5.).is_err());
    }

    #[test]
    fn resolve_prefixed_ids() {
        let mut model = Model::new_empty();
        model.add_metabolite(Metabolite::new("M_atp_c"));
        assert!(model.uses_sbml_prefixes());
        assert_eq!(
            model.resolve_metabolite_id("atp_c"),
            Some("M_atp_c".to_string())
        );
        assert_eq!(model.resolve_metabolite_id("adp_c"), None);
    }

    #[test]
    fn stoichiometric_matrix() {
        let model = setup_model();
        let (matrix, mets, rxns) = model.stoichiometric_matrix();
        assert_eq!(mets, vec!["a_c".to_string(), "b_c".to_string()]);
        assert_eq!(rxns, vec!["A2B".to_string(), "Growth".to_string()]);
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 2);
        assert_eq!(matrix.nnz(), 3);
    }
}
