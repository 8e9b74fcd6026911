//! Synthesis of boundary reactions: exchanges, sinks and ATP maintenance
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{Reaction, SBO_ATP_MAINTENANCE, SBO_EXCHANGE, SBO_SINK};
use crate::reconstruction::boundary_reaction_id;
use indexmap::IndexMap;

/// Add an exchange reaction (`met <->`) for every extracellular metabolite
///
/// # Parameters
/// - `model`: Model to extend
/// - `default_lb`: Lower bound of the new reactions, None leaves uptake unbounded
/// - `default_ub`: Upper bound of the new reactions, None leaves secretion unbounded
///
/// # Returns
/// Ids of the created reactions, in metabolite order. An existing reaction with the same id
/// is replaced.
pub fn create_exchange_reactions(
    model: &mut Model,
    default_lb: Option<f64>,
    default_ub: Option<f64>,
) -> Vec<String> {
    let lower_bound = default_lb.unwrap_or(f64::NEG_INFINITY);
    let upper_bound = default_ub.unwrap_or(f64::INFINITY);
    let extracellular: Vec<String> = model
        .metabolites
        .values()
        .filter(|m| m.is_extracellular())
        .map(|m| m.id.clone())
        .collect();

    let mut created = Vec::with_capacity(extracellular.len());
    for met_id in extracellular {
        let mut reaction = boundary_reaction(
            boundary_reaction_id("EX", &met_id),
            &met_id,
            lower_bound,
            upper_bound,
        );
        reaction.is_exchange = true;
        reaction.set_sbo_term(SBO_EXCHANGE);
        let id = reaction.id.clone();
        match model.add_reaction(reaction) {
            Ok(()) => created.push(id),
            Err(err) => log::warn!("Unable to add exchange reaction for {}: {}", met_id, err),
        }
    }
    log::debug!("Created {} exchange reactions", created.len());
    created
}

/// Add a sink reaction (`met -->`, bounds `[0, 1000]`) for each of the given metabolites
///
/// Metabolites which are not in the model are skipped.
pub fn create_sink_reactions<S: AsRef<str>>(model: &mut Model, metabolites: &[S]) -> Vec<String> {
    let mut created = Vec::new();
    for met_id in metabolites.iter().map(|m| m.as_ref()) {
        if !model.metabolites.contains_key(met_id) {
            log::debug!("Skipping sink for {}, metabolite not in the model", met_id);
            continue;
        }
        let mut reaction =
            boundary_reaction(boundary_reaction_id("sink", met_id), met_id, 0., 1000.);
        reaction.is_sink = true;
        reaction.set_sbo_term(SBO_SINK);
        let id = reaction.id.clone();
        match model.add_reaction(reaction) {
            Ok(()) => created.push(id),
            Err(err) => log::warn!("Unable to add sink reaction for {}: {}", met_id, err),
        }
    }
    created
}

/// Add the non growth associated ATP maintenance reaction
///
/// `atp_c + h2o_c --> adp_c + h_c + pi_c`, ids are prefixed with `M_` when the model uses
/// SBML style identifiers.
///
/// # Returns
/// Id of the new reaction (`ATPM` or `R_ATPM`)
pub fn add_maintenance_atp(model: &mut Model, lb: f64, ub: f64) -> Result<String, ModelError> {
    let prefixed = model.uses_sbml_prefixes();
    let met = |id: &str| {
        if prefixed {
            format!("M_{}", id)
        } else {
            id.to_string()
        }
    };
    let mut metabolites = IndexMap::new();
    metabolites.insert(met("atp_c"), -1.);
    metabolites.insert(met("h2o_c"), -1.);
    metabolites.insert(met("adp_c"), 1.);
    metabolites.insert(met("h_c"), 1.);
    metabolites.insert(met("pi_c"), 1.);
    let id = if prefixed { "R_ATPM" } else { "ATPM" };

    let mut reaction = bare_reaction(id.to_string(), metabolites, lb, ub);
    reaction.name = Some("ATP maintenance requirement".to_string());
    reaction.set_sbo_term(SBO_ATP_MAINTENANCE);
    model.add_reaction(reaction)?;
    Ok(id.to_string())
}

/// Set the bounds of every exchange reaction
pub fn set_exchange_bounds(model: &mut Model, lb: f64, ub: f64) {
    for reaction in model.reactions.values_mut().filter(|r| r.is_exchange) {
        reaction.lower_bound = lb;
        reaction.upper_bound = ub;
    }
}

fn boundary_reaction(id: String, met_id: &str, lower_bound: f64, upper_bound: f64) -> Reaction {
    let mut metabolites = IndexMap::new();
    metabolites.insert(met_id.to_string(), -1.);
    bare_reaction(id, metabolites, lower_bound, upper_bound)
}

fn bare_reaction(
    id: String,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
) -> Reaction {
    Reaction {
        id,
        metabolites,
        name: None,
        gene_reaction_rule: String::new(),
        lower_bound,
        upper_bound,
        objective_coefficient: 0.,
        is_exchange: false,
        is_sink: false,
        subsystem: None,
        notes: None,
        annotation: IndexMap::new(),
    }
}
