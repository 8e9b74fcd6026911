//! Assembly and repair of genome scale models: boundary reactions, media, biomass and gap-filling

pub mod biomass;
pub mod boundary;
pub mod gapfill;
pub mod medium;
pub mod multigap;

/// Annotation key listing the media a reaction was added for by gap-filling
pub const GAPFILL_PROVENANCE_KEY: &str = "gapfill";

/// Prefix a synthesized reaction id the same way the metabolite it acts on is written
///
/// `M_glc__D_e` gives `R_<prefix>_glc__D_e`, `glc__D_e` gives `<prefix>_glc__D_e`
pub(crate) fn boundary_reaction_id(prefix: &str, metabolite_id: &str) -> String {
    match metabolite_id.strip_prefix("M_") {
        Some(bare) => format!("R_{}_{}", prefix, bare),
        None => format!("{}_{}", prefix, metabolite_id),
    }
}
