use std::path::PathBuf;

use gapfillrs_core::configuration::Solver as SolverKind;
use gapfillrs_core::flux_analysis::fba::fba;
use gapfillrs_core::io::media::MediaDatabase;
use gapfillrs_core::io::Flavor;
use gapfillrs_core::metabolic_model::metabolite::Metabolite;
use gapfillrs_core::metabolic_model::model::Model;
use gapfillrs_core::metabolic_model::reaction::{Reaction, ReactionBuilder};
use gapfillrs_core::optimize::solvers::solver_for;
use gapfillrs_core::reconstruction::gapfill::{
    GapFillFailure, GapFillOptions, GapFillOptionsBuilder, GapFillOutcome,
};
use gapfillrs_core::reconstruction::medium::medium_to_constraints;
use gapfillrs_core::reconstruction::multigap::{multi_gap_fill, GapFillStrategy};
use gapfillrs_core::reconstruction::GAPFILL_PROVENANCE_KEY;
use indexmap::IndexSet;
use serde_json::json;

fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(name)
}

fn draft() -> Model {
    Model::read_json(test_data("test_models/toy_draft.json")).unwrap()
}

fn universe() -> Model {
    Model::read_json(test_data("test_models/toy_universe.json")).unwrap()
}

fn media_db() -> MediaDatabase {
    MediaDatabase::read_tsv(test_data("media_db.tsv")).unwrap()
}

fn options(strategy: GapFillStrategy) -> GapFillOptions {
    GapFillOptionsBuilder::default()
        .strategy(strategy)
        .processes(2u32)
        .build()
        .unwrap()
}

fn reaction(id: &str, stoich: &[(&str, f64)], lb: f64, ub: f64) -> Reaction {
    ReactionBuilder::default()
        .id(id)
        .metabolites(stoich.iter().map(|(m, c)| (m.to_string(), *c)).collect())
        .lower_bound(lb)
        .upper_bound(ub)
        .build()
        .unwrap()
}

/// Organism which takes up glucose and has to release oxygen to grow
fn oxygen_donor() -> Model {
    let mut model = Model::new_empty();
    for met in ["glc__D_e", "glc__D_c", "o2_c", "o2_e", "x_c"] {
        model.add_metabolite(Metabolite::new(met));
    }
    let mut glc_exchange = reaction("EX_glc__D_e", &[("glc__D_e", -1.)], -10., 1000.);
    glc_exchange.is_exchange = true;
    let mut o2_exchange = reaction("EX_o2_e", &[("o2_e", -1.)], -1000., 1000.);
    o2_exchange.is_exchange = true;
    let mut growth = reaction("Growth", &[("x_c", -1.)], 0., 1000.);
    growth.objective_coefficient = 1.;
    for r in [
        glc_exchange,
        o2_exchange,
        reaction("GLCt", &[("glc__D_e", -1.), ("glc__D_c", 1.)], 0., 1000.),
        reaction(
            "PS",
            &[("glc__D_c", -1.), ("o2_c", 1.), ("x_c", 1.)],
            0.,
            1000.,
        ),
        reaction("O2ex", &[("o2_c", -1.), ("o2_e", 1.)], 0., 1000.),
        growth,
    ] {
        model.add_reaction(r).unwrap();
    }
    model
}

/// The model's growth reaction reaches the minimum growth on every medium
fn assert_grows_on(model: &Model, media: &[&str], options: &GapFillOptions) {
    let media_db = media_db();
    let mut solver = solver_for(SolverKind::default_milp(), None).unwrap();
    for medium in media {
        let compounds = media_db.get(medium).unwrap();
        let constraints = medium_to_constraints(model, compounds, options.max_uptake);
        let solution = fba(model, Some(&constraints), solver.as_mut()).unwrap();
        assert!(solution.is_optimal(), "no growth on {}", medium);
        let growth = solution.objective_value.unwrap();
        assert!(
            growth >= options.min_growth,
            "growth {} on {} is below {}",
            growth,
            medium,
            options.min_growth
        );
    }
}

fn added(report_reactions: &[String]) -> IndexSet<&str> {
    report_reactions.iter().map(|r| r.as_str()).collect()
}

#[test]
fn sequential_gap_fill() {
    let mut model = draft();
    let original: Vec<String> = model.reactions.keys().cloned().collect();
    let report = multi_gap_fill(
        &mut model,
        &universe(),
        &["M9", "acetate"],
        &media_db(),
        &options(GapFillStrategy::Sequential),
        None,
    )
    .unwrap();

    assert_eq!(
        report.outcomes["M9"],
        GapFillOutcome::Filled(IndexSet::from(["O2t".to_string()]))
    );
    assert_eq!(
        added(&report.reactions_added),
        IndexSet::from(["O2t", "EX_ac_e", "ACt", "ACGLC"])
    );
    assert_eq!(report.metabolites_added, 2);
    assert!(report.failed_media.is_empty());
    // nothing is removed from the draft
    assert!(original.iter().all(|id| model.reactions.contains_key(id)));
    assert!(model.metabolites.contains_key("ac_c"));
    // the oxygen transport was added for the first medium only
    assert_eq!(
        model.reactions["O2t"].annotation[GAPFILL_PROVENANCE_KEY],
        json!(["M9"])
    );
    assert_eq!(
        model.reactions["ACGLC"].annotation[GAPFILL_PROVENANCE_KEY],
        json!(["acetate"])
    );
    assert_grows_on(
        &model,
        &["M9", "acetate"],
        &options(GapFillStrategy::Sequential),
    );
}

#[test]
fn independent_gap_fill_merges_selections() {
    let mut model = draft();
    let report = multi_gap_fill(
        &mut model,
        &universe(),
        &["M9", "acetate"],
        &media_db(),
        &options(GapFillStrategy::Independent),
        None,
    )
    .unwrap();

    assert_eq!(
        added(&report.reactions_added),
        IndexSet::from(["O2t", "EX_ac_e", "ACt", "ACGLC"])
    );
    match &report.outcomes["acetate"] {
        GapFillOutcome::Filled(ids) => assert_eq!(ids.len(), 4),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        model.reactions["O2t"].annotation[GAPFILL_PROVENANCE_KEY],
        json!(["M9", "acetate"])
    );
    assert!(model.reactions["EX_ac_e"].is_exchange);
    assert_grows_on(
        &model,
        &["M9", "acetate"],
        &options(GapFillStrategy::Independent),
    );
}

#[test]
fn failed_and_unknown_media_are_reported() {
    let mut model = draft();
    let report = multi_gap_fill(
        &mut model,
        &universe(),
        &["anaerobic", "M9", "RPMI"],
        &media_db(),
        &options(GapFillStrategy::Sequential),
        None,
    )
    .unwrap();

    assert_eq!(
        report.outcomes["anaerobic"],
        GapFillOutcome::Failed(GapFillFailure::Infeasible)
    );
    assert_eq!(report.failed_media, vec!["anaerobic"]);
    assert_eq!(report.skipped_media, vec!["RPMI"]);
    assert!(!report.outcomes.contains_key("RPMI"));
    assert_eq!(report.reactions_added, vec!["O2t"]);
    assert_grows_on(&model, &["M9"], &options(GapFillStrategy::Sequential));
    assert_eq!(
        report.to_string(),
        "Added 1 reactions and 0 metabolites, failed media: anaerobic, unknown media: RPMI"
    );
}

#[test]
fn spent_medium_supplies_secreted_compounds() {
    let mut model = draft();
    let report = multi_gap_fill(
        &mut model,
        &universe(),
        &["anaerobic"],
        &media_db(),
        &options(GapFillStrategy::Sequential),
        Some(&oxygen_donor()),
    )
    .unwrap();

    assert!(report.outcomes["anaerobic"].is_filled());
    assert_eq!(report.reactions_added, vec!["O2t"]);
}

#[test]
fn filled_model_survives_a_round_trip() {
    let mut model = draft();
    multi_gap_fill(
        &mut model,
        &universe(),
        &["M9"],
        &media_db(),
        &options(GapFillStrategy::Sequential),
        None,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toy_draft_gapfill.json");
    model.write_json(&path, Flavor::Fbc2).unwrap();
    let saved = Model::read_json(&path).unwrap();
    assert!(saved.uses_sbml_prefixes());
    assert_eq!(saved.reactions.len(), model.reactions.len());
    assert_eq!(
        saved.reactions["R_O2t"].annotation[GAPFILL_PROVENANCE_KEY],
        json!(["M9"])
    );
    assert_eq!(saved.growth_reaction().unwrap().id, "R_Growth");

    // a second pass on the saved model has nothing left to add
    let mut saved = saved;
    let mut universe = universe();
    let prefixed_path = dir.path().join("universe.json");
    universe.write_json(&prefixed_path, Flavor::Fbc2).unwrap();
    universe = Model::read_json(&prefixed_path).unwrap();
    let report = multi_gap_fill(
        &mut saved,
        &universe,
        &["M9"],
        &media_db(),
        &options(GapFillStrategy::Sequential),
        None,
    )
    .unwrap();
    assert!(report.reactions_added.is_empty());
    assert!(report.outcomes["M9"].is_filled());
}
