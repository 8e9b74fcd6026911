//! Core rust implementation of gapfillrs, a crate for gap-filling draft metabolic models.
//!
//! Draft models are repaired by adding the cheapest set of reactions from a universe model
//! which lets them grow on each requested medium, see [`reconstruction::multigap`].

pub mod configuration;
pub mod flux_analysis;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod reconstruction;
