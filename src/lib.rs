//! # u-lotsizing
//!
//! Discrete lot sizing with sequence-dependent changeover costs: one machine,
//! unit demands with due periods, earliness and changeover costs.
//!
//! The problem is stated as a constraint model over an `item[]` permutation
//! (which demand each period serves) and solved by a smallest-domain
//! construction followed by neighbourhood search, where every move is
//! screened by an incremental cost filter and repaired by a failure-bounded
//! tree search.
//!
//! ## Modules
//!
//! - [`models`] — Instance, production values and schedules
//! - [`loading`] — Instance file parsing
//! - [`engine`] — Finite-domain store, propagators, tree search and monitors
//! - [`formulation`] — Constraint model of an instance
//! - [`evaluation`] — Feasibility checks and objective from an item permutation
//! - [`local_search`] — Swap and random LNS neighbourhoods, cost filtering
//! - [`solver`] — Search driver and configuration

pub mod engine;
pub mod evaluation;
pub mod formulation;
pub mod loading;
pub mod local_search;
pub mod models;
pub mod solver;

#[cfg(test)]
mod fixtures;
