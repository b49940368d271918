//! BDD step definitions for the inventory view

pub mod filter_steps;
pub mod mutation_steps;
pub mod refresh_steps;
