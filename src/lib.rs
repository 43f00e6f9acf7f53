//! stockcalc: trade profit/loss over a wide daily price table.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command wiring in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
