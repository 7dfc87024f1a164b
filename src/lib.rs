//! VariScout: statistical process control core
//!
//! Drill-down variation attribution over tabular data, plus the statistics it
//! relies on: η² factor ranking, capability indices, one-way ANOVA, simple
//! and multiple regression, and Gage R&R.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod yaml;
