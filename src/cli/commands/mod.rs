//! CLI command implementations

pub mod anova;
pub mod categories;
pub mod columns;
pub mod completions;
pub mod drill;
pub mod gage;
pub mod glm;
pub mod project;
pub mod rank;
pub mod regress;
pub mod stats;
pub mod utils;
