//! Core module - data model, filter stack, configuration and drill sessions

pub mod config;
pub mod data;
pub mod filter;
pub mod session;

pub use config::{Config, ConfigError};
pub use data::{CellValue, ColumnKind, DataError, DataRow, Dataset};
pub use filter::{apply_filters, FilterAction};
pub use session::{DrillSession, SessionEvent, StackSnapshot};
