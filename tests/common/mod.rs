//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use variscout::core::{DataRow, Dataset};

/// Two machines, two shifts; Machine explains almost all variation
pub const WEIGHT_CSV: &str = "\
Machine,Shift,Weight
A,Morning,10
A,Afternoon,11
A,Morning,10
A,Afternoon,11
B,Morning,14
B,Afternoon,15
B,Morning,14
B,Afternoon,15
";

/// 3 parts x 2 operators x 2 replicates, part-dominated
pub const GAGE_CSV: &str = "\
Part,Operator,Measurement
P1,Ann,10.0
P1,Ann,10.1
P1,Bob,10.2
P1,Bob,10.1
P2,Ann,12.0
P2,Ann,12.1
P2,Bob,12.1
P2,Bob,12.2
P3,Ann,14.0
P3,Ann,13.9
P3,Bob,14.1
P3,Bob,14.0
";

/// Temperature drives yield almost linearly
pub const REGRESSION_CSV: &str = "\
Temperature,Yield,Line
150,70.1,L1
160,72.0,L2
170,74.2,L1
180,75.9,L2
190,78.1,L1
200,80.0,L2
";

/// Helper to get a variscout command isolated from the caller's config
pub fn variscout() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("variscout"));
    cmd.env_remove("VARISCOUT_CONFIG").env_remove("RUST_LOG");
    cmd
}

/// Write a fixture file into a fresh temp directory
pub fn write_fixture(name: &str, content: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(name);
    fs::write(&path, content).unwrap();
    (tmp, path)
}

/// Parse an in-memory CSV fixture
pub fn dataset(csv: &str) -> Dataset {
    Dataset::from_reader(csv.as_bytes()).unwrap()
}

/// Rows of the weight fixture
pub fn weight_rows() -> Vec<DataRow> {
    dataset(WEIGHT_CSV).rows
}
