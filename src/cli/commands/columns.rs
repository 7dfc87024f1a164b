//! `variscout columns` - list columns with their detected kind

use miette::Result;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::cli::commands::utils::load_context;
use crate::cli::helpers::truncate_str;
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;
use crate::core::ColumnKind;

#[derive(clap::Args, Debug)]
pub struct ColumnsArgs {
    /// CSV data file
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ColumnInfo {
    name: String,
    kind: ColumnKind,
    present: usize,
    distinct: usize,
}

#[derive(Tabled)]
struct ColumnLine {
    #[tabled(rename = "COLUMN")]
    name: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "PRESENT")]
    present: usize,
    #[tabled(rename = "DISTINCT")]
    distinct: usize,
}

pub fn run(args: ColumnsArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let ds = &ctx.dataset;

    let infos: Vec<ColumnInfo> = ds
        .columns
        .iter()
        .map(|name| ColumnInfo {
            name: name.clone(),
            kind: ds.kind(name),
            present: ds.rows.iter().filter(|r| r.contains_key(name)).count(),
            distinct: ds.distinct_values(name).len(),
        })
        .collect();

    if print_document(&infos, global.format)? {
        return Ok(());
    }

    let lines: Vec<ColumnLine> = infos
        .iter()
        .map(|c| ColumnLine {
            name: truncate_str(&c.name, 40),
            kind: c.kind.to_string(),
            present: c.present,
            distinct: c.distinct,
        })
        .collect();
    println!("{}", render_table(&lines));
    println!("{} rows", ds.len());
    Ok(())
}
