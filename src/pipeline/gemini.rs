//! Annotation databases and annotation matrices via gemini
//!
//! Each locus's filtered VCF is loaded into a gemini database, then a
//! fixed set of ENCODE-style functional annotation columns is queried
//! back out into a per-locus annotation matrix. The column set and the
//! database schema are gemini's contract, consumed as-is.

use crate::core::Result;
use crate::pipeline::shell::run_tool;
use log::info;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Annotation columns extracted for each variant
pub const ENCODE_ANNOTATION_COLUMNS: &[&str] = &[
    "encode_dnaseI_cell_count",
    "encode_consensus_gm12878",
    "encode_consensus_h1hesc",
    "encode_consensus_helas3",
    "encode_consensus_hepg2",
    "encode_consensus_huvec",
    "encode_consensus_k562",
];

/// Database path for a filtered VCF: extension swapped to `.db`
pub fn database_path(vcf: &Path) -> PathBuf {
    vcf.with_extension("db")
}

/// Load a filtered locus VCF into a gemini database
pub fn create_database(vcf: &Path) -> Result<PathBuf> {
    let database = database_path(vcf);
    run_tool(
        "gemini",
        [
            "load".as_ref(),
            "-v".as_ref(),
            vcf.as_os_str(),
            database.as_os_str(),
        ],
    )?;
    Ok(database)
}

/// Query the annotation columns and write the locus annotation matrix
///
/// Output is space-separated with a header row; variant rows come back
/// in load order, matching the aligned Z-score output row for row.
/// NULL cells are written as 0 so downstream tools read a numeric
/// matrix.
pub fn write_annotation_matrix(
    database: &Path,
    out_dir: &Path,
    locus: &str,
    population: &str,
) -> Result<PathBuf> {
    info!("Extracting annotations from {:?}", database);
    let query = format!(
        "SELECT {} FROM variants",
        ENCODE_ANNOTATION_COLUMNS.join(", ")
    );
    let output = run_tool(
        "gemini",
        [
            "query".as_ref(),
            "-q".as_ref(),
            query.as_str().as_ref(),
            database.as_os_str(),
        ],
    )?;

    let matrix_path = out_dir.join(format!("{}.{}.annotations", locus, population));
    let mut out = BufWriter::new(std::fs::File::create(&matrix_path)?);
    writeln!(out, "{}", ENCODE_ANNOTATION_COLUMNS.join(" "))?;

    let rows = String::from_utf8_lossy(&output.stdout);
    for line in rows.lines() {
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split('\t').map(normalize_annotation_cell).collect();
        writeln!(out, "{}", cells.join(" "))?;
    }
    out.flush()?;

    Ok(matrix_path)
}

/// Map gemini NULLs to numeric zero, pass everything else through
fn normalize_annotation_cell(cell: &str) -> &str {
    match cell {
        "" | "None" | "NULL" => "0",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_swaps_extension() {
        assert_eq!(
            database_path(Path::new("out/rs1.EUR.vcf")),
            Path::new("out/rs1.EUR.db")
        );
    }

    #[test]
    fn test_normalize_annotation_cell() {
        assert_eq!(normalize_annotation_cell("None"), "0");
        assert_eq!(normalize_annotation_cell(""), "0");
        assert_eq!(normalize_annotation_cell("TSS"), "TSS");
        assert_eq!(normalize_annotation_cell("3"), "3");
    }
}
