//! SNP and locus model
//!
//! A SNP-list file holds one entry per line: either a bare rsid (to be
//! resolved against the coordinate service) or a BED-style row that
//! already carries its coordinates.

use crate::core::{FormatError, Result};
use crate::core::io::{open_text_reader, LineIterator};
use std::path::Path;

/// A SNP with resolved coordinates. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snp {
    /// rsid, also the locus name
    pub rsid: String,
    /// Chromosome without "chr" prefix
    pub chrom: String,
    /// 1-based position
    pub position: u64,
    /// Genome build the coordinates belong to
    pub build: String,
}

impl Snp {
    /// Flanking region around the SNP, clamped to the chromosome start
    pub fn region(&self, flanking_region: u64) -> (u64, u64) {
        let start = self.position.saturating_sub(flanking_region).max(1);
        let end = self.position + flanking_region;
        (start, end)
    }
}

/// One line of a SNP-list file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnpListEntry {
    /// Bare rsid, coordinates unresolved
    Rsid(String),
    /// BED-style row, coordinates carried inline
    Bed {
        chrom: String,
        position: u64,
        name: String,
    },
}

impl SnpListEntry {
    /// Name used for logging and the manifest
    pub fn name(&self) -> &str {
        match self {
            SnpListEntry::Rsid(rsid) => rsid,
            SnpListEntry::Bed { name, .. } => name,
        }
    }
}

/// Read a SNP-list file
///
/// Empty lines and `#` comments are skipped. A line with four or more
/// whitespace-separated fields is treated as BED (chrom, start, end,
/// name) with the end coordinate taken as the SNP position; anything
/// else is a bare rsid.
pub fn read_snp_list(path: &Path) -> Result<Vec<SnpListEntry>> {
    let reader = open_text_reader(path)?;
    let mut lines = LineIterator::new(reader);
    let mut entries = Vec::new();

    let mut line_no = 0usize;
    while let Some(line) = lines.next_line() {
        let line = line?;
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() >= 4 {
            let position: u64 = fields[2].parse().map_err(|_| FormatError::InvalidInteger {
                line: line_no,
                column: "end",
                value: fields[2].to_string(),
            })?;
            entries.push(SnpListEntry::Bed {
                chrom: crate::pipeline::resolve::normalize_chromosome(fields[0]),
                position,
                name: fields[3].to_string(),
            });
        } else {
            entries.push(SnpListEntry::Rsid(fields[0].to_string()));
        }
    }

    Ok(entries)
}
