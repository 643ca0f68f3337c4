//! Locus alignment
//!
//! Intersects a population-filtered VCF slice with a Z-score index and
//! emits the three co-indexed per-locus artifacts: the filtered VCF,
//! the whitespace Z-score file, and the CAVIAR two-column file. Row
//! order is the VCF's row order restricted to covered positions.

use crate::core::error::{FormatError, FormatResult, Result};
use crate::core::zscore::ZscoreIndex;
use memchr::memchr;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Minimum fields on a VCF data line (CHROM..INFO)
const MIN_VCF_FIELDS: usize = 8;

/// Lightweight view over one VCF data line
///
/// Only CHROM, POS and ID are ever inspected; the rest of the line is
/// carried through verbatim, genotypes included.
#[derive(Debug)]
pub struct VcfRecordView<'a> {
    line: &'a str,
    /// Chromosome name as written
    pub chrom: &'a str,
    /// Position (1-based)
    pub pos: u64,
    field_bounds: Vec<(usize, usize)>,
}

impl<'a> VcfRecordView<'a> {
    /// Parse a VCF data line, splitting on tab
    pub fn parse(line: &'a str, line_no: usize) -> FormatResult<Self> {
        let bytes = line.as_bytes();
        let mut field_bounds = Vec::with_capacity(10);
        let mut start_pos = 0;
        let mut pos = 0;

        while pos < bytes.len() {
            if let Some(tab_pos) = memchr(b'\t', &bytes[pos..]) {
                let end_pos = pos + tab_pos;
                field_bounds.push((start_pos, end_pos));
                start_pos = end_pos + 1;
                pos = start_pos;
            } else {
                field_bounds.push((start_pos, bytes.len()));
                break;
            }
        }

        if field_bounds.len() < MIN_VCF_FIELDS {
            return Err(FormatError::TooFewColumns {
                line: line_no,
                expected: MIN_VCF_FIELDS,
                found: field_bounds.len(),
            });
        }

        let chrom = &line[field_bounds[0].0..field_bounds[0].1];
        let pos_str = &line[field_bounds[1].0..field_bounds[1].1];
        let pos: u64 = pos_str.parse().map_err(|_| FormatError::InvalidInteger {
            line: line_no,
            column: "POS",
            value: pos_str.to_string(),
        })?;

        Ok(Self {
            line,
            chrom,
            pos,
            field_bounds,
        })
    }

    /// Field by zero-based index
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.field_bounds
            .get(index)
            .map(|(start, end)| &self.line[*start..*end])
    }

    /// ID field (rsid)
    pub fn id(&self) -> &'a str {
        self.field(2).unwrap_or(".")
    }
}

/// Paths and row count of one aligned output set
#[derive(Debug, Clone)]
pub struct AlignedLocus {
    /// Filtered VCF, consumed downstream by the LD and annotation steps
    pub vcf: PathBuf,
    /// `chrom pos rsid score` text
    pub zscore: PathBuf,
    /// CAVIAR-style `rsid score` text
    pub caviar: PathBuf,
    /// Data rows written to each of the three files
    pub rows: usize,
}

/// Output file paths for a locus/population pair
pub fn aligned_paths(out_dir: &Path, locus: &str, population: &str) -> (PathBuf, PathBuf, PathBuf) {
    let vcf = out_dir.join(format!("{}.{}.vcf", locus, population));
    let zscore = out_dir.join(format!("{}.{}", locus, population));
    let caviar = out_dir.join(format!("{}.{}.Z", locus, population));
    (vcf, zscore, caviar)
}

/// Align a locus's VCF text against a Z-score index
///
/// Header lines are copied verbatim to the filtered VCF. Data lines
/// whose position is covered by the index are written to all three
/// outputs; uncovered positions are dropped from all three. The CAVIAR
/// file always carries the raw z-score, whatever the index mode.
pub fn align_locus(
    vcf_text: &str,
    index: &ZscoreIndex,
    out_dir: &Path,
    locus: &str,
    population: &str,
) -> Result<AlignedLocus> {
    let (vcf_path, zscore_path, caviar_path) = aligned_paths(out_dir, locus, population);

    let mut out_vcf = BufWriter::new(std::fs::File::create(&vcf_path)?);
    let mut out_zscore = BufWriter::new(std::fs::File::create(&zscore_path)?);
    let mut out_caviar = BufWriter::new(std::fs::File::create(&caviar_path)?);

    let mut rows = 0usize;
    for (i, line) in vcf_text.lines().enumerate() {
        let line_no = i + 1;
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            writeln!(out_vcf, "{}", line)?;
            continue;
        }

        let view = VcfRecordView::parse(line, line_no)?;
        let entry = match index.get(view.pos) {
            Some(entry) => entry,
            // Z-score coverage is sparse relative to the panel
            None => continue,
        };

        writeln!(out_vcf, "{}", line)?;
        writeln!(
            out_zscore,
            "{} {} {} {}",
            view.chrom,
            view.pos,
            view.id(),
            entry.score(index.mode())
        )?;
        writeln!(out_caviar, "{} {}", view.id(), entry.zscore)?;
        rows += 1;
    }

    out_vcf.flush()?;
    out_zscore.flush()?;
    out_caviar.flush()?;

    Ok(AlignedLocus {
        vcf: vcf_path,
        zscore: zscore_path,
        caviar: caviar_path,
        rows,
    })
}
