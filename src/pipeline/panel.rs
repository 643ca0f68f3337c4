//! Reference panel retrieval and population filtering
//!
//! The fetcher slices a region out of a remote per-chromosome VCF with
//! tabix. The filter then keeps only the sample columns belonging to
//! the requested super-population, using a sample panel file, and
//! applies the minor-allele-frequency threshold from the kept
//! genotypes.

use crate::core::{FormatError, LookupFailure, Result};
use crate::core::io::{open_text_reader, LineIterator};
use crate::pipeline::shell::run_tool;
use crate::pipeline::snp::Snp;
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

/// 1000 Genomes phase 3 per-chromosome VCF layout
pub const DEFAULT_VCF_TEMPLATE: &str = "ftp://ftp.1000genomes.ebi.ac.uk/vol1/ftp/release/20130502/ALL.chr{chrom}.phase3_shapeit2_mvncall_integrated_v5a.20130502.genotypes.vcf.gz";

/// Fixed VCF columns preceding the samples
const FIXED_VCF_COLUMNS: usize = 9;

/// Retrieves reference-panel genotype slices by genomic region
#[derive(Debug, Clone)]
pub struct PanelFetcher {
    template: String,
}

impl PanelFetcher {
    /// `template` is a URI with a `{chrom}` placeholder
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Fetch the VCF slice covering the SNP's flanking region
    pub fn fetch(&self, snp: &Snp, flanking_region: u64) -> Result<String> {
        let (start, end) = snp.region(flanking_region);
        let uri = self.template.replace("{chrom}", &snp.chrom);
        let region = format!("{}:{}-{}", snp.chrom, start, end);
        info!("Fetching reference panel slice {}", region);

        let output = run_tool("tabix", ["-fh", &uri, &region])?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Sample-to-super-population mapping from a panel file
///
/// Panel rows are whitespace-delimited `sample population super_population`;
/// a header row starting with "sample" is skipped.
#[derive(Debug, Clone)]
pub struct PopulationPanel {
    by_sample: HashMap<String, String>,
}

impl PopulationPanel {
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = open_text_reader(path)?;
        let mut lines = LineIterator::new(reader);
        let mut by_sample = HashMap::new();

        let mut line_no = 0usize;
        while let Some(line) = lines.next_line() {
            let line = line?;
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if line_no == 1 && fields[0].eq_ignore_ascii_case("sample") {
                continue;
            }
            if fields.len() < 3 {
                return Err(FormatError::TooFewColumns {
                    line: line_no,
                    expected: 3,
                    found: fields.len(),
                }
                .into());
            }
            by_sample.insert(fields[0].to_string(), fields[2].to_string());
        }

        Ok(Self { by_sample })
    }

    /// Super-population code for a sample, if known
    pub fn super_population(&self, sample: &str) -> Option<&str> {
        self.by_sample.get(sample).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sample.is_empty()
    }
}

/// Subset a VCF slice to one super-population, applying the MAF bound
///
/// Meta lines pass through verbatim. The `#CHROM` header is rewritten
/// to the kept samples. Data lines keep the nine fixed columns plus the
/// kept sample columns; records whose alternate-allele frequency over
/// the kept genotypes falls below `maf` or above `1 - maf` are dropped.
pub fn filter_population(
    vcf_text: &str,
    panel: &PopulationPanel,
    population: &str,
    maf: f64,
) -> Result<String> {
    let mut out = String::with_capacity(vcf_text.len() / 4);
    let mut kept_columns: Option<Vec<usize>> = None;
    let mut kept_records = 0usize;
    let mut dropped_by_maf = 0usize;

    for (i, line) in vcf_text.lines().enumerate() {
        let line_no = i + 1;
        if line.is_empty() {
            continue;
        }
        if line.starts_with("#CHROM") {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < FIXED_VCF_COLUMNS + 1 {
                return Err(FormatError::TooFewColumns {
                    line: line_no,
                    expected: FIXED_VCF_COLUMNS + 1,
                    found: fields.len(),
                }
                .into());
            }
            let kept: Vec<usize> = fields[FIXED_VCF_COLUMNS..]
                .iter()
                .enumerate()
                .filter(|(_, s)| panel.super_population(s) == Some(population))
                .map(|(idx, _)| FIXED_VCF_COLUMNS + idx)
                .collect();
            if kept.is_empty() {
                return Err(LookupFailure::UnknownPopulation(population.to_string()).into());
            }
            debug!(
                "Keeping {} of {} samples",
                kept.len(),
                fields.len() - FIXED_VCF_COLUMNS
            );

            let mut header_fields: Vec<&str> = fields[..FIXED_VCF_COLUMNS].to_vec();
            for &idx in &kept {
                header_fields.push(fields[idx]);
            }
            out.push_str(&header_fields.join("\t"));
            out.push('\n');
            kept_columns = Some(kept);
            continue;
        }
        if line.starts_with('#') {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        let kept = kept_columns
            .as_ref()
            .ok_or(FormatError::MissingChromHeader { line: line_no })?;

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < FIXED_VCF_COLUMNS + 1 {
            return Err(FormatError::TooFewColumns {
                line: line_no,
                expected: FIXED_VCF_COLUMNS + 1,
                found: fields.len(),
            }
            .into());
        }

        let mut record: Vec<&str> = fields[..FIXED_VCF_COLUMNS].to_vec();
        for &idx in kept {
            record.push(fields.get(idx).copied().unwrap_or("."));
        }

        if maf > 0.0 {
            let freq = alt_allele_frequency(&record[FIXED_VCF_COLUMNS..]);
            if freq < maf || freq > 1.0 - maf {
                dropped_by_maf += 1;
                continue;
            }
        }

        out.push_str(&record.join("\t"));
        out.push('\n');
        kept_records += 1;
    }

    debug!(
        "Population filter kept {} records, dropped {} by MAF",
        kept_records, dropped_by_maf
    );
    Ok(out)
}

/// Alternate-allele frequency over GT fields
///
/// Only the GT subfield (before the first ':') is read; missing alleles
/// ('.') are excluded from the denominator. No calls at all counts as
/// frequency zero.
fn alt_allele_frequency(genotypes: &[&str]) -> f64 {
    let mut alt = 0usize;
    let mut total = 0usize;
    for gt in genotypes {
        let gt = gt.split(':').next().unwrap_or(".");
        for allele in gt.split(|c| c == '|' || c == '/') {
            match allele {
                "." | "" => {}
                "0" => total += 1,
                _ => {
                    alt += 1;
                    total += 1;
                }
            }
        }
    }
    if total == 0 {
        return 0.0;
    }
    alt as f64 / total as f64
}
