//! Pipeline driver
//!
//! Sequences Resolve, Fetch, Filter, Align, database load and LD for
//! each SNP, then the annotation pass and the manifest. A failing locus
//! is recorded and skipped; the run continues with the remaining loci
//! and reports an aggregate outcome.

use crate::core::align::{align_locus, AlignedLocus};
use crate::core::{exit_codes, PipelineError, Result};
use crate::core::zscore::{ScoreMode, ZscoreCatalog, ZscoreIndex};
use crate::pipeline::gemini::{create_database, write_annotation_matrix};
use crate::pipeline::ld::{plink_to_ld_matrix, vcf_to_plink};
use crate::pipeline::panel::{filter_population, PanelFetcher, PopulationPanel};
use crate::pipeline::resolve::UcscResolver;
use crate::pipeline::snp::{read_snp_list, Snp, SnpListEntry};
use log::{error, info, warn};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Everything the `prepare` subcommand needs
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub snp_list: PathBuf,
    pub zscore_dir: PathBuf,
    pub flanking_region: u64,
    pub build: String,
    pub output_directory: Option<PathBuf>,
    pub population: String,
    pub maf: f64,
    pub panel: PathBuf,
    pub vcf_template: String,
    pub score_mode: ScoreMode,
    pub remove_plink_files: bool,
}

/// Artifacts of one successfully prepared locus
#[derive(Debug, Clone)]
pub struct LocusArtifacts {
    pub snp: Snp,
    pub aligned: AlignedLocus,
    pub database: PathBuf,
    pub ld_matrix: PathBuf,
}

/// Aggregate outcome of a prepare run
#[derive(Debug)]
pub struct RunReport {
    /// rsids of fully processed loci, in processing order
    pub processed: Vec<String>,
    /// loci that failed, with the reason
    pub failed: Vec<(String, anyhow::Error)>,
    pub output_directory: PathBuf,
}

impl RunReport {
    /// Process exit code: a run with any successful locus exits clean
    pub fn exit_code(&self) -> i32 {
        if !self.processed.is_empty() || self.failed.is_empty() {
            return exit_codes::SUCCESS;
        }
        self.failed[0]
            .1
            .downcast_ref::<PipelineError>()
            .map(PipelineError::exit_code)
            .unwrap_or(exit_codes::EXTERNAL_TOOL_FAILURE)
    }
}

/// Run the full preparation pipeline
pub fn prepare_runs(config: &PrepareConfig) -> Result<RunReport> {
    let output_directory = match &config.output_directory {
        Some(dir) => dir.clone(),
        None => PathBuf::from(default_run_directory_name()),
    };
    std::fs::create_dir_all(&output_directory)?;

    let entries = read_snp_list(&config.snp_list)?;
    if entries.is_empty() {
        return Err(PipelineError::CommandLine(format!(
            "SNP list {:?} contains no entries",
            config.snp_list
        )));
    }

    let catalog = ZscoreCatalog::scan(&config.zscore_dir)?;
    let panel = PopulationPanel::from_file(&config.panel)?;
    let resolver = UcscResolver::new(&config.build);
    let fetcher = PanelFetcher::new(&config.vcf_template);

    let mut completed: Vec<(String, LocusArtifacts)> = Vec::new();
    let mut failed: Vec<(String, anyhow::Error)> = Vec::new();

    for entry in &entries {
        let locus = entry.name().to_string();
        info!("Preparing output files for SNP {}", locus);
        match prepare_locus(
            entry,
            &resolver,
            &fetcher,
            &catalog,
            &panel,
            config,
            &output_directory,
        ) {
            Ok(artifacts) => completed.push((locus, artifacts)),
            Err(e) => {
                error!("Skipping locus {}: {}", locus, e);
                failed.push((
                    locus.clone(),
                    anyhow::Error::new(e).context(format!("preparing locus {}", locus)),
                ));
            }
        }
    }

    info!("Generating annotation matrices");
    let mut processed = Vec::new();
    for (locus, artifacts) in completed {
        match write_annotation_matrix(
            &artifacts.database,
            &output_directory,
            &locus,
            &config.population,
        ) {
            Ok(_) => processed.push(locus),
            Err(e) => {
                error!("Annotation extraction failed for {}: {}", locus, e);
                failed.push((
                    locus.clone(),
                    anyhow::Error::new(e).context(format!("annotating locus {}", locus)),
                ));
            }
        }
    }

    write_manifest(&output_directory, &processed)?;

    info!(
        "Prepared {} of {} loci ({} failed)",
        processed.len(),
        entries.len(),
        failed.len()
    );
    for (locus, reason) in &failed {
        warn!("  {} failed: {:#}", locus, reason);
    }

    Ok(RunReport {
        processed,
        failed,
        output_directory,
    })
}

/// Resolve, fetch, filter, align and build LD for one SNP-list entry
fn prepare_locus(
    entry: &SnpListEntry,
    resolver: &UcscResolver,
    fetcher: &PanelFetcher,
    catalog: &ZscoreCatalog,
    panel: &PopulationPanel,
    config: &PrepareConfig,
    output_directory: &Path,
) -> Result<LocusArtifacts> {
    let snp = match entry {
        SnpListEntry::Rsid(rsid) => resolver.resolve(rsid)?,
        SnpListEntry::Bed {
            chrom,
            position,
            name,
        } => Snp {
            rsid: name.clone(),
            chrom: chrom.clone(),
            position: *position,
            build: config.build.clone(),
        },
    };

    info!("Obtaining VCF slice from the reference panel");
    let vcf = fetcher.fetch(&snp, config.flanking_region)?;
    let vcf = filter_population(&vcf, panel, &config.population, config.maf)?;

    let zscore_file = catalog.lookup(&snp.chrom, &config.population)?;
    let index = ZscoreIndex::from_file(&zscore_file, config.score_mode)?;

    let aligned = align_locus(
        &vcf,
        &index,
        output_directory,
        &snp.rsid,
        &config.population,
    )?;
    if aligned.rows == 0 {
        warn!(
            "Locus {} has no overlap between the panel and the Z-score file",
            snp.rsid
        );
    }

    info!("Creating gemini database");
    let database = create_database(&aligned.vcf)?;

    info!("Creating LD matrix using plink");
    vcf_to_plink(&aligned.vcf, output_directory, &snp.rsid, &config.population)?;
    let ld_matrix = plink_to_ld_matrix(
        &aligned.vcf,
        output_directory,
        &snp.rsid,
        &config.population,
        config.remove_plink_files,
    )?;

    Ok(LocusArtifacts {
        snp,
        aligned,
        database,
        ld_matrix,
    })
}

/// Write the manifest of successfully processed rsids
fn write_manifest(output_directory: &Path, processed: &[String]) -> Result<()> {
    let path = output_directory.join("input.files");
    let mut out = BufWriter::new(std::fs::File::create(path)?);
    for rsid in processed {
        writeln!(out, "{}", rsid)?;
    }
    out.flush()?;
    Ok(())
}

/// `fine_mapping_run<ISO date>`, the default when no output directory
/// is given
pub fn default_run_directory_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!("fine_mapping_run{:04}-{:02}-{:02}", year, month, day)
}

/// Gregorian date from days since 1970-01-01
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_civil_from_days() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
    }

    #[test]
    fn test_default_run_directory_name_shape() {
        let name = default_run_directory_name();
        assert!(name.starts_with("fine_mapping_run"));
        // fine_mapping_run + YYYY-MM-DD
        assert_eq!(name.len(), "fine_mapping_run".len() + 10);
    }

    #[test]
    fn test_write_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_manifest(tmp.path(), &["rs1".to_string(), "rs2".to_string()]).unwrap();
        let text = std::fs::read_to_string(tmp.path().join("input.files")).unwrap();
        assert_eq!(text, "rs1\nrs2\n");
    }

    #[test]
    fn test_run_report_exit_codes() {
        let report = RunReport {
            processed: vec!["rs1".to_string()],
            failed: vec![(
                "rs2".to_string(),
                anyhow::Error::new(PipelineError::CommandLine("x".to_string())),
            )],
            output_directory: PathBuf::from("out"),
        };
        assert_eq!(report.exit_code(), exit_codes::SUCCESS);

        let report = RunReport {
            processed: vec![],
            failed: vec![(
                "rs2".to_string(),
                anyhow::Error::new(PipelineError::CommandLine("x".to_string())),
            )],
            output_directory: PathBuf::from("out"),
        };
        assert_eq!(report.exit_code(), exit_codes::COMMAND_LINE_ERROR);
    }
}
