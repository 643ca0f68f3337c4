//! finemap-prep CLI entry point
//!
//! Prepares reference-panel, Z-score, LD and annotation inputs for
//! fine-mapping tools such as PAINTOR and CAVIAR.

use clap::{Parser, Subcommand};
use finemap_prep::core::{PipelineError, ScoreMode};
use finemap_prep::pipeline::{prepare_runs, PrepareConfig, DEFAULT_VCF_TEMPLATE};
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "finemap-prep")]
#[command(about = "Processes SNP based data and prepares fine mapping inputs")]
#[command(version)]
#[command(author = "FinemapPrep Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare per-locus inputs for a fine mapping run
    Prepare {
        /// SNP list file: rsids or BED formatted rows
        #[arg(short = 's', long)]
        snp_list: PathBuf,
        /// Directory of per-chromosome Z-score files
        #[arg(short = 'z', long = "z-score-dir")]
        z_score_dir: PathBuf,
        /// Flanking region either side of each SNP, in base pairs
        #[arg(short = 'f', long)]
        flanking_region: u64,
        /// Use a number of SNPs either side instead of a region
        #[arg(short = 'n', long = "number-of-snps", default_value_t = false)]
        flanking_units: bool,
        /// Genome build
        #[arg(short = 'b', long, default_value = "hg19")]
        build: String,
        /// Output directory (created if missing; dated default)
        #[arg(short = 'o', long = "output")]
        output_directory: Option<PathBuf>,
        /// Super-population to calculate LD from
        #[arg(short = 'p', long, default_value = "EUR")]
        population: String,
        /// MAF threshold applied to the reference panel slice
        #[arg(short = 'm', long, default_value_t = 0.01)]
        maf: f64,
        /// Sample panel file mapping samples to super-populations
        #[arg(long)]
        panel: PathBuf,
        /// Reference panel VCF URI template with a {chrom} placeholder
        #[arg(long = "vcf-template", default_value = DEFAULT_VCF_TEMPLATE)]
        vcf_template: String,
        /// Multiply each z-score by its imputation r-square
        #[arg(long = "multiply-rsquare", default_value_t = false)]
        multiply_rsquare: bool,
        /// Remove the PLINK bed/bim/fam triple after the LD matrix
        #[arg(long = "remove-plink-files", default_value_t = false)]
        remove_plink_files: bool,
    },
    /// Run fine mapping tools on a prepared directory
    Finemap {
        /// Directory produced by the prepare command
        #[arg(short = 'i', long)]
        input_directory: Option<PathBuf>,
        /// Results output directory
        #[arg(short = 'd', long = "output-directory")]
        output_directory: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting the fine mapping pipeline");
    let cli = Cli::parse();
    let start = Instant::now();

    let code = match run(cli) {
        Ok(code) => {
            info!("Finished in {:.2}s", start.elapsed().as_secs_f64());
            code
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32, PipelineError> {
    match cli.command {
        Commands::Prepare {
            snp_list,
            z_score_dir,
            flanking_region,
            flanking_units,
            build,
            output_directory,
            population,
            maf,
            panel,
            vcf_template,
            multiply_rsquare,
            remove_plink_files,
        } => {
            if flanking_units {
                return Err(PipelineError::CommandLine(
                    "Using a number of flanking SNPs instead of a region is not supported"
                        .to_string(),
                ));
            }
            if !(0.0..0.5).contains(&maf) {
                return Err(PipelineError::CommandLine(format!(
                    "MAF threshold must be in [0, 0.5), got {}",
                    maf
                )));
            }

            let config = PrepareConfig {
                snp_list,
                zscore_dir: z_score_dir,
                flanking_region,
                build,
                output_directory,
                population,
                maf,
                panel,
                vcf_template,
                score_mode: if multiply_rsquare {
                    ScoreMode::MultiplyRsquare
                } else {
                    ScoreMode::Raw
                },
                remove_plink_files,
            };

            let report = prepare_runs(&config)?;
            info!(
                "Prepared inputs for {} loci in {:?}",
                report.processed.len(),
                report.output_directory
            );
            Ok(report.exit_code())
        }
        Commands::Finemap { .. } => Err(PipelineError::CommandLine(
            "the finemap sub-command is not implemented yet; run the external fine mapping tools on a prepared directory".to_string(),
        )),
    }
}
