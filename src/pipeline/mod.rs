//! Pipeline orchestration
//!
//! Everything around the core aligner: SNP resolution, reference-panel
//! retrieval and filtering, the external-tool drivers (plink, gemini)
//! and the per-run driver.

pub mod driver;
pub mod gemini;
pub mod ld;
pub mod panel;
pub mod resolve;
pub mod shell;
pub mod snp;

pub use driver::{prepare_runs, LocusArtifacts, PrepareConfig, RunReport};
pub use gemini::{create_database, database_path, write_annotation_matrix, ENCODE_ANNOTATION_COLUMNS};
pub use ld::{plink_to_ld_matrix, vcf_to_plink};
pub use panel::{filter_population, PanelFetcher, PopulationPanel, DEFAULT_VCF_TEMPLATE};
pub use resolve::{normalize_chromosome, UcscResolver};
pub use shell::{run_tool, tool_available};
pub use snp::{read_snp_list, Snp, SnpListEntry};
