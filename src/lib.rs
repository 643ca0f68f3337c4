//! FinemapPrep - fine-mapping input preparation
//!
//! Prepares per-locus inputs for statistical fine-mapping tools: for
//! each SNP in a list, retrieves a reference-panel genotype slice,
//! subsets it to an ancestry population, intersects it with per-
//! chromosome Z-score files, and drives PLINK and gemini to produce LD
//! matrices and annotation matrices.
//!
//! # Example
//!
//! ```ignore
//! use finemap_prep::core::{ScoreMode, ZscoreIndex, align_locus};
//!
//! // Index one chromosome/population Z-score file
//! let index = ZscoreIndex::from_file("zscores/chr4.EUR.zscores".as_ref(), ScoreMode::Raw)?;
//!
//! // Intersect a locus VCF slice with it
//! let aligned = align_locus(&vcf_text, &index, "out".as_ref(), "rs12498742", "EUR")?;
//! ```

pub mod core;
pub mod pipeline;

// Re-export commonly used types
pub use crate::core::{
    align_locus, exit_codes, AlignedLocus, ExternalToolFailure, FormatError, LookupFailure,
    PipelineError, Result, ScoreMode, ZscoreCatalog, ZscoreEntry, ZscoreIndex,
};
pub use crate::pipeline::{prepare_runs, PrepareConfig, RunReport};
