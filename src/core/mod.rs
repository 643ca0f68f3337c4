//! Core data-alignment functionality
//!
//! This module contains the Z-score index and file catalog, the locus
//! aligner, and the error/exit-code contract shared by the pipeline.

pub mod align;
mod error;
pub mod io;
pub mod zscore;

pub use align::{align_locus, aligned_paths, AlignedLocus, VcfRecordView};
pub use error::{
    exit_codes, ExternalToolFailure, FormatError, FormatResult, LookupFailure, PipelineError,
    Result,
};
pub use io::{detect_compression, open_text_reader, CompressionFormat, LineIterator};
pub use zscore::{ScoreMode, ZscoreCatalog, ZscoreEntry, ZscoreIndex, ZscoreRecord};
