//! Error types for finemap-prep
//!
//! Defines all error types used throughout the library, plus the
//! process exit-code contract used by the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for finemap-prep operations
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad or missing command-line input
    #[error("Command line error: {0}")]
    CommandLine(String),

    /// Remote or catalog lookup returned no or ambiguous result
    #[error("Lookup failure: {0}")]
    Lookup(#[from] LookupFailure),

    /// An invoked external program failed
    #[error("External tool failure: {0}")]
    ExternalTool(#[from] ExternalToolFailure),

    /// Malformed flat-file input
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Exit code for this error kind, per the CLI contract
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::CommandLine(_) => exit_codes::COMMAND_LINE_ERROR,
            PipelineError::Lookup(_) => exit_codes::LOOKUP_FAILURE,
            PipelineError::ExternalTool(_) => exit_codes::EXTERNAL_TOOL_FAILURE,
            PipelineError::Format(_) => exit_codes::EXTERNAL_TOOL_FAILURE,
            PipelineError::Io(_) => exit_codes::OS_ERROR,
        }
    }
}

/// Process exit codes. Values are an internal contract of this tool,
/// not standardized.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const COMMAND_LINE_ERROR: i32 = 2;
    pub const LOOKUP_FAILURE: i32 = 3;
    pub const EXTERNAL_TOOL_FAILURE: i32 = 4;
    pub const OS_ERROR: i32 = 5;
}

/// Errors raised while parsing positional text rows (Z-score files,
/// VCF data lines, panel files)
#[derive(Debug, Error)]
pub enum FormatError {
    /// Row has fewer columns than the schema requires
    #[error("line {line}: expected at least {expected} columns, found {found}")]
    TooFewColumns {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A column that must be an integer is not
    #[error("line {line}: {column} field is not an integer: '{value}'")]
    InvalidInteger {
        line: usize,
        column: &'static str,
        value: String,
    },

    /// A column that must be numeric is not
    #[error("line {line}: {column} field is not a number: '{value}'")]
    InvalidFloat {
        line: usize,
        column: &'static str,
        value: String,
    },

    /// Input has no column header where one is required
    #[error("{0}: file is empty, expected a header row")]
    MissingHeader(PathBuf),

    /// VCF data line seen before the #CHROM header
    #[error("line {line}: data line precedes the #CHROM header")]
    MissingChromHeader { line: usize },

    /// I/O error during parsing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when a lookup returns nothing, or more than one thing
#[derive(Debug, Error)]
pub enum LookupFailure {
    /// The coordinate service had no row for this rsid
    #[error("no coordinates found for '{rsid}' in build {build}")]
    SnpNotFound { rsid: String, build: String },

    /// The coordinate service replied with something unparseable
    #[error("unparseable coordinate reply for '{rsid}': '{reply}'")]
    MalformedReply { rsid: String, reply: String },

    /// No Z-score file matches the chromosome and population
    #[error("no Z-score file for chr{chrom} / {population} in {dir}")]
    NoZscoreFile {
        chrom: String,
        population: String,
        dir: PathBuf,
    },

    /// More than one Z-score file matches; never silently pick one
    #[error("ambiguous Z-score files for chr{chrom} / {population}: {candidates:?}")]
    AmbiguousZscoreFile {
        chrom: String,
        population: String,
        candidates: Vec<String>,
    },

    /// The sample panel has no samples for this population code
    #[error("population '{0}' has no samples in the panel")]
    UnknownPopulation(String),
}

/// Failure of an invoked external program
#[derive(Debug, Error)]
pub enum ExternalToolFailure {
    /// The program could not be started at all
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited non-zero
    #[error("'{program}' exited with {status}: {stderr}")]
    Exited {
        program: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Result type alias for finemap-prep operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for flat-file parsing operations
pub type FormatResult<T> = std::result::Result<T, FormatError>;
