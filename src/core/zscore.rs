//! Z-score index and file catalog
//!
//! Association statistics arrive as one whitespace-delimited file per
//! chromosome and population, with a header row. The index keys each
//! data row by genomic position for the aligner; the catalog resolves
//! which file covers a chromosome/population pair.

use crate::core::error::{FormatError, FormatResult, LookupFailure, PipelineError, Result};
use crate::core::io::{open_text_reader, LineIterator};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Zero-based column holding the genomic position
const POSITION_COLUMN: usize = 1;
/// Zero-based column holding the z-score
const ZSCORE_COLUMN: usize = 4;
/// Zero-based column holding the imputation r-square
const RSQUARE_COLUMN: usize = 5;
/// Minimum columns per data row
const MIN_COLUMNS: usize = 6;

/// How a stored entry is turned into the output score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMode {
    /// Score is the z-score as stored
    #[default]
    Raw,
    /// Score is z-score times imputation r-square
    MultiplyRsquare,
}

/// One typed row of a Z-score file
#[derive(Debug, Clone, PartialEq)]
pub struct ZscoreRecord {
    /// 1-based genomic position
    pub position: u64,
    /// Effect statistic
    pub zscore: f64,
    /// Imputation quality, present only when the mode needs it
    pub rsquare: Option<f64>,
}

impl ZscoreRecord {
    /// Parse a whitespace-delimited data row
    ///
    /// `line_no` is the 1-based line number in the file, used for
    /// diagnostics. Malformed rows always fail; rows are never skipped.
    pub fn parse(line: &str, mode: ScoreMode, line_no: usize) -> FormatResult<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_COLUMNS {
            return Err(FormatError::TooFewColumns {
                line: line_no,
                expected: MIN_COLUMNS,
                found: fields.len(),
            });
        }

        let position: u64 =
            fields[POSITION_COLUMN]
                .parse()
                .map_err(|_| FormatError::InvalidInteger {
                    line: line_no,
                    column: "position",
                    value: fields[POSITION_COLUMN].to_string(),
                })?;

        let zscore: f64 = fields[ZSCORE_COLUMN]
            .parse()
            .map_err(|_| FormatError::InvalidFloat {
                line: line_no,
                column: "zscore",
                value: fields[ZSCORE_COLUMN].to_string(),
            })?;

        let rsquare = match mode {
            ScoreMode::Raw => None,
            ScoreMode::MultiplyRsquare => Some(fields[RSQUARE_COLUMN].parse().map_err(|_| {
                FormatError::InvalidFloat {
                    line: line_no,
                    column: "rsquare",
                    value: fields[RSQUARE_COLUMN].to_string(),
                }
            })?),
        };

        Ok(Self {
            position,
            zscore,
            rsquare,
        })
    }
}

/// Stored value for one position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZscoreEntry {
    pub zscore: f64,
    pub rsquare: Option<f64>,
}

impl ZscoreEntry {
    /// Output score under the given mode
    pub fn score(&self, mode: ScoreMode) -> f64 {
        match (mode, self.rsquare) {
            (ScoreMode::MultiplyRsquare, Some(r)) => self.zscore * r,
            _ => self.zscore,
        }
    }
}

/// Position-keyed lookup over one chromosome/population Z-score file
#[derive(Debug, Clone)]
pub struct ZscoreIndex {
    entries: HashMap<u64, ZscoreEntry>,
    mode: ScoreMode,
}

impl ZscoreIndex {
    /// Build an index from a Z-score file
    ///
    /// The header row is skipped. On duplicate positions the later row
    /// overwrites the earlier one.
    pub fn from_file(path: &Path, mode: ScoreMode) -> Result<Self> {
        let reader = open_text_reader(path)?;
        let mut lines = LineIterator::new(reader);
        let mut entries = HashMap::new();

        let mut line_no = 0usize;
        let mut saw_header = false;
        while let Some(line) = lines.next_line() {
            let line = line.map_err(PipelineError::Io)?;
            line_no += 1;
            if line_no == 1 {
                saw_header = true;
                continue;
            }
            if line.is_empty() {
                continue;
            }
            let record = ZscoreRecord::parse(line, mode, line_no).map_err(PipelineError::Format)?;
            entries.insert(
                record.position,
                ZscoreEntry {
                    zscore: record.zscore,
                    rsquare: record.rsquare,
                },
            );
        }

        if !saw_header {
            return Err(PipelineError::Format(FormatError::MissingHeader(
                path.to_path_buf(),
            )));
        }

        debug!("Indexed {} positions from {:?}", entries.len(), path);
        Ok(Self { entries, mode })
    }

    /// Build an index directly from entries (tests and benchmarks)
    pub fn from_entries(entries: HashMap<u64, ZscoreEntry>, mode: ScoreMode) -> Self {
        Self { entries, mode }
    }

    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: u64) -> Option<&ZscoreEntry> {
        self.entries.get(&position)
    }

    /// Output score for a position, honoring the index mode
    pub fn score(&self, position: u64) -> Option<f64> {
        self.entries.get(&position).map(|e| e.score(self.mode))
    }

    /// Raw z-score for a position, regardless of mode
    pub fn raw(&self, position: u64) -> Option<f64> {
        self.entries.get(&position).map(|e| e.zscore)
    }
}

/// Directory catalog of Z-score files
///
/// The directory is listed once at startup; lookups match filenames by
/// chromosome token and population substring. Zero matches and multiple
/// matches are both errors, never a silent first pick.
#[derive(Debug, Clone)]
pub struct ZscoreCatalog {
    dir: PathBuf,
    files: Vec<String>,
}

impl ZscoreCatalog {
    /// List the directory once
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    files.push(name.to_string());
                }
            }
        }
        // Deterministic candidate listing independent of readdir order
        files.sort();
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    /// Resolve the single file covering a chromosome/population pair
    pub fn lookup(&self, chrom: &str, population: &str) -> std::result::Result<PathBuf, LookupFailure> {
        let candidates: Vec<&String> = self
            .files
            .iter()
            .filter(|name| matches_chromosome(name, chrom) && name.contains(population))
            .collect();

        match candidates.len() {
            0 => Err(LookupFailure::NoZscoreFile {
                chrom: chrom.to_string(),
                population: population.to_string(),
                dir: self.dir.clone(),
            }),
            1 => Ok(self.dir.join(candidates[0])),
            _ => Err(LookupFailure::AmbiguousZscoreFile {
                chrom: chrom.to_string(),
                population: population.to_string(),
                candidates: candidates.into_iter().cloned().collect(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Whether a filename carries the `chr<N>` token for this chromosome
///
/// The character after the token must not be a digit, so `chr1` does not
/// match `chr11`.
fn matches_chromosome(name: &str, chrom: &str) -> bool {
    let token = format!("chr{}", chrom);
    let bytes = name.as_bytes();
    let mut search_from = 0;
    while let Some(found) = name[search_from..].find(&token) {
        let start = search_from + found;
        let end = start + token.len();
        let boundary = match bytes.get(end) {
            Some(c) => !c.is_ascii_digit(),
            None => true,
        };
        if boundary {
            return true;
        }
        search_from = start + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zscore_file(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "snp\tpos\tref\talt\tzscore\trsquare").unwrap();
        for row in rows {
            writeln!(f, "{}", row).unwrap();
        }
        path
    }

    #[test]
    fn test_record_parse_raw() {
        let rec = ZscoreRecord::parse("rs1\t100\tA\tG\t1.2\t0.9", ScoreMode::Raw, 2).unwrap();
        assert_eq!(rec.position, 100);
        assert_eq!(rec.zscore, 1.2);
        assert_eq!(rec.rsquare, None);
    }

    #[test]
    fn test_record_parse_multiply() {
        let rec =
            ZscoreRecord::parse("rs1 100 A G 0.5 0.8", ScoreMode::MultiplyRsquare, 2).unwrap();
        assert_eq!(rec.rsquare, Some(0.8));
    }

    #[test]
    fn test_record_parse_too_few_columns() {
        let err = ZscoreRecord::parse("rs1\t100\tA\tG", ScoreMode::Raw, 5).unwrap_err();
        assert!(matches!(err, FormatError::TooFewColumns { line: 5, .. }));
    }

    #[test]
    fn test_record_parse_bad_position() {
        let err = ZscoreRecord::parse("rs1\tabc\tA\tG\t1.2\t0.9", ScoreMode::Raw, 3).unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidInteger {
                column: "position",
                ..
            }
        ));
    }

    #[test]
    fn test_index_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_zscore_file(
            tmp.path(),
            "chr4.EUR.zscores",
            &["rs1\t100\tA\tG\t1.2\t0.9", "rs2\t200\tC\tT\t2.1\t0.95"],
        );
        let index = ZscoreIndex::from_file(&path, ScoreMode::Raw).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.score(100), Some(1.2));
        assert_eq!(index.score(150), None);
    }

    #[test]
    fn test_index_duplicate_position_last_wins() {
        let tmp = TempDir::new().unwrap();
        let path = write_zscore_file(
            tmp.path(),
            "chr4.EUR.zscores",
            &["rs1\t100\tA\tG\t1.2\t0.9", "rs1b\t100\tA\tG\t3.5\t0.5"],
        );
        let index = ZscoreIndex::from_file(&path, ScoreMode::Raw).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.score(100), Some(3.5));
    }

    #[test]
    fn test_index_header_only() {
        let tmp = TempDir::new().unwrap();
        let path = write_zscore_file(tmp.path(), "chr4.EUR.zscores", &[]);
        let index = ZscoreIndex::from_file(&path, ScoreMode::Raw).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_index_empty_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty");
        std::fs::File::create(&path).unwrap();
        let err = ZscoreIndex::from_file(&path, ScoreMode::Raw).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Format(FormatError::MissingHeader(_))
        ));
    }

    #[test]
    fn test_score_modes() {
        let entry = ZscoreEntry {
            zscore: 0.5,
            rsquare: Some(0.8),
        };
        assert_eq!(entry.score(ScoreMode::Raw), 0.5);
        assert_eq!(entry.score(ScoreMode::MultiplyRsquare), 0.4);
    }

    #[test]
    fn test_chromosome_token_boundary() {
        assert!(matches_chromosome("chr1.EUR.zscores", "1"));
        assert!(!matches_chromosome("chr11.EUR.zscores", "1"));
        assert!(matches_chromosome("chr11.EUR.zscores", "11"));
        assert!(matches_chromosome("study.chr2.AFR.txt.gz", "2"));
        assert!(!matches_chromosome("chr22.EUR.zscores", "2"));
        assert!(matches_chromosome("chrX.EUR.zscores", "X"));
    }

    #[test]
    fn test_catalog_lookup_single() {
        let tmp = TempDir::new().unwrap();
        write_zscore_file(tmp.path(), "chr4.EUR.zscores", &[]);
        write_zscore_file(tmp.path(), "chr4.AFR.zscores", &[]);
        write_zscore_file(tmp.path(), "chr14.EUR.zscores", &[]);

        let catalog = ZscoreCatalog::scan(tmp.path()).unwrap();
        let path = catalog.lookup("4", "EUR").unwrap();
        assert!(path.ends_with("chr4.EUR.zscores"));
    }

    #[test]
    fn test_catalog_lookup_missing() {
        let tmp = TempDir::new().unwrap();
        write_zscore_file(tmp.path(), "chr4.EUR.zscores", &[]);
        let catalog = ZscoreCatalog::scan(tmp.path()).unwrap();
        let err = catalog.lookup("5", "EUR").unwrap_err();
        assert!(matches!(err, LookupFailure::NoZscoreFile { .. }));
    }

    #[test]
    fn test_catalog_lookup_ambiguous() {
        let tmp = TempDir::new().unwrap();
        write_zscore_file(tmp.path(), "chr4.EUR.zscores", &[]);
        write_zscore_file(tmp.path(), "chr4.EUR.imputed.zscores", &[]);
        let catalog = ZscoreCatalog::scan(tmp.path()).unwrap();
        let err = catalog.lookup("4", "EUR").unwrap_err();
        match err {
            LookupFailure::AmbiguousZscoreFile { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected ambiguity error, got {:?}", other),
        }
    }
}
