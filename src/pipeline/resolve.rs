//! SNP coordinate resolution
//!
//! Resolves an rsid to (chromosome, position) through the UCSC
//! genome-mysql service, queried with the `mysql` client against the
//! snp141 table of the requested build.

use crate::core::{LookupFailure, Result};
use crate::pipeline::shell::run_tool;
use crate::pipeline::snp::Snp;
use log::info;

const UCSC_HOST: &str = "genome-mysql.cse.ucsc.edu";
const UCSC_USER: &str = "genome";
const SNP_TABLE: &str = "snp141";

/// Client for the UCSC coordinate lookup service
#[derive(Debug, Clone)]
pub struct UcscResolver {
    build: String,
}

impl UcscResolver {
    pub fn new(build: &str) -> Self {
        Self {
            build: build.to_string(),
        }
    }

    /// Resolve an rsid to a `Snp` with normalized chromosome
    ///
    /// The service reports chromEnd, which equals the SNP position.
    pub fn resolve(&self, rsid: &str) -> Result<Snp> {
        let query = format!(
            "select chrom, chromEnd from {} where name='{}'",
            SNP_TABLE, rsid
        );
        let output = run_tool(
            "mysql",
            [
                format!("--user={}", UCSC_USER),
                format!("--host={}", UCSC_HOST),
                "-NA".to_string(),
                self.build.clone(),
                "-e".to_string(),
                query,
            ],
        )?;

        let reply = String::from_utf8_lossy(&output.stdout);
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(LookupFailure::SnpNotFound {
                rsid: rsid.to_string(),
                build: self.build.clone(),
            }
            .into());
        }

        // On duplicated rsids the service returns several rows; the
        // first one is authoritative for snp141.
        let first_row = reply.lines().next().unwrap_or(reply);
        let mut fields = first_row.split('\t');
        let chrom = fields.next();
        let position = fields.next().and_then(|p| p.parse::<u64>().ok());

        match (chrom, position) {
            (Some(chrom), Some(position)) => {
                let chrom = normalize_chromosome(chrom);
                info!("{}: {}:{}", rsid, chrom, position);
                Ok(Snp {
                    rsid: rsid.to_string(),
                    chrom,
                    position,
                    build: self.build.clone(),
                })
            }
            _ => Err(LookupFailure::MalformedReply {
                rsid: rsid.to_string(),
                reply: first_row.to_string(),
            }
            .into()),
        }
    }
}

/// Aliases for non-numeric chromosome names
const CHROM_ALIASES: &[(&str, &str)] = &[("M", "MT"), ("MT", "MT"), ("X", "X"), ("Y", "Y")];

/// Normalize a chromosome name to its plain form
///
/// Strips a case-insensitive "chr" prefix and maps aliases through a
/// lookup table; numeric chromosomes pass through unchanged.
pub fn normalize_chromosome(chrom: &str) -> String {
    let without_prefix = if chrom.len() > 3 && chrom[..3].eq_ignore_ascii_case("chr") {
        &chrom[3..]
    } else {
        chrom
    };

    let upper = without_prefix.to_uppercase();
    for (alias, canonical) in CHROM_ALIASES {
        if upper == *alias {
            return canonical.to_string();
        }
    }
    upper
}
