//! LD matrix construction via PLINK
//!
//! Two invocations: VCF to the bed/bim/fam triple, then the triple to a
//! pairwise correlation matrix. Every path handed to PLINK is absolute,
//! so the process working directory never changes.

use crate::core::Result;
use crate::pipeline::shell::run_tool;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Convert a filtered locus VCF to PLINK binary format
///
/// Returns the bfile prefix (`<out_dir>/<locus>.<population>`), to
/// which PLINK has appended `.bed`, `.bim` and `.fam`.
pub fn vcf_to_plink(vcf: &Path, out_dir: &Path, locus: &str, population: &str) -> Result<PathBuf> {
    info!("Converting {:?} to PLINK format", vcf);
    let prefix = out_dir.join(format!("{}.{}", locus, population));

    run_tool(
        "plink",
        [
            "--vcf".as_ref(),
            vcf.as_os_str(),
            "--make-bed".as_ref(),
            "--out".as_ref(),
            prefix.as_os_str(),
        ],
    )?;

    remove_transient(&prefix);
    Ok(prefix)
}

/// Compute the LD matrix from the PLINK triple
///
/// The A2 allele is pinned from the filtered VCF (columns 4/3, '#'
/// comment marker) so correlation signs match the panel's reference
/// alleles. The resulting `.ld` file is renamed to
/// `<locus>.LD.<population>`.
pub fn plink_to_ld_matrix(
    vcf: &Path,
    out_dir: &Path,
    locus: &str,
    population: &str,
    remove_plink_files: bool,
) -> Result<PathBuf> {
    let prefix = out_dir.join(format!("{}.{}", locus, population));

    run_tool(
        "plink",
        [
            "--bfile".as_ref(),
            prefix.as_os_str(),
            "--matrix".as_ref(),
            "--out".as_ref(),
            prefix.as_os_str(),
            "--r".as_ref(),
            "--allow-no-sex".as_ref(),
            "--a2-allele".as_ref(),
            vcf.as_os_str(),
            "4".as_ref(),
            "3".as_ref(),
            "#".as_ref(),
        ],
    )?;

    let matrix = out_dir.join(format!("{}.LD.{}", locus, population));
    std::fs::rename(append_extension(&prefix, "ld"), &matrix)?;

    remove_transient(&prefix);
    if remove_plink_files {
        remove_plink_triple(&prefix);
    }

    Ok(matrix)
}

/// `<prefix>.<ext>` — PLINK appends to its `--out` prefix, it does not
/// replace the last extension
fn append_extension(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Remove PLINK's log and nosex droppings; missing files are fine
fn remove_transient(prefix: &Path) {
    for ext in ["log", "nosex"] {
        let path = append_extension(prefix, ext);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Could not remove transient PLINK file {:?}: {}", path, e);
            }
        }
    }
}

/// Remove the bed/bim/fam triple once the matrix exists
fn remove_plink_triple(prefix: &Path) {
    for ext in ["bed", "bim", "fam"] {
        let path = append_extension(prefix, ext);
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("Could not remove PLINK input file {:?}: {}", path, e);
        }
    }
}
