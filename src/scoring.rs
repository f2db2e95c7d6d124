//! Motif significance: Fisher exact p-values corrected for the number of
//! candidate patterns the discovery algorithm tried.

use std::ops::Deref;

use crate::error::{ReportError, Result};
use crate::notation::Scientific;
use crate::stats::{log_fisher_exact, log_normalized_pvalue};
use crate::types::{Algorithm, Configuration, MotifRecord, Summary};

/// Enrichment statistics of one motif
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Significance {
    /// Estimated number of tests behind this motif
    pub n_tests: f64,
    pub log_pvalue: f64,
    /// `log_pvalue + ln(n_tests)`
    pub log_evalue: f64,
    pub fold_enrichment: f64,
}

impl Significance {
    pub fn log_n_tests(&self) -> f64 {
        self.n_tests.ln()
    }

    /// Chance that the best of `n_tests` tests is this good; diagnostics only
    pub fn log_normalized_pvalue(&self) -> f64 {
        log_normalized_pvalue(self.log_n_tests(), self.log_pvalue)
    }

    pub fn evalue(&self) -> Scientific {
        Scientific::from_ln(self.log_evalue, 1)
    }
}

/// `ntests: ... norm_p-value: ... E-value: ...` line printed for `print_pvalues`
pub fn diagnostic_line(sig: &Significance) -> String {
    format!(
        "ntests: {:.1} norm_p-value: {} E-value: {}",
        sig.n_tests,
        Scientific::from_ln(sig.log_normalized_pvalue(), 2),
        Scientific::from_ln(sig.log_evalue, 2),
    )
}

/// Size of the motif-x search space that produced a motif with `wildcards`
/// wildcard positions.
///
/// Every position that is neither the central residue nor a wildcard was
/// fixed by one successful test; one more position is counted for the round
/// of tests that failed and ended the search, unless no position is left.
/// Each fixed position was chosen among `alphabet_len` residues and the
/// positions still free at that step.
pub fn motifx_tests(wildcards: usize, width: usize, alphabet_len: usize) -> f64 {
    let w = width as i64;
    let mut fixed = w - 1 - wildcards as i64;
    if fixed < w - 1 {
        fixed += 1;
    }
    let n = alphabet_len as f64 * fixed as f64 * (w as f64 - (fixed + 1) as f64 / 2.0);
    n.trunc()
}

/// Fold enrichment of the foreground match rate over the background rate
pub fn fold_enrichment(fg_match: u64, fg_size: u64, bg_match: u64, bg_size: u64) -> f64 {
    (fg_match as f64 / fg_size as f64) / (bg_match as f64 / bg_size as f64)
}

/// Compute the significance of one motif.
///
/// Returns `None` for [`Algorithm::Simple`], which runs no statistical test.
///
/// # Errors
/// * `ReportError::InvalidMotif` if a MoDL motif carries no test count
pub fn score_motif(
    record: &MotifRecord,
    alphabet_len: usize,
    algorithm: &Algorithm,
) -> Result<Option<Significance>> {
    let motif = &record.motif;
    let stats = &record.stats;

    let n_tests = match algorithm {
        Algorithm::Simple => return Ok(None),
        Algorithm::MotifX { .. } => {
            motifx_tests(motif.wildcards(), motif.width(), alphabet_len)
        }
        Algorithm::Modl { .. } => stats.n_tests.ok_or_else(|| {
            ReportError::invalid_motif(&motif.id, "MoDL motif has no tracked test count")
        })?,
    };

    let log_pvalue = log_fisher_exact(stats.fg_match, stats.fg_size, stats.bg_match, stats.bg_size);

    Ok(Some(Significance {
        n_tests,
        log_pvalue,
        log_evalue: log_pvalue + n_tests.ln(),
        fold_enrichment: fold_enrichment(
            stats.fg_match,
            stats.fg_size,
            stats.bg_match,
            stats.bg_size,
        ),
    }))
}

/// A [`Summary`] whose motifs all carry their final significance.
///
/// Only [`score_all`] builds one, so both report writers read the same
/// E-values without recomputing them.
#[derive(Debug, Clone)]
pub struct ScoredSummary {
    summary: Summary,
    significance: Vec<Vec<Option<Significance>>>,
}

impl ScoredSummary {
    /// Significance of motif `motif` of entry `entry`
    pub fn significance(&self, entry: usize, motif: usize) -> Option<&Significance> {
        self.significance
            .get(entry)
            .and_then(|e| e.get(motif))
            .and_then(|s| s.as_ref())
    }

}

impl Deref for ScoredSummary {
    type Target = Summary;

    fn deref(&self) -> &Summary {
        &self.summary
    }
}

/// Score every motif of `summary` once, caching each log E-value on its motif.
///
/// Prints one diagnostic line per scored motif when
/// `config.print_pvalues` is set.
///
/// # Errors
/// * `ReportError::InvalidMotif` if a matrix does not match the configured width
///   and the alphabet, or a MoDL motif lacks its test count
pub fn score_all(mut summary: Summary, config: &Configuration) -> Result<ScoredSummary> {
    summary.validate(config.width)?;
    let alphabet_len = summary.alphabet.len();

    let mut significance = Vec::with_capacity(summary.entries.len());
    for entry in summary.entries.iter_mut() {
        let mut scores = Vec::with_capacity(entry.motifs.len());
        for record in entry.motifs.iter_mut() {
            let score = score_motif(record, alphabet_len, &config.algorithm)?;
            record.motif.log_evalue = score.map(|s| s.log_evalue);
            if let (Some(s), true) = (&score, config.print_pvalues) {
                println!("{}", diagnostic_line(s));
            }
            scores.push(score);
        }
        significance.push(scores);
    }

    Ok(ScoredSummary {
        summary,
        significance,
    })
}
