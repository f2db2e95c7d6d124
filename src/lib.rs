//! Significance scoring and MEME/HTML report rendering for post-translational modification motifs

pub mod error;
pub mod modl;
pub mod notation;
pub mod regress;
pub mod report;
pub mod scoring;
pub mod stats;
pub mod template;
pub mod types;

/// MEME suite release whose MoMo output format is reproduced
pub const VERSION: &str = "5.0.1";

/// Shown next to [`VERSION`] in the HTML report
pub const RELEASE_DATE: &str = concat!("momo-report ", env!("CARGO_PKG_VERSION"));

pub use error::{ReportError, Result};
pub use report::{write_results, LogoGenerator, NoLogos};
pub use scoring::{score_all, ScoredSummary, Significance};
pub use types::{
    Algorithm, AlphabetModel, Configuration, ModificationEntry, Motif, MotifRecord,
    MotifStatistics, Summary,
};
