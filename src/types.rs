use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReportError, Result};

/// Character marking a "don't care" position in a motif identifier
pub const WILDCARD: char = 'X';

/// Ordered alphabet with a background frequency for each symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAlphabet")]
pub struct AlphabetModel {
    symbols: Vec<char>,
    background: Vec<f64>,
}

/// Unchecked form of [`AlphabetModel`] as read from input files
#[derive(Deserialize)]
struct RawAlphabet {
    symbols: Vec<char>,
    background: Vec<f64>,
}

impl TryFrom<RawAlphabet> for AlphabetModel {
    type Error = ReportError;

    fn try_from(raw: RawAlphabet) -> Result<Self> {
        AlphabetModel::new(raw.symbols, raw.background)
    }
}

impl AlphabetModel {
    /// Builds an alphabet from parallel symbol and frequency lists.
    ///
    /// # Errors
    /// * `ReportError::InvalidInput` if the lists differ in length or a symbol repeats
    pub fn new(symbols: Vec<char>, background: Vec<f64>) -> Result<Self> {
        if symbols.len() != background.len() {
            return Err(ReportError::invalid_input(format!(
                "alphabet has {} symbols but {} background frequencies",
                symbols.len(),
                background.len()
            )));
        }
        for (i, c) in symbols.iter().enumerate() {
            if symbols[..i].contains(c) {
                return Err(ReportError::invalid_input(format!(
                    "duplicate alphabet symbol '{}'",
                    c
                )));
            }
        }
        Ok(Self {
            symbols,
            background,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn background(&self) -> &[f64] {
        &self.background
    }

    /// Position of `symbol` in the alphabet, if present
    pub fn index_of(&self, symbol: char) -> Option<usize> {
        self.symbols.iter().position(|&c| c == symbol)
    }
}

/// Comparison applied by a PSM filter rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl FilterOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Le => "<=",
            FilterOp::Lt => "<",
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub field: String,
    pub op: FilterOp,
    pub threshold: f64,
}

/// Format of a peptide or protein input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileType {
    Psm {
        #[serde(default)]
        psm_type: Option<String>,
        #[serde(default = "default_sequence_column")]
        sequence_column: String,
    },
    Prealigned,
    Fasta,
}

fn default_sequence_column() -> String {
    "sequence".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinDatabase {
    pub filename: String,
    pub format: FileType,
}

/// Motif discovery algorithm, with the parameters only that algorithm uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Algorithm {
    Simple,
    MotifX {
        score_threshold: f64,
        /// Emulate the original motif-x binomial approximation
        #[serde(default)]
        harvard: bool,
    },
    Modl {
        max_motifs: usize,
        max_iterations: usize,
        max_no_decrease: usize,
    },
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Simple => "simple",
            Algorithm::MotifX { .. } => "motif-x",
            Algorithm::Modl { .. } => "MoDL",
        }
    }
}

/// Resolved run options; read-only for the whole report run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub algorithm: Algorithm,
    pub width: usize,
    #[serde(default)]
    pub filter: Option<FilterRule>,
    #[serde(default)]
    pub min_occurrences: usize,
    #[serde(default)]
    pub ptm_filenames: Vec<String>,
    pub filetype: FileType,
    #[serde(default)]
    pub protein_database: Option<ProteinDatabase>,
    pub output_dir: PathBuf,
    #[serde(default = "default_html_filename")]
    pub html_filename: String,
    #[serde(default = "default_text_filename")]
    pub text_filename: String,
    #[serde(default)]
    pub allow_clobber: bool,
    #[serde(default)]
    pub remove_unknowns: bool,
    /// Zero disables repeat elimination
    #[serde(default)]
    pub eliminate_repeat_width: usize,
    #[serde(default)]
    pub single_motif_per_mass: bool,
    #[serde(default)]
    pub hash_fasta: bool,
    #[serde(default)]
    pub hash_fasta_width: usize,
    #[serde(default)]
    pub print_pvalues: bool,
    #[serde(default)]
    pub command_line: String,
}

fn default_html_filename() -> String {
    "momo.html".to_string()
}

fn default_text_filename() -> String {
    "momo.txt".to_string()
}

impl Configuration {
    pub fn html_path(&self) -> PathBuf {
        self.output_dir.join(&self.html_filename)
    }

    pub fn text_path(&self) -> PathBuf {
        self.output_dir.join(&self.text_filename)
    }
}

/// A letter-probability matrix with the occurrences that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motif {
    pub id: String,
    /// Rows are motif positions, columns follow the alphabet order
    pub freqs: Array2<f64>,
    #[serde(default)]
    pub sequences: Vec<String>,
    #[serde(skip)]
    pub(crate) log_evalue: Option<f64>,
}

impl Motif {
    pub fn new(id: impl Into<String>, freqs: Array2<f64>, sequences: Vec<String>) -> Self {
        Self {
            id: id.into(),
            freqs,
            sequences,
            log_evalue: None,
        }
    }

    pub fn width(&self) -> usize {
        self.freqs.nrows()
    }

    /// Natural log of the E-value, once the motif has been scored
    pub fn log_evalue(&self) -> Option<f64> {
        self.log_evalue
    }

    /// Number of wildcard positions in the identifier
    pub fn wildcards(&self) -> usize {
        self.id.chars().filter(|&c| c == WILDCARD).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotifStatistics {
    pub fg_match: u64,
    pub fg_size: u64,
    pub bg_match: u64,
    pub bg_size: u64,
    #[serde(default)]
    pub score: f64,
    /// Number of tests tracked by the MoDL search
    #[serde(default)]
    pub n_tests: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifRecord {
    pub motif: Motif,
    pub stats: MotifStatistics,
}

/// Motifs found for one modification type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationEntry {
    pub key: String,
    pub motifs: Vec<MotifRecord>,
    #[serde(default)]
    pub bg_sequences: Vec<String>,
    #[serde(default)]
    pub modl_steps: Vec<crate::modl::ModlStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub alphabet: AlphabetModel,
    pub entries: Vec<ModificationEntry>,
    pub num_mod: u64,
    pub num_modtype: u64,
    pub num_mod_passing: u64,
    pub num_modtype_passing: u64,
}

impl Summary {
    /// Checks that every motif matrix is `width` by alphabet length.
    ///
    /// # Errors
    /// * `ReportError::InvalidMotif` naming the first offending motif
    pub fn validate(&self, width: usize) -> Result<()> {
        let alen = self.alphabet.len();
        for record in self.entries.iter().flat_map(|e| e.motifs.iter()) {
            let motif = &record.motif;
            if motif.freqs.dim() != (width, alen) {
                return Err(ReportError::invalid_motif(
                    &motif.id,
                    format!(
                        "matrix is {}x{}, expected {}x{}",
                        motif.freqs.nrows(),
                        motif.freqs.ncols(),
                        width,
                        alen
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn motifs(&self) -> impl Iterator<Item = &MotifRecord> {
        self.entries.iter().flat_map(|e| e.motifs.iter())
    }
}
