//! Replay of a MoDL search log.
//!
//! The MoDL search records each change it made to its working motif set
//! together with the description length reached afterwards. Replaying the
//! changes rebuilds the intermediate motif sets for the report.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::notation::format_g;
use crate::types::{AlphabetModel, WILDCARD};

/// One change to the working motif set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModlAction {
    /// Initial state, nothing changes
    Start,
    /// New motif allowing a single residue at one position
    AddMotif { position: usize, residue: char },
    AddResidue {
        motif: usize,
        position: usize,
        residue: char,
    },
    RemoveResidue {
        motif: usize,
        position: usize,
        residue: char,
    },
    RemoveMotif { motif: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModlStep {
    #[serde(flatten)]
    pub action: ModlAction,
    /// Description length after this step
    pub score: f64,
}

/// A motif as a set of allowed residues per position
#[derive(Debug, Clone, PartialEq)]
pub struct RegexMotif {
    allowed: Array2<bool>,
}

impl RegexMotif {
    fn new(width: usize, alphabet_len: usize) -> Self {
        Self {
            allowed: Array2::from_elem((width, alphabet_len), false),
        }
    }

    pub fn width(&self) -> usize {
        self.allowed.nrows()
    }

    fn is_wildcard(&self, position: usize) -> bool {
        let row = self.allowed.row(position);
        row.iter().all(|&a| a) || row.iter().all(|&a| !a)
    }

    /// Regular-expression form, e.g. `XR[ST]PX`
    pub fn pattern(&self, alphabet: &AlphabetModel) -> String {
        let mut out = String::with_capacity(self.width());
        for (position, row) in self.allowed.rows().into_iter().enumerate() {
            if self.is_wildcard(position) {
                out.push(WILDCARD);
                continue;
            }
            let residues: Vec<char> = row
                .iter()
                .zip(alphabet.symbols())
                .filter(|(&a, _)| a)
                .map(|(_, &c)| c)
                .collect();
            if residues.len() == 1 {
                out.push(residues[0]);
            } else {
                out.push('[');
                out.extend(residues);
                out.push(']');
            }
        }
        out
    }

    /// Probability that a background site matches this motif
    pub fn background_probability(&self, background: &Array2<f64>) -> f64 {
        (0..self.width())
            .filter(|&position| !self.is_wildcard(position))
            .map(|position| {
                self.allowed
                    .row(position)
                    .iter()
                    .zip(background.row(position))
                    .filter(|(&a, _)| a)
                    .map(|(_, &f)| f)
                    .sum::<f64>()
            })
            .product()
    }
}

/// Per-position residue frequencies of the background sequences.
///
/// Residues outside the alphabet are skipped; each count is divided by the
/// number of sequences.
pub fn background_matrix(
    sequences: &[String],
    alphabet: &AlphabetModel,
    width: usize,
) -> Array2<f64> {
    let mut freqs = Array2::<f64>::zeros((width, alphabet.len()));
    for sequence in sequences {
        for (position, residue) in sequence.chars().take(width).enumerate() {
            if let Some(index) = alphabet.index_of(residue) {
                freqs[[position, index]] += 1.0;
            }
        }
    }
    if !sequences.is_empty() {
        freqs /= sequences.len() as f64;
    }
    freqs
}

/// Working motif set rebuilt step by step
pub struct ModlReplay<'a> {
    alphabet: &'a AlphabetModel,
    background: Array2<f64>,
    max_motifs: usize,
    motifs: Vec<RegexMotif>,
}

impl<'a> ModlReplay<'a> {
    pub fn new(
        alphabet: &'a AlphabetModel,
        bg_sequences: &[String],
        width: usize,
        max_motifs: usize,
    ) -> Self {
        Self {
            alphabet,
            background: background_matrix(bg_sequences, alphabet, width),
            max_motifs,
            motifs: Vec::new(),
        }
    }

    pub fn motifs(&self) -> &[RegexMotif] {
        &self.motifs
    }

    pub fn background(&self) -> &Array2<f64> {
        &self.background
    }

    fn residue(&self, residue: char) -> Result<usize> {
        self.alphabet.index_of(residue).ok_or_else(|| {
            ReportError::invalid_input(format!("MoDL step uses unknown residue '{}'", residue))
        })
    }

    fn position(&self, position: usize) -> Result<usize> {
        if position < self.background.nrows() {
            Ok(position)
        } else {
            Err(ReportError::invalid_input(format!(
                "MoDL step position {} is outside the motif width {}",
                position,
                self.background.nrows()
            )))
        }
    }

    fn motif_mut(&mut self, motif: usize) -> Result<&mut RegexMotif> {
        let count = self.motifs.len();
        self.motifs.get_mut(motif).ok_or_else(|| {
            ReportError::invalid_input(format!(
                "MoDL step refers to motif {} of {}",
                motif, count
            ))
        })
    }

    /// Apply one step. New motifs beyond `max_motifs` are ignored.
    ///
    /// # Errors
    /// * `ReportError::InvalidInput` for an unknown residue, a position past the
    ///   motif width, or a motif index past the working set
    pub fn apply(&mut self, action: &ModlAction) -> Result<()> {
        match *action {
            ModlAction::Start => {}
            ModlAction::AddMotif { position, residue } => {
                let position = self.position(position)?;
                let index = self.residue(residue)?;
                if self.motifs.len() < self.max_motifs {
                    let mut motif = RegexMotif::new(self.background.nrows(), self.alphabet.len());
                    motif.allowed[[position, index]] = true;
                    self.motifs.push(motif);
                }
            }
            ModlAction::AddResidue {
                motif,
                position,
                residue,
            } => {
                let position = self.position(position)?;
                let index = self.residue(residue)?;
                self.motif_mut(motif)?.allowed[[position, index]] = true;
            }
            ModlAction::RemoveResidue {
                motif,
                position,
                residue,
            } => {
                let position = self.position(position)?;
                let index = self.residue(residue)?;
                self.motif_mut(motif)?.allowed[[position, index]] = false;
            }
            ModlAction::RemoveMotif { motif } => {
                self.motif_mut(motif)?;
                self.motifs.remove(motif);
            }
        }
        Ok(())
    }

    /// Pattern and background probability of a working motif
    pub fn describe(&self, motif: &RegexMotif) -> String {
        format!(
            "{} (background: {})",
            motif.pattern(self.alphabet),
            format_g(motif.background_probability(&self.background))
        )
    }
}
